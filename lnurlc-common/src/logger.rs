//! Logging module.
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::SystemTime;

use chrono::prelude::*;
use colored::*;

pub use log::{Level, Log, Metadata, Record, SetLoggerError};

struct Logger {
    level: Level,
    file: Option<File>,
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let level = match record.level() {
            Level::Error => "ERROR".red().bold(),
            Level::Warn => "WARN".yellow(),
            Level::Info => "INFO".green(),
            Level::Debug => "DEBUG".dimmed(),
            Level::Trace => "TRACE".cyan().dimmed(),
        };
        let now: DateTime<Utc> = DateTime::from(SystemTime::now());
        let line = format!(
            "{} {} {} {}",
            now.to_rfc3339_opts(SecondsFormat::Millis, true).white(),
            level,
            record.target().bold(),
            record.args(),
        );

        match self.file {
            Some(ref file) => emit(line, file),
            None => emit(line, io::stdout()),
        }

        fn emit(line: String, mut stream: impl io::Write) {
            writeln!(stream, "{line}").expect("write shouldn't fail");
        }
    }

    fn flush(&self) {}
}

/// Initialize the global logger.
pub fn init(level: &str, file: Option<PathBuf>) -> anyhow::Result<()> {
    let file = if let Some(path) = file {
        Some(File::create(path)?)
    } else {
        None
    };
    let level = Level::from_str(level).map_err(|err| anyhow::anyhow!("{err}"))?;
    let logger = Logger { level, file };

    log::set_boxed_logger(Box::new(logger)).map_err(|err| anyhow::anyhow!("{err}"))?;
    log::set_max_level(level.to_level_filter());

    Ok(())
}
