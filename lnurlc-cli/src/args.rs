use clap::Parser;

use lnurlc_common::conf::LnurlcConf;
use lnurlc_common::error;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "lnurlc-cli",
    about = "Open a channel from a decoded LNURL-channel request",
    version = env!("CARGO_PKG_VERSION"),
    long_about = None
)]
pub struct LnurlcCliArgs {
    /// The decoded channel request, as JSON with `callback`, `k1` and `uri`
    pub request: String,

    /// REST endpoint of the lnd node
    #[arg(long = "node-url")]
    pub node_url: String,

    /// Hex encoded admin macaroon for the node
    #[arg(long = "macaroon")]
    pub macaroon: Option<String>,

    /// Scale every network timeout, e.g. 3 when the node is reached over tor
    #[arg(long = "latency-multiplier")]
    pub latency_multiplier: Option<u32>,

    /// Set the log level, by default is `info`
    #[arg(long = "log-level")]
    pub log_level: Option<String>,

    /// Redirect the logs on the file
    #[arg(long = "log-file")]
    pub log_file: Option<String>,
}

impl TryInto<LnurlcConf> for LnurlcCliArgs {
    type Error = error::Error;

    fn try_into(self) -> Result<LnurlcConf, Self::Error> {
        let mut conf = LnurlcConf::new(&self.node_url);
        conf.macaroon = self.macaroon;
        if let Some(multiplier) = self.latency_multiplier {
            if multiplier == 0 {
                error::bail!("latency multiplier must be at least 1");
            }
            conf.latency_multiplier = multiplier;
        }
        if let Some(level) = self.log_level {
            conf.log_level = level;
        }
        conf.log_file = self.log_file.map(Into::into);
        Ok(conf)
    }
}
