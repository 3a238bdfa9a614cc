#[cfg(test)]
pub mod flow_tests;

#[cfg(test)]
use std::sync::Once;

#[cfg(test)]
static INIT: Once = Once::new();

#[cfg(test)]
fn init() {
    // ignore error
    INIT.call_once(|| {
        use lnurlc_common::logger;

        logger::init("trace", None).expect("initializing logger for the first time");
    });
}
