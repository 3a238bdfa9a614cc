//! Client configuration.
use std::path::PathBuf;
use std::time::Duration;

/// Base timeout for the node-control round trips, in seconds.
const PEER_TIMEOUT: u64 = 10;
/// Base timeout for the final channel-open callback, in seconds.
///
/// This one is long on purpose: while we wait the service is doing the
/// actual channel-opening work, it is not a liveness check.
const CALLBACK_TIMEOUT: u64 = 30;

#[derive(Clone, Debug)]
pub struct LnurlcConf {
    /// REST endpoint of the node-control service.
    pub node_url: String,
    /// Hex encoded macaroon presented to the node-control service.
    pub macaroon: Option<String>,
    /// Base timeout for peer listing and peer connection.
    pub peer_timeout_base: Duration,
    /// Base timeout for the final channel-open callback.
    pub callback_timeout_base: Duration,
    /// Multiplier applied to every network timeout. Anonymizing
    /// transports need the extra room, keep it at 1 on clearnet.
    pub latency_multiplier: u32,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl LnurlcConf {
    pub fn new(node_url: &str) -> Self {
        Self {
            node_url: node_url.to_owned(),
            ..Default::default()
        }
    }

    /// Scaled timeout for `list_peers` and `connect_peer`.
    pub fn peer_timeout(&self) -> Duration {
        self.peer_timeout_base * self.latency_multiplier
    }

    /// Scaled timeout for the final callback. Kept separate from the
    /// peer timeout base so the long value stays configurable.
    pub fn callback_timeout(&self) -> Duration {
        self.callback_timeout_base * self.latency_multiplier
    }
}

impl Default for LnurlcConf {
    fn default() -> Self {
        Self {
            node_url: "https://127.0.0.1:8080".to_owned(),
            macaroon: None,
            peer_timeout_base: Duration::from_secs(PEER_TIMEOUT),
            callback_timeout_base: Duration::from_secs(CALLBACK_TIMEOUT),
            latency_multiplier: 1,
            log_level: "info".to_owned(),
            log_file: None,
        }
    }
}
