//! LNURL-channel wire models.

pub mod request {
    use serde::{Deserialize, Serialize};

    /// The channel request record handed over by the LNURL decoding
    /// step: the service names the node to peer with, the callback to
    /// confirm on, and the one-time `k1` token to echo back.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ChannelRequest {
        #[serde(default)]
        pub tag: Option<String>,
        pub callback: String,
        pub k1: String,
        pub uri: String,
    }

    /// The final open request sent back to the service. `private` is
    /// always false, the flow never asks for unannounced channels.
    #[derive(Clone, Debug)]
    pub struct OpenRequest {
        pub callback: String,
        pub k1: String,
        pub remote_id: String,
        pub private: bool,
    }

    impl OpenRequest {
        pub fn new(request: &ChannelRequest, remote_id: &str) -> Self {
            Self {
                callback: request.callback.clone(),
                k1: request.k1.clone(),
                remote_id: remote_id.to_owned(),
                private: false,
            }
        }

        /// Query pairs in the exact shape third-party services expect.
        /// The parameter names and `private=0` are protocol, not ours
        /// to rename.
        pub fn query(&self) -> Vec<(String, String)> {
            vec![
                ("k1".to_owned(), self.k1.clone()),
                ("remoteid".to_owned(), self.remote_id.clone()),
                (
                    "private".to_owned(),
                    if self.private { "1" } else { "0" }.to_owned(),
                ),
            ]
        }
    }
}

pub mod response {
    use serde::{Deserialize, Serialize};

    /// The status/reason pair every LNURL service answers with.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ServiceResponse {
        pub status: String,
        #[serde(default)]
        pub reason: Option<String>,
    }

    impl ServiceResponse {
        pub fn is_ok(&self) -> bool {
            self.status == "OK"
        }

        pub fn reason(&self) -> String {
            self.reason
                .clone()
                .unwrap_or_else(|| "unknown reason".to_owned())
        }
    }
}
