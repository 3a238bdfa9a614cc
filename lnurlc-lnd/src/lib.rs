//! lnd REST adapter for the node-control interface.
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use lnurlc_common::error;
use lnurlc_common::json;
use lnurlc_common::model::NodeAddress;
use lnurlc_common::node::{NodeControl, Peer};

/// Hex macaroon header lnd expects on every REST call.
const MACAROON_HEADER: &str = "Grpc-Metadata-macaroon";

pub struct LndRest {
    url: String,
    macaroon: Option<String>,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct LndPeer {
    pub_key: String,
}

#[derive(Deserialize)]
struct ListPeersResponse {
    #[serde(default)]
    peers: Vec<LndPeer>,
}

#[derive(Serialize)]
struct LightningAddress {
    pubkey: String,
    host: String,
}

#[derive(Serialize)]
struct ConnectPeerRequest {
    addr: LightningAddress,
    perm: bool,
    // lnd encodes int64 as a JSON string
    timeout: String,
}

#[derive(Deserialize)]
struct GetInfoResponse {
    identity_pubkey: String,
}

#[derive(Deserialize)]
struct LndError {
    message: String,
}

impl LndRest {
    pub fn new(url: &str, macaroon: Option<String>) -> error::Result<Self> {
        // lnd serves REST behind its own self-signed certificate
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .build()?;
        Ok(Self {
            url: url.trim_end_matches('/').to_owned(),
            macaroon,
            client,
        })
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.macaroon {
            Some(macaroon) => builder.header(MACAROON_HEADER, macaroon),
            None => builder,
        }
    }

    /// Surface lnd's own error message verbatim so the caller can
    /// classify it.
    async fn check(response: reqwest::Response) -> error::Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        match json::from_str::<LndError>(&body) {
            Ok(err) => error::bail!("{}", err.message),
            Err(_) => error::bail!("node control request failed with status {status}"),
        }
    }
}

async fn with_timeout<F, T>(what: &str, timeout: Duration, fut: F) -> error::Result<T>
where
    F: Future<Output = error::Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => error::bail!("{what} timed out after {}s", timeout.as_secs()),
    }
}

#[async_trait]
impl NodeControl for LndRest {
    async fn list_peers(&self, timeout: Duration) -> error::Result<Vec<Peer>> {
        let url = format!("{}/v1/peers", self.url);
        with_timeout("peer listing", timeout, async {
            let response = self.request(self.client.get(&url)).send().await?;
            let response = Self::check(response).await?;
            let peers: ListPeersResponse = response.json().await?;
            Ok(peers
                .peers
                .into_iter()
                .map(|peer| Peer {
                    public_key: peer.pub_key,
                })
                .collect())
        })
        .await
    }

    async fn connect_peer(&self, addr: &NodeAddress, timeout: Duration) -> error::Result<()> {
        let Some(host) = addr.addr() else {
            error::bail!("node uri `{addr}` carries no host to dial");
        };
        log::debug!(target: "lnurlc-lnd", "connecting to `{}@{host}`", addr.public_key);
        let url = format!("{}/v1/peers", self.url);
        let request = ConnectPeerRequest {
            addr: LightningAddress {
                pubkey: addr.public_key.clone(),
                host,
            },
            perm: false,
            timeout: timeout.as_secs().to_string(),
        };
        with_timeout("peer connection", timeout, async {
            let response = self
                .request(self.client.post(&url))
                .json(&request)
                .send()
                .await?;
            let _ = Self::check(response).await?;
            Ok(())
        })
        .await
    }

    async fn identity(&self, timeout: Duration) -> error::Result<String> {
        let url = format!("{}/v1/getinfo", self.url);
        with_timeout("getinfo", timeout, async {
            let response = self.request(self.client.get(&url)).send().await?;
            let response = Self::check(response).await?;
            let info: GetInfoResponse = response.json().await?;
            Ok(info.identity_pubkey)
        })
        .await
    }
}
