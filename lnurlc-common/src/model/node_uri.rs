//! Remote node address model.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error;

/// A remote node address in the conventional `pubkey@host:port` shape.
///
/// The public key is the node's identity, host and port are dial
/// hints: a record without them still names a node, so only a missing
/// or empty public key fails parsing.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeAddress {
    pub public_key: String,
    pub host: Option<String>,
    pub port: Option<u64>,
}

impl NodeAddress {
    /// `host:port` when the uri carried one.
    pub fn addr(&self) -> Option<String> {
        let host = self.host.clone()?;
        match self.port {
            Some(port) => Some(format!("{host}:{port}")),
            None => Some(host),
        }
    }
}

impl FromStr for NodeAddress {
    type Err = error::Error;

    fn from_str(uri: &str) -> Result<Self, Self::Err> {
        let uri = uri.trim();
        // tolerate `lightning:` and `scheme://` style prefixes
        let uri = match uri.split_once("://") {
            Some((_, rest)) => rest,
            None => uri.strip_prefix("lightning:").unwrap_or(uri),
        };

        let Some((public_key, addr)) = uri.split_once('@') else {
            error::bail!("invalid node uri `{uri}`: missing public key");
        };
        if public_key.is_empty() {
            error::bail!("invalid node uri `{uri}`: empty public key");
        }
        hex::decode(public_key)
            .map_err(|_| error::anyhow!("invalid node uri `{uri}`: public key is not hex"))?;

        let (host, port) = match addr.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() => match port.parse::<u64>() {
                Ok(port) => (Some(host.to_owned()), Some(port)),
                Err(_) => (Some(addr.to_owned()), None),
            },
            _ => ((!addr.is_empty()).then(|| addr.to_owned()), None),
        };

        Ok(Self {
            public_key: public_key.to_owned(),
            host,
            port,
        })
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.addr() {
            Some(addr) => write!(f, "{}@{}", self.public_key, addr),
            None => write!(f, "{}", self.public_key),
        }
    }
}
