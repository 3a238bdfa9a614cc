//! Node control interface.
//!
//! The node-control service is a remote collaborator over an
//! authenticated channel we do not own: all we ever ask of it is who
//! the current peers are, to dial a new one, and who we ourselves are.
//! Concrete backends live in their own crates.
use std::time::Duration;

use async_trait::async_trait;

use crate::error;
use crate::model::NodeAddress;

/// A currently connected peer, as reported by the node. Transient
/// view, never persisted.
#[derive(Clone, Debug)]
pub struct Peer {
    pub public_key: String,
}

#[async_trait]
pub trait NodeControl: Send + Sync {
    /// List the peers the node is connected to right now.
    ///
    /// A round trip; implementations must give up after `timeout` and
    /// surface the transport's message verbatim, retries are the
    /// caller's call.
    async fn list_peers(&self, timeout: Duration) -> error::Result<Vec<Peer>>;

    /// Dial a new peer. Returns once the connection is acked.
    async fn connect_peer(&self, addr: &NodeAddress, timeout: Duration) -> error::Result<()>;

    /// The node's own identity public key, hex encoded.
    async fn identity(&self, timeout: Duration) -> error::Result<String>;
}
