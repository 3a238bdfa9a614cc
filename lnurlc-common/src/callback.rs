//! Callback transport interface.
use std::time::Duration;

use async_trait::async_trait;

use crate::error;

/// A GET-style callback to an LNURL service.
///
/// Implementations must transmit exactly once per call: the service
/// treats a resend as a brand new channel request, so any transport
/// level retry has to stay disabled. Whoever calls this owns the
/// retry policy.
#[async_trait]
pub trait CallbackClient: Send + Sync {
    /// Issue a single GET with `params` url-encoded onto `url` and
    /// return the raw response body.
    async fn get(
        &self,
        url: &str,
        params: &[(String, String)],
        timeout: Duration,
    ) -> error::Result<String>;
}
