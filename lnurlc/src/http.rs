//! HTTP implementation of the callback transport.
use std::time::Duration;

use async_trait::async_trait;

use lnurlc_common::callback::CallbackClient;
use lnurlc_common::error;

/// Plain `reqwest` GET client.
///
/// `reqwest` never retries a request on its own, which is exactly the
/// policy the final channel-open request needs: one transmission,
/// however long it takes within the caller's timeout.
pub struct HttpCallback {
    client: reqwest::Client,
}

impl HttpCallback {
    pub fn new() -> error::Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CallbackClient for HttpCallback {
    async fn get(
        &self,
        url: &str,
        params: &[(String, String)],
        timeout: Duration,
    ) -> error::Result<String> {
        let response = self
            .client
            .get(url)
            .query(params)
            .timeout(timeout)
            .send()
            .await?;
        let body = response.text().await?;
        log::trace!(target: "lnurlc", "callback response: {body}");
        Ok(body)
    }
}
