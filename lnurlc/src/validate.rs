//! Validation of the service's final response.
use lnurlc_common::error;
use lnurlc_common::json;
use lnurlc_common::model::response::ServiceResponse;

/// Decode the callback body into a status/reason pair.
///
/// Pure decode: a body that is not JSON or carries no `status` at all
/// is rejected here, what the status means is up to the caller.
pub fn validate(body: &str) -> error::Result<ServiceResponse> {
    let response: ServiceResponse =
        json::from_str(body).map_err(|err| error::anyhow!("malformed service response: {err}"))?;
    Ok(response)
}
