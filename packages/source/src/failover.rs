//! Multi-endpoint failover.
//!
//! Some upstreams are published on several equivalent mirrors. A
//! failover fetch tries each mirror once, in list order, and returns the
//! first success. Failed attempts are logged and never retried; there is
//! no delay between mirrors, so the worst-case latency is the sum of the
//! per-request timeouts and callers should bound it with an overall
//! deadline.
//!
//! # Usage
//!
//! ```ignore
//! use crate::failover;
//!
//! let body: serde_json::Value = failover::fetch_with_failover(&mirrors, |url| {
//!     http::send_json(client.post(url).form(&[("data", query)]))
//! })
//! .await?;
//! ```

use std::future::Future;

use crate::SourceError;

/// Runs `attempt` against each endpoint in order until one succeeds.
///
/// The `attempt` closure is called once per endpoint with that endpoint's
/// URL and must build a fresh request each time.
///
/// # Errors
///
/// Returns [`SourceError::NoEndpoints`] if `endpoints` is empty and
/// [`SourceError::AllEndpointsFailed`] if every attempt failed.
pub async fn fetch_with_failover<T, F, Fut>(
    endpoints: &[String],
    mut attempt: F,
) -> Result<T, SourceError>
where
    F: FnMut(&str) -> Fut,
    Fut: Future<Output = Result<T, SourceError>>,
{
    if endpoints.is_empty() {
        return Err(SourceError::NoEndpoints);
    }

    let total = endpoints.len();
    let mut attempts = Vec::with_capacity(total);

    for (i, endpoint) in endpoints.iter().enumerate() {
        match attempt(endpoint).await {
            Ok(value) => {
                if i > 0 {
                    log::info!("Endpoint {}/{total} succeeded: {endpoint}", i + 1);
                }
                return Ok(value);
            }
            Err(e) => {
                log::warn!("Endpoint {}/{total} failed: {endpoint}: {e}", i + 1);
                attempts.push(format!("{endpoint}: {e}"));
            }
        }
    }

    Err(SourceError::AllEndpointsFailed { attempts })
}
