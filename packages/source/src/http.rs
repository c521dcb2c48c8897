//! Single-shot HTTP helpers shared by the adapters.
//!
//! Upstream calls are made exactly once: a failed call is reported to the
//! caller, which decides whether to fail over, degrade or abort. Use
//! [`send_json`] instead of calling `reqwest::RequestBuilder::send()`
//! directly so status handling and parse-failure logging stay uniform.

use serde::de::DeserializeOwned;

use crate::SourceError;

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 500;

/// Sends `request` and decodes the response body as JSON into `T`.
///
/// Any non-2xx status is returned as [`SourceError::Status`] without
/// reading the body.
///
/// # Errors
///
/// Returns [`SourceError`] if the request fails, the status is not a
/// success, or the body does not decode as `T`.
pub async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, SourceError> {
    let response = request.send().await?;

    let url = response.url().to_string();
    let status = response.status();

    if !status.is_success() {
        return Err(SourceError::Status {
            url,
            status: status.as_u16(),
        });
    }

    let text = response.text().await?;

    serde_json::from_str(&text).map_err(|e| {
        log::debug!(
            "JSON decode failed.\n  \
             url: {url}\n  \
             status: {status}\n  \
             received: {} bytes\n  \
             parse error: {e}\n  \
             body preview: {}",
            text.len(),
            preview(&text),
        );
        SourceError::Json(e)
    })
}

/// Truncates `text` to [`BODY_PREVIEW_LEN`] bytes on a char boundary.
fn preview(text: &str) -> String {
    if text.len() <= BODY_PREVIEW_LEN {
        return text.to_string();
    }
    let mut end = BODY_PREVIEW_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_keeps_short_bodies() {
        assert_eq!(preview("{}"), "{}");
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        let body = "é".repeat(BODY_PREVIEW_LEN);
        let out = preview(&body);
        assert!(out.ends_with("..."));
        assert!(out.len() <= BODY_PREVIEW_LEN + 3);
    }
}
