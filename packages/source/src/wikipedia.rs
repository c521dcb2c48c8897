//! Wikipedia page summary client.
//!
//! See <https://en.wikipedia.org/api/rest_v1/#/Page%20content/get_page_summary__title_>

use async_trait::async_trait;
use city_dashboard_models::WikiSummary;

use crate::{SourceError, http};

/// Fetches encyclopedia summaries.
#[async_trait]
pub trait EncyclopediaProvider: Send + Sync {
    /// Summary of the page titled `title`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the page does not exist or the request
    /// fails.
    async fn summary(&self, title: &str) -> Result<WikiSummary, SourceError>;
}

/// [`EncyclopediaProvider`] backed by the Wikipedia REST API.
#[derive(Debug, Clone)]
pub struct WikipediaClient {
    client: reqwest::Client,
    base_url: String,
}

impl WikipediaClient {
    /// Creates a client for the REST root at `base_url` (e.g.
    /// `"https://en.wikipedia.org/api/rest_v1"`).
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait]
impl EncyclopediaProvider for WikipediaClient {
    async fn summary(&self, title: &str) -> Result<WikiSummary, SourceError> {
        let url = summary_url(&self.base_url, title)?;
        http::send_json(self.client.get(url)).await
    }
}

/// Builds the summary URL, percent-encoding the title as one path
/// segment.
fn summary_url(base_url: &str, title: &str) -> Result<reqwest::Url, SourceError> {
    let mut url = reqwest::Url::parse(base_url).map_err(|e| SourceError::Config {
        message: format!("invalid Wikipedia base URL {base_url:?}: {e}"),
    })?;

    let title = title.trim().replace(' ', "_");
    url.path_segments_mut()
        .map_err(|()| SourceError::Config {
            message: format!("Wikipedia base URL {base_url:?} cannot have a path"),
        })?
        .pop_if_empty()
        .extend(["page", "summary", title.as_str()]);

    Ok(url)
}
