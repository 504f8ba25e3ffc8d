//! Best-effort YouTube metadata lookup.
//!
//! Given an extracted platform video identifier, asks the YouTube Data API
//! for the video title. Everything about this call is best-effort: a
//! missing API key, a failed request, a non-success status or an empty
//! result all yield `None` and are only logged, never surfaced to the user
//! as an error.

use std::time::Duration;

use repflow_domain::{RepFlowError, Result};
use serde::Deserialize;
use tracing::{debug, warn};

const YOUTUBE_API_URL: &str = "https://www.googleapis.com/youtube/v3/videos";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the YouTube client.
#[derive(Debug, Clone)]
pub struct YouTubeClientConfig {
    /// Base URL of the videos endpoint (overridable for tests).
    pub base_url: String,
    /// API key; `None` disables lookups entirely.
    pub api_key: Option<String>,
    /// Timeout for lookup requests.
    pub timeout: Duration,
}

impl Default for YouTubeClientConfig {
    fn default() -> Self {
        Self { base_url: YOUTUBE_API_URL.to_string(), api_key: None, timeout: DEFAULT_TIMEOUT }
    }
}

/// HTTP client for video metadata lookups.
pub struct YouTubeClient {
    http: reqwest::Client,
    config: YouTubeClientConfig,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    snippet: VideoSnippet,
}

#[derive(Debug, Deserialize)]
struct VideoSnippet {
    title: String,
}

impl YouTubeClient {
    /// Create a client with the default endpoint and the given key.
    ///
    /// # Errors
    ///
    /// Returns `RepFlowError::Network` if the HTTP client cannot be built.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_config(YouTubeClientConfig { api_key, ..YouTubeClientConfig::default() })
    }

    /// Create a client with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns `RepFlowError::Network` if the HTTP client cannot be built.
    pub fn with_config(config: YouTubeClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RepFlowError::Network(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    /// Fetch the title for a video identifier.
    ///
    /// Best effort: any failure yields `None`.
    pub async fn fetch_title(&self, video_id: &str) -> Option<String> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            debug!("No YouTube API key configured, skipping title lookup");
            return None;
        };

        let url =
            format!("{}?part=snippet&id={video_id}&key={api_key}", self.config.base_url);

        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(video_id, error = %err, "YouTube title lookup failed");
                return None;
            }
        };

        if !response.status().is_success() {
            debug!(video_id, status = %response.status(), "YouTube title lookup rejected");
            return None;
        }

        let body: VideoListResponse = match response.json().await {
            Ok(body) => body,
            Err(err) => {
                warn!(video_id, error = %err, "Failed to decode YouTube response");
                return None;
            }
        };

        body.items.into_iter().next().map(|item| item.snippet.title)
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer, api_key: Option<&str>) -> YouTubeClient {
        YouTubeClient::with_config(YouTubeClientConfig {
            base_url: format!("{}/videos", server.uri()),
            api_key: api_key.map(std::string::ToString::to_string),
            timeout: Duration::from_secs(2),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn fetches_title_from_snippet() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .and(query_param("id", "dQw4w9WgXcQ"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{ "snippet": { "title": "Leg Day Basics" } }]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("test-key"));
        let title = client.fetch_title("dQw4w9WgXcQ").await;
        assert_eq!(title.as_deref(), Some("Leg Day Basics"));
    }

    #[tokio::test]
    async fn missing_api_key_skips_the_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

        let client = client_for(&server, None);
        assert_eq!(client.fetch_title("dQw4w9WgXcQ").await, None);
    }

    #[tokio::test]
    async fn non_success_status_yields_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("test-key"));
        assert_eq!(client.fetch_title("dQw4w9WgXcQ").await, None);
    }

    #[tokio::test]
    async fn empty_item_list_yields_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": []
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("test-key"));
        assert_eq!(client.fetch_title("dQw4w9WgXcQ").await, None);
    }

    #[tokio::test]
    async fn malformed_body_yields_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("test-key"));
        assert_eq!(client.fetch_title("dQw4w9WgXcQ").await, None);
    }
}
