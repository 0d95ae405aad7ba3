//! # YouTube Collaborators
//!
//! YouTube Data API v3 implementations of the harvest collaborator traits.
//!
//! Discovery lists the most-popular videos chart; the snippet fetcher pulls
//! top-level comment threads in plain text. Responses are parsed leniently:
//! items missing the expected fields are dropped rather than failing the
//! whole call, since the API omits fields for disabled comments.

use crate::harvester::{Discovery, HarvestError, SnippetFetcher};
use quip_core::VideoId;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Production API base.
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Most results the API returns per list call.
const API_PAGE_LIMIT: u64 = 100;

/// Most videos the chart endpoint returns per call.
const CHART_PAGE_LIMIT: usize = 50;

// =============================================================================
// CLIENT
// =============================================================================

/// HTTP client for the YouTube Data API.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl YouTubeClient {
    /// Create a client with the given API key and per-request timeout.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, HarvestError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HarvestError::Config(format!("Cannot build HTTP client: {e}")))?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: DEFAULT_API_BASE.to_owned(),
        })
    }

    /// Point the client at a different API base (local test servers).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
        operation: &'static str,
    ) -> Result<Value, HarvestError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| HarvestError::Discovery(format!("{operation} request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HarvestError::Discovery(format!(
                "{operation} returned HTTP {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| HarvestError::Discovery(format!("{operation} returned invalid JSON: {e}")))
    }
}

// =============================================================================
// RESPONSE PARSING
// =============================================================================

/// Extract video identifiers from a `videos.list` response.
fn parse_video_ids(body: &Value) -> Vec<VideoId> {
    body.get("items")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("id").and_then(Value::as_str))
                .map(VideoId::new)
                .collect()
        })
        .unwrap_or_default()
}

/// Extract comment texts from a `commentThreads.list` response.
fn parse_snippets(body: &Value) -> Vec<String> {
    body.get("items")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    item.pointer("/snippet/topLevelComment/snippet/textDisplay")
                        .and_then(Value::as_str)
                })
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

// =============================================================================
// COLLABORATOR IMPLEMENTATIONS
// =============================================================================

impl Discovery for YouTubeClient {
    async fn list_trending(&self) -> Result<Vec<VideoId>, HarvestError> {
        let body = self
            .get_json(
                "videos",
                &[
                    ("part", "id".to_owned()),
                    ("chart", "mostPopular".to_owned()),
                    ("maxResults", CHART_PAGE_LIMIT.to_string()),
                ],
                "videos.list",
            )
            .await?;

        let ids = parse_video_ids(&body);
        debug!(candidates = ids.len(), "Discovered chart videos");
        Ok(ids)
    }
}

impl SnippetFetcher for YouTubeClient {
    async fn fetch_snippets(
        &self,
        video: &VideoId,
        max_snippets: u64,
    ) -> Result<Vec<String>, HarvestError> {
        let page = max_snippets.min(API_PAGE_LIMIT);
        let body = self
            .get_json(
                "commentThreads",
                &[
                    ("part", "snippet".to_owned()),
                    ("videoId", video.as_str().to_owned()),
                    ("textFormat", "plainText".to_owned()),
                    ("maxResults", page.to_string()),
                ],
                "commentThreads.list",
            )
            .await
            .map_err(|e| HarvestError::Fetch {
                video: video.clone(),
                reason: e.to_string(),
            })?;

        let snippets = parse_snippets(&body);
        debug!(video = %video, snippets = snippets.len(), "Fetched comment threads");
        Ok(snippets)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn video_ids_parse_from_chart_response() {
        let body = json!({
            "items": [
                {"id": "abc123"},
                {"id": "def456"},
                {"kind": "youtube#video"}
            ]
        });

        let ids = parse_video_ids(&body);
        assert_eq!(ids, vec![VideoId::new("abc123"), VideoId::new("def456")]);
    }

    #[test]
    fn snippets_parse_from_comment_threads_response() {
        let body = json!({
            "items": [
                {"snippet": {"topLevelComment": {"snippet": {"textDisplay": "great video"}}}},
                {"snippet": {"topLevelComment": {}}},
                {"snippet": {"topLevelComment": {"snippet": {"textDisplay": "so true"}}}}
            ]
        });

        let snippets = parse_snippets(&body);
        assert_eq!(snippets, vec!["great video", "so true"]);
    }

    #[test]
    fn missing_items_array_yields_empty() {
        let body = json!({"kind": "youtube#videoListResponse"});

        assert!(parse_video_ids(&body).is_empty());
        assert!(parse_snippets(&body).is_empty());
    }
}
