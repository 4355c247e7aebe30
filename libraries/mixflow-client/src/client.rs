//! HTTP client for the extraction service.

use crate::error::ClientError;
use crate::types::{ClientConfig, ErrorBody, MixResponse, TrackResponse};
use async_trait::async_trait;
use mixflow_core::{Extractor, ExtractorError, Track, TrackId};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP implementation of the [`Extractor`] contract.
///
/// Thin and stateless: one `reqwest` client, one base URL, one API key.
/// Every method is a single request with no retry or backoff.
pub struct ExtractorClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl ExtractorClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        if config.url.is_empty() {
            return Err(ClientError::InvalidUrl("URL cannot be empty".into()));
        }

        let base_url = config.url.trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ClientError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }

        // Extraction can be slow upstream; the generous timeout matches the
        // service's own socket timeout plus headroom.
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("Mixflow/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            api_key: config.api_key,
        })
    }

    /// Get the service base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ExtractorError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Extraction service request");

        let response = self
            .http
            .get(&url)
            .query(query)
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    ExtractorError::Unreachable(e.to_string())
                } else {
                    ExtractorError::Extraction(e.to_string())
                }
            })?;

        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ExtractorError> {
        let status = response.status();

        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| ExtractorError::Extraction(format!("Failed to parse response: {e}")));
        }

        if status == StatusCode::NOT_FOUND {
            return Err(ExtractorError::NotFound);
        }

        // The service wraps failures in a structured body; fall back to the
        // raw text when it doesn't.
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.error)
            .unwrap_or(text);

        warn!(status = status.as_u16(), message = %message, "Extraction service error");
        Err(ExtractorError::Extraction(format!(
            "service returned {status}: {message}"
        )))
    }
}

#[async_trait]
impl Extractor for ExtractorClient {
    async fn search_by_query(&self, query: &str) -> Result<Track, ExtractorError> {
        let response: TrackResponse = self.get("/search/lucky", &[("q", query)]).await?;
        Ok(response.into_track(query))
    }

    async fn fetch_by_id(&self, id: &TrackId) -> Result<Track, ExtractorError> {
        let response: TrackResponse = self
            .get("/search/track", &[("video_id", id.as_str())])
            .await?;
        // An id-derived track refreshes through the id as well.
        Ok(response.into_track(id.as_str()))
    }

    async fn fetch_candidates(&self, id: &TrackId) -> Result<Vec<TrackId>, ExtractorError> {
        let response: MixResponse = self
            .get("/search/mix", &[("video_id", id.as_str())])
            .await?;

        debug!(
            context = %id,
            candidates = response.video_ids.len(),
            mix = %response.mix_id,
            "Fetched candidates"
        );

        Ok(response.video_ids.into_iter().map(TrackId::from).collect())
    }

    async fn refresh_by_query(&self, query: &str) -> Result<Track, ExtractorError> {
        // Refresh re-derives the track from its originating query; the
        // service caches aggressively enough that this is cheap.
        let response: TrackResponse = self.get("/search/lucky", &[("q", query)]).await?;
        Ok(response.into_track(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_validation() {
        assert!(ExtractorClient::new(ClientConfig::new("https://example.com", "k")).is_ok());
        assert!(ExtractorClient::new(ClientConfig::new("http://localhost:8000", "k")).is_ok());

        assert!(ExtractorClient::new(ClientConfig::new("", "k")).is_err());
        assert!(ExtractorClient::new(ClientConfig::new("not-a-url", "k")).is_err());
        assert!(ExtractorClient::new(ClientConfig::new("ftp://example.com", "k")).is_err());
    }

    #[test]
    fn url_normalization() {
        let client =
            ExtractorClient::new(ClientConfig::new("https://example.com/", "k")).expect("valid");
        assert_eq!(client.base_url(), "https://example.com");
    }
}
