use std::time::Duration;

use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use super::Translator;
use crate::errors::ProviderError;

/// Client for the public Google translate endpoint (`client=gtx`)
#[derive(Debug, Clone)]
pub struct GoogleTranslate {
    /// HTTP client for API requests
    client: Client,
    /// Endpoint URL, without query string
    endpoint: String,
    /// Source language code or `auto`
    source_language: String,
    /// Target language code
    target_language: String,
}

impl GoogleTranslate {
    /// Create a new client
    pub fn new(
        endpoint: impl Into<String>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let endpoint = endpoint.into();
        Url::parse(&endpoint)
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid endpoint '{}': {}", endpoint, e)))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            source_language: source_language.into(),
            target_language: target_language.into(),
        })
    }

    /// Build the request URL for `text`
    pub fn request_url(&self, text: &str) -> Result<Url, ProviderError> {
        Url::parse_with_params(
            &self.endpoint,
            &[
                ("client", "gtx"),
                ("sl", self.source_language.as_str()),
                ("tl", self.target_language.as_str()),
                ("dt", "t"),
                ("q", text),
            ],
        )
        .map_err(|e| ProviderError::RequestFailed(format!("Invalid endpoint '{}': {}", self.endpoint, e)))
    }

    /// Extract the translation from a response body.
    ///
    /// The body is a nested array whose first element lists translated
    /// segments; each segment's first element is its text.
    pub fn extract_translation(body: &Value) -> Result<String, ProviderError> {
        let segments = body
            .get(0)
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::ParseError("missing segment list".to_string()))?;

        segments
            .iter()
            .map(|segment| match segment.as_array().map(|parts| parts.first()) {
                Some(Some(Value::String(text))) => Ok(text.as_str()),
                // Segments carrying no text (e.g. transliteration rows) add nothing
                Some(None | Some(Value::Null)) => Ok(""),
                _ => Err(ProviderError::ParseError("segment without text".to_string())),
            })
            .collect()
    }
}

#[async_trait]
impl Translator for GoogleTranslate {
    async fn translate(&self, text: &str) -> Result<String, ProviderError> {
        let url = self.request_url(text)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Translate API error ({}): {}", status, message);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        Self::extract_translation(&body)
    }

    fn name(&self) -> &str {
        "google"
    }
}
