//! HTTP client for the Gemini `generateContent` endpoint.

use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::instrument;

use crate::config::GeminiConfig;
use crate::credentials::Credential;
use crate::services::{CompletionBackend, CompletionRequest};

use super::error::{ApiErrorResponse, GeminiError};
use super::types::{GenerateContentRequest, GenerateContentResponse};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini API client.
///
/// The key is supplied per request so the same client serves every slot in
/// the credential pool.
#[derive(Clone)]
pub struct GeminiClient {
    inner: Arc<GeminiClientInner>,
}

struct GeminiClientInner {
    client: reqwest::Client,
    api_url: String,
}

impl GeminiClient {
    /// Create a new Gemini client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &GeminiConfig) -> Result<Self, GeminiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(GeminiClientInner {
                client,
                api_url: config.api_url.clone(),
            }),
        })
    }

    /// Endpoint URL for `model`.
    #[must_use]
    pub fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{model}:generateContent",
            self.inner.api_url
        )
    }

    /// Generate text for one prompt with the given credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the API answers with an error
    /// status, or the response carries no text.
    #[instrument(skip(self, credential, request), fields(model = %request.model, slot = credential.slot()))]
    pub async fn generate(
        &self,
        credential: &Credential,
        request: &CompletionRequest,
    ) -> Result<String, GeminiError> {
        let key = HeaderValue::from_str(credential.expose())
            .map_err(|_| GeminiError::InvalidCredential)?;
        let body = GenerateContentRequest::prompt(
            request.prompt.clone(),
            request.response_mime_type.as_deref(),
        );

        let response = self
            .inner
            .client
            .post(self.endpoint(&request.model))
            .header(API_KEY_HEADER, key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::handle_error_status(status, response).await);
        }

        let text = response.text().await?;
        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| GeminiError::Parse(format!("Failed to parse response: {e}")))?;

        parsed
            .text()
            .filter(|t| !t.trim().is_empty())
            .ok_or(GeminiError::EmptyResponse)
    }

    /// Handle an error status code.
    async fn handle_error_status(
        status: reqwest::StatusCode,
        response: reqwest::Response,
    ) -> GeminiError {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return GeminiError::RateLimited(retry_after);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return GeminiError::Unauthorized("API key rejected".to_string());
        }

        match response.text().await {
            Ok(body) => match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_error) => GeminiError::Api {
                    status: api_error.error.status,
                    message: api_error.error.message,
                },
                Err(_) => GeminiError::Api {
                    status: status.to_string(),
                    message: body,
                },
            },
            Err(e) => GeminiError::Http(e),
        }
    }
}

impl CompletionBackend for GeminiClient {
    fn complete<'a>(
        &'a self,
        credential: &'a Credential,
        request: &'a CompletionRequest,
    ) -> BoxFuture<'a, Result<String, GeminiError>> {
        Box::pin(self.generate(credential, request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let client = GeminiClient::new(&GeminiConfig::default()).expect("client");
        assert_eq!(
            client.endpoint("gemini-3-flash-preview"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-3-flash-preview:generateContent"
        );
    }

    #[test]
    fn test_gemini_client_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<GeminiClient>();
    }

    #[test]
    fn test_gemini_client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GeminiClient>();
    }
}
