use std::time::Duration;

use reqwest::Client;

use super::error::GeminiError;
use super::types::{GenerateContentRequest, GenerateContentResponse};

const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Anything that can turn a generateContent request into a response.
///
/// The pipeline depends on this trait rather than on [`GeminiClient`]
/// directly so tests can substitute a deterministic fake.
pub trait ContentGenerator {
    fn generate(
        &self,
        req: &GenerateContentRequest,
    ) -> impl Future<Output = Result<GenerateContentResponse, GeminiError>>;
}

pub struct GeminiClient {
    api_key: String,
    model: String,
    client: Client,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::with_base_url(api_key, model, API_BASE_URL.to_string())
    }

    /// Create a client pointing at a custom base URL (useful for testing).
    pub fn with_base_url(api_key: String, model: String, base_url: String) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()
            .expect("failed to build HTTP client");
        Self {
            api_key,
            model,
            client,
            base_url,
        }
    }
}

impl ContentGenerator for GeminiClient {
    async fn generate(
        &self,
        req: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(req)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs * 1000)
                .unwrap_or(1000);
            return Err(GeminiError::RateLimited {
                retry_after_ms: retry_after,
            });
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(GeminiError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.json::<GenerateContentResponse>().await?;
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> GenerateContentRequest {
        GenerateContentRequest::for_image("image/jpeg", "QUJD".into(), "extract", None)
    }

    #[tokio::test]
    async fn generate_returns_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.0-flash:generateContent"))
            .and(header("x-goog-api-key", "key-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {"parts": [{"text": "[{\"name\":\"Stout\"}]"}], "role": "model"},
                    "finishReason": "STOP"
                }]
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::with_base_url(
            "key-123".into(),
            "gemini-2.0-flash".into(),
            server.uri(),
        );
        let resp = client.generate(&request()).await.unwrap();
        assert_eq!(resp.first_text(), Some(r#"[{"name":"Stout"}]"#));
    }

    #[tokio::test]
    async fn generate_maps_429_to_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .mount(&server)
            .await;

        let client =
            GeminiClient::with_base_url("k".into(), "gemini-2.0-flash".into(), server.uri());
        let err = client.generate(&request()).await.unwrap_err();
        assert!(matches!(
            err,
            GeminiError::RateLimited {
                retry_after_ms: 7000
            }
        ));
    }

    #[tokio::test]
    async fn generate_surfaces_api_errors_with_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let client =
            GeminiClient::with_base_url("k".into(), "gemini-2.0-flash".into(), server.uri());
        let err = client.generate(&request()).await.unwrap_err();
        match err {
            GeminiError::ApiError { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "quota exceeded");
            }
            other => panic!("expected ApiError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn generate_maps_unreachable_host_to_network_error() {
        // Port 1 is never listening.
        let client = GeminiClient::with_base_url(
            "k".into(),
            "gemini-2.0-flash".into(),
            "http://127.0.0.1:1".into(),
        );
        let err = client.generate(&request()).await.unwrap_err();
        assert!(matches!(err, GeminiError::NetworkError(_)));
    }
}
