use crate::domain::ports::TextGenerator;
use crate::utils::error::{ReadingError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
            .filter(|text| !text.trim().is_empty())
    }
}

/// Gemini `generateContent` client.
#[derive(Debug, Clone)]
pub struct GeminiGenerator {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiGenerator {
    pub fn new(endpoint: &str, model: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        // reqwest errors carry the request URL, keep the key out of it
        let response = self
            .client
            .post(self.url())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ReadingError::GenerationFailed {
                message: format!("request failed: {}", e.without_url()),
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ReadingError::GenerationFailed {
                message: format!("status {}: {}", status, text),
            });
        }

        let parsed: GenerateResponse =
            response
                .json()
                .await
                .map_err(|e| ReadingError::GenerationFailed {
                    message: format!("malformed response: {}", e.without_url()),
                })?;

        parsed.first_text().ok_or_else(|| ReadingError::GenerationFailed {
            message: "response carried no candidate text".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn generator(server: &MockServer, timeout: Duration) -> GeminiGenerator {
        GeminiGenerator::new(&server.base_url(), DEFAULT_MODEL, "gem-key", timeout).unwrap()
    }

    #[tokio::test]
    async fn test_generate_extracts_first_candidate() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1beta/models/gemini-1.5-flash-latest:generateContent")
                .header("x-goog-api-key", "gem-key")
                .json_body(json!({"contents": [{"parts": [{"text": "hola"}]}]}));
            then.status(200).json_body(json!({
                "candidates": [{"content": {"parts": [{"text": "Una conclusión."}]}}]
            }));
        });

        let text = generator(&server, Duration::from_secs(5))
            .generate("hola")
            .await
            .unwrap();

        mock.assert();
        assert_eq!(text, "Una conclusión.");
    }

    #[tokio::test]
    async fn test_empty_candidates_is_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(200).json_body(json!({"candidates": []}));
        });

        let result = generator(&server, Duration::from_secs(5)).generate("x").await;
        assert!(matches!(result, Err(ReadingError::GenerationFailed { .. })));
    }

    #[tokio::test]
    async fn test_malformed_body_is_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(200).body("<html>oops</html>");
        });

        let result = generator(&server, Duration::from_secs(5)).generate("x").await;
        assert!(matches!(result, Err(ReadingError::GenerationFailed { .. })));
    }

    #[tokio::test]
    async fn test_timeout_is_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(200)
                .delay(Duration::from_millis(500))
                .json_body(json!({"candidates": []}));
        });

        let result = generator(&server, Duration::from_millis(50)).generate("x").await;
        assert!(matches!(result, Err(ReadingError::GenerationFailed { .. })));
    }

    #[tokio::test]
    async fn test_errors_never_mention_api_key() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(200)
                .delay(Duration::from_millis(500))
                .json_body(json!({"candidates": []}));
        });

        let client = GeminiGenerator::new(
            &server.base_url(),
            DEFAULT_MODEL,
            "SECRET-GEMINI-KEY",
            Duration::from_millis(50),
        )
        .unwrap();
        let err = client.generate("x").await.unwrap_err();

        let logged = format!("Text generation failed, using fallback: {}", err);
        assert!(!logged.contains("SECRET-GEMINI-KEY"), "{}", logged);
        assert!(!format!("{:?}", err).contains("SECRET-GEMINI-KEY"));
    }

    #[tokio::test]
    async fn test_api_key_is_not_sent_in_query() {
        let server = MockServer::start();
        let leaked = server.mock(|when, then| {
            when.method(POST).query_param_exists("key");
            then.status(400);
        });
        server.mock(|when, then| {
            when.method(POST).header("x-goog-api-key", "gem-key");
            then.status(200).json_body(json!({
                "candidates": [{"content": {"parts": [{"text": "ok"}]}}]
            }));
        });

        let text = generator(&server, Duration::from_secs(5))
            .generate("x")
            .await
            .unwrap();

        assert_eq!(text, "ok");
        leaked.assert_hits(0);
    }
}
