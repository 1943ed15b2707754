use crate::domain::model::CaptchaVerdict;
use crate::domain::ports::CaptchaVerifier;
use crate::utils::error::{ReadingError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    action: Option<String>,
    #[serde(rename = "error-codes", default)]
    error_codes: Vec<String>,
}

/// reCAPTCHA v3 `siteverify` client.
#[derive(Debug, Clone)]
pub struct RecaptchaVerifier {
    client: Client,
    verify_url: String,
    secret: String,
    expected_action: Option<String>,
}

impl RecaptchaVerifier {
    pub fn new(verify_url: &str, secret: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            verify_url: verify_url.to_string(),
            secret: secret.to_string(),
            expected_action: None,
        })
    }

    /// Tokens minted for any other action are treated as failed.
    pub fn with_expected_action(mut self, action: Option<String>) -> Self {
        self.expected_action = action;
        self
    }
}

#[async_trait]
impl CaptchaVerifier for RecaptchaVerifier {
    async fn verify(&self, token: &str, remote_addr: &str) -> Result<CaptchaVerdict> {
        let response = self
            .client
            .post(&self.verify_url)
            .form(&[
                ("secret", self.secret.as_str()),
                ("response", token),
                ("remoteip", remote_addr),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReadingError::CaptchaRejected {
                reason: format!("siteverify returned {}", status),
            });
        }

        let body: SiteVerifyResponse = response.json().await?;
        if !body.error_codes.is_empty() {
            tracing::debug!("siteverify error codes: {:?}", body.error_codes);
        }

        let action_ok = match (&self.expected_action, &body.action) {
            (Some(expected), Some(action)) => expected == action,
            (Some(_), None) => false,
            (None, _) => true,
        };

        Ok(CaptchaVerdict {
            success: body.success && action_ok,
            score: body.score,
        })
    }
}
