use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReadingError {
    #[error("Missing reCAPTCHA token")]
    MissingCaptcha,

    #[error("Malformed payload: {message}")]
    MalformedPayload { message: String },

    #[error("reCAPTCHA verification failed: {reason}")]
    CaptchaRejected { reason: String },

    #[error("Authentication required")]
    Unauthorized,

    #[error("Reading not found")]
    NotFound,

    #[error("Daily reading limit reached")]
    QuotaExceeded,

    #[error("Card store unavailable: {message}")]
    CardStoreUnavailable { message: String },

    #[error("Reading history unavailable: {message}")]
    HistoryUnavailable { message: String },

    #[error("Text generation failed: {message}")]
    GenerationFailed { message: String },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

impl ReadingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ReadingError::MissingCaptcha | ReadingError::MalformedPayload { .. } => {
                StatusCode::BAD_REQUEST
            }
            ReadingError::CaptchaRejected { .. } => StatusCode::FORBIDDEN,
            ReadingError::Unauthorized => StatusCode::UNAUTHORIZED,
            ReadingError::NotFound => StatusCode::NOT_FOUND,
            ReadingError::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 回傳給客戶端的訊息，500 類錯誤不外洩上游細節
    pub fn public_message(&self) -> String {
        match self {
            ReadingError::CaptchaRejected { .. } => "reCAPTCHA verification failed".to_string(),
            ReadingError::CardStoreUnavailable { .. } => "Could not fetch card data".to_string(),
            ReadingError::HistoryUnavailable { .. } => {
                "Could not access reading history".to_string()
            }
            e if e.status_code() == StatusCode::INTERNAL_SERVER_ERROR => {
                "Internal server error".to_string()
            }
            e => e.to_string(),
        }
    }
}

impl IntoResponse for ReadingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ReadingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_rejection_taxonomy() {
        assert_eq!(ReadingError::MissingCaptcha.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ReadingError::CaptchaRejected {
                reason: "low score".to_string()
            }
            .status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(ReadingError::QuotaExceeded.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            ReadingError::CardStoreUnavailable {
                message: "boom".to_string()
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_public_message_hides_upstream_details() {
        let err = ReadingError::CardStoreUnavailable {
            message: "connection refused to 10.0.0.3".to_string(),
        };
        assert_eq!(err.public_message(), "Could not fetch card data");

        let err = ReadingError::ConfigError {
            message: "secret=abc".to_string(),
        };
        assert_eq!(err.public_message(), "Internal server error");
        assert_eq!(ReadingError::QuotaExceeded.public_message(), "Daily reading limit reached");
    }
}
