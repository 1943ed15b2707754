use crate::utils::error::{ReadingError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: impl ToString, reason: impl Into<String>) -> ReadingError {
    ReadingError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(invalid(field_name, url_str, "URL cannot be empty"));
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(invalid(
                field_name,
                url_str,
                format!("Unsupported URL scheme: {}", scheme),
            )),
        },
        Err(e) => Err(invalid(field_name, url_str, format!("Invalid URL format: {}", e))),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(invalid(field_name, path, "Path cannot be empty"));
    }

    if path.contains('\0') {
        return Err(invalid(field_name, path, "Path contains null bytes"));
    }

    Ok(())
}

pub fn validate_file_extension(field_name: &str, path: &str, allowed_extensions: &[&str]) -> Result<()> {
    match std::path::Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
    {
        Some(extension) if allowed_extensions.contains(&extension) => Ok(()),
        Some(extension) => Err(invalid(
            field_name,
            path,
            format!(
                "Unsupported file extension: {}. Allowed extensions: {}",
                extension,
                allowed_extensions.join(", ")
            ),
        )),
        None => Err(invalid(
            field_name,
            path,
            "File has no extension or invalid filename",
        )),
    }
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(invalid(
            field_name,
            value,
            format!("Value must be at least {}", min_value),
        ));
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(
            field_name,
            value,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

/// 未被環境變數替換的 `${VAR}` 代表設定缺漏
pub fn validate_substituted(field_name: &str, value: &str) -> Result<()> {
    if value.contains("${") {
        return Err(ReadingError::MissingConfigError {
            field: format!("{} (unresolved {})", field_name, value),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(invalid(
            field_name,
            value,
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("gemini.endpoint", "https://example.com").is_ok());
        assert!(validate_url("gemini.endpoint", "http://127.0.0.1:8080").is_ok());
        assert!(validate_url("gemini.endpoint", "").is_err());
        assert!(validate_url("gemini.endpoint", "invalid-url").is_err());
        assert!(validate_url("gemini.endpoint", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("quota.daily_limit", 1, 1).is_ok());
        assert!(validate_positive_number("quota.daily_limit", 0, 1).is_err());
    }

    #[test]
    fn test_validate_file_extension() {
        assert!(validate_file_extension("deck.path", "data/deck.json", &["json"]).is_ok());
        assert!(validate_file_extension("deck.path", "data/deck.csv", &["json"]).is_err());
        assert!(validate_file_extension("deck.path", "deck", &["json"]).is_err());
    }

    #[test]
    fn test_validate_range_for_scores() {
        assert!(validate_range("recaptcha.min_score", 0.5, 0.0, 1.0).is_ok());
        assert!(validate_range("recaptcha.min_score", 1.5, 0.0, 1.0).is_err());
    }

    #[test]
    fn test_validate_substituted() {
        assert!(validate_substituted("gemini.api_key", "abc123").is_ok());
        assert!(matches!(
            validate_substituted("gemini.api_key", "${GEMINI_API_KEY}"),
            Err(ReadingError::MissingConfigError { .. })
        ));
    }
}
