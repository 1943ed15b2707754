use crate::adapters::{gemini, recaptcha};
use crate::core::service::DEFAULT_MIN_SCORE;
use crate::utils::error::{ReadingError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub supabase: Option<SupabaseConfig>,
    #[serde(default)]
    pub deck: DeckConfig,
    pub recaptcha: RecaptchaConfig,
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub quota: QuotaConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub allowed_origins: Option<Vec<String>>,
    pub trust_proxy_headers: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    pub url: String,
    pub service_key: String,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeckConfig {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecaptchaConfig {
    pub secret: String,
    pub verify_url: Option<String>,
    pub min_score: Option<f64>,
    pub expected_action: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuotaConfig {
    pub daily_limit: Option<u64>,
}

impl ServerConfig {
    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or("0.0.0.0")
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(3000)
    }

    pub fn allowed_origins(&self) -> &[String] {
        self.allowed_origins.as_deref().unwrap_or(&[])
    }

    pub fn trust_proxy_headers(&self) -> bool {
        self.trust_proxy_headers.unwrap_or(false)
    }
}

impl SupabaseConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(10))
    }
}

impl DeckConfig {
    pub fn path(&self) -> &str {
        self.path.as_deref().unwrap_or("data/deck.json")
    }
}

impl RecaptchaConfig {
    pub fn verify_url(&self) -> &str {
        self.verify_url
            .as_deref()
            .unwrap_or(recaptcha::DEFAULT_VERIFY_URL)
    }

    pub fn min_score(&self) -> f64 {
        self.min_score.unwrap_or(DEFAULT_MIN_SCORE)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(10))
    }
}

impl GeminiConfig {
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(gemini::DEFAULT_MODEL)
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(gemini::DEFAULT_ENDPOINT)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(30))
    }
}

impl QuotaConfig {
    pub fn daily_limit(&self) -> u64 {
        self.daily_limit.unwrap_or(1)
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ReadingError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ReadingError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GEMINI_API_KEY})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ReadingError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 是否使用本地牌組與記憶體歷史（未設定 Supabase）
    pub fn is_local_mode(&self) -> bool {
        self.supabase.is_none()
    }

    pub fn validate_config(&self) -> Result<()> {
        if let Some(supabase) = &self.supabase {
            validation::validate_substituted("supabase.url", &supabase.url)?;
            validation::validate_url("supabase.url", &supabase.url)?;
            validation::validate_substituted("supabase.service_key", &supabase.service_key)?;
            validation::validate_non_empty_string("supabase.service_key", &supabase.service_key)?;
        } else {
            validation::validate_path("deck.path", self.deck.path())?;
            validation::validate_file_extension("deck.path", self.deck.path(), &["json"])?;
        }

        validation::validate_substituted("recaptcha.secret", &self.recaptcha.secret)?;
        validation::validate_non_empty_string("recaptcha.secret", &self.recaptcha.secret)?;
        validation::validate_url("recaptcha.verify_url", self.recaptcha.verify_url())?;
        validation::validate_range("recaptcha.min_score", self.recaptcha.min_score(), 0.0, 1.0)?;

        validation::validate_substituted("gemini.api_key", &self.gemini.api_key)?;
        validation::validate_non_empty_string("gemini.api_key", &self.gemini.api_key)?;
        validation::validate_url("gemini.endpoint", self.gemini.endpoint())?;
        validation::validate_non_empty_string("gemini.model", self.gemini.model())?;

        validation::validate_positive_number("quota.daily_limit", self.quota.daily_limit(), 1)?;

        for origin in self.server.allowed_origins() {
            validation::validate_url("server.allowed_origins", origin)?;
        }

        Ok(())
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
