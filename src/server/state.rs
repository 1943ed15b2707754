use std::sync::Arc;

use crate::adapters::{
    GeminiGenerator, InMemoryCardStore, InMemoryHistory, RecaptchaVerifier, StaticIdentity,
    SupabaseClient,
};
use crate::config::AppConfig;
use crate::core::quota::QuotaPolicy;
use crate::core::service::ReadingService;
use crate::utils::error::Result;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ReadingService>,
    pub trust_proxy_headers: bool,
}

impl AppState {
    pub fn new(service: ReadingService, trust_proxy_headers: bool) -> Self {
        Self {
            service: Arc::new(service),
            trust_proxy_headers,
        }
    }

    /// Wires every adapter described by `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let captcha = Arc::new(
            RecaptchaVerifier::new(
                config.recaptcha.verify_url(),
                &config.recaptcha.secret,
                config.recaptcha.timeout(),
            )?
            .with_expected_action(config.recaptcha.expected_action.clone()),
        );

        let generator = Arc::new(GeminiGenerator::new(
            config.gemini.endpoint(),
            config.gemini.model(),
            &config.gemini.api_key,
            config.gemini.timeout(),
        )?);

        let service = match &config.supabase {
            Some(supabase) => {
                tracing::info!("Using Supabase project at {}", supabase.url);
                let client = Arc::new(SupabaseClient::new(
                    &supabase.url,
                    &supabase.service_key,
                    supabase.timeout(),
                )?);
                ReadingService::new(client.clone(), client.clone(), client, captcha, generator)
            }
            None => {
                tracing::warn!(
                    "No Supabase project configured, using local deck {} and in-memory history",
                    config.deck.path()
                );
                let cards = InMemoryCardStore::from_json_file(config.deck.path())?;
                ReadingService::new(
                    Arc::new(StaticIdentity::default()),
                    Arc::new(cards),
                    Arc::new(InMemoryHistory::default()),
                    captcha,
                    generator,
                )
            }
        }
        .with_min_score(config.recaptcha.min_score())
        .with_quota(QuotaPolicy::new(config.quota.daily_limit()));

        Ok(Self::new(service, config.server.trust_proxy_headers()))
    }
}
