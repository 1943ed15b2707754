use crate::core::quota::{self, QuotaPolicy};
use crate::core::{catalog, interpretation, prompt};
use crate::domain::model::{
    ReadingRecord, ReadingRequest, ReadingResponse, RequestContext, Requester,
    SaveReadingRequest, FALLBACK_INTERPRETATION,
};
use crate::domain::ports::{
    CaptchaVerifier, CardStore, IdentityProvider, ReadingHistory, TextGenerator,
};
use crate::utils::error::{ReadingError, Result};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

pub const DEFAULT_MIN_SCORE: f64 = 0.5;

/// Turns a card selection into a finished reading.
///
/// Each call runs identity resolution, the CAPTCHA gate (anonymous callers
/// only), the daily quota gate (non-premium callers only), card lookup,
/// prompt rendering and text generation, strictly in that order.
pub struct ReadingService {
    identity: Arc<dyn IdentityProvider>,
    cards: Arc<dyn CardStore>,
    history: Arc<dyn ReadingHistory>,
    captcha: Arc<dyn CaptchaVerifier>,
    generator: Arc<dyn TextGenerator>,
    min_score: f64,
    quota: QuotaPolicy,
}

fn log_suspect(requester: &Requester, ctx: &RequestContext, reason: &str) {
    tracing::warn!(
        target: "abuse",
        identity = %requester,
        ip = %ctx.remote_addr,
        reason = %reason,
        "Suspicious reading request rejected"
    );
}

fn history_error(e: ReadingError) -> ReadingError {
    match e {
        e @ ReadingError::HistoryUnavailable { .. } => e,
        other => ReadingError::HistoryUnavailable {
            message: other.to_string(),
        },
    }
}

fn card_store_error(e: ReadingError) -> ReadingError {
    match e {
        e @ ReadingError::CardStoreUnavailable { .. } => e,
        other => ReadingError::CardStoreUnavailable {
            message: other.to_string(),
        },
    }
}

impl ReadingService {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        cards: Arc<dyn CardStore>,
        history: Arc<dyn ReadingHistory>,
        captcha: Arc<dyn CaptchaVerifier>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            identity,
            cards,
            history,
            captcha,
            generator,
            min_score: DEFAULT_MIN_SCORE,
            quota: QuotaPolicy::default(),
        }
    }

    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn with_quota(mut self, quota: QuotaPolicy) -> Self {
        self.quota = quota;
        self
    }

    async fn resolve_requester(&self, ctx: &RequestContext, guest_id: Option<&str>) -> Requester {
        let user = match self.identity.authenticate(ctx.bearer_token.as_deref()).await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!("Identity lookup failed, treating caller as anonymous: {}", e);
                None
            }
        };

        Requester::resolve(user, guest_id, &ctx.remote_addr)
    }

    async fn check_captcha(
        &self,
        requester: &Requester,
        token: Option<&str>,
        ctx: &RequestContext,
    ) -> Result<()> {
        if requester.is_authenticated() {
            return Ok(());
        }

        let Some(token) = token else {
            log_suspect(requester, ctx, "missing recaptcha token");
            return Err(ReadingError::MissingCaptcha);
        };

        let verdict = match self.captcha.verify(token, &ctx.remote_addr).await {
            Ok(verdict) => verdict,
            Err(e) => {
                let reason = format!("verification call failed: {}", e);
                log_suspect(requester, ctx, &reason);
                return Err(ReadingError::CaptchaRejected { reason });
            }
        };

        if !verdict.success {
            log_suspect(requester, ctx, "recaptcha verification unsuccessful");
            return Err(ReadingError::CaptchaRejected {
                reason: "verification unsuccessful".to_string(),
            });
        }

        // 沒有分數一律視為不通過
        let score = verdict.score.unwrap_or(0.0);
        if score < self.min_score {
            let reason = format!("score {:.2} below threshold {:.2}", score, self.min_score);
            log_suspect(requester, ctx, &reason);
            return Err(ReadingError::CaptchaRejected { reason });
        }

        tracing::debug!("reCAPTCHA passed for {} with score {:.2}", requester, score);
        Ok(())
    }

    async fn check_quota(&self, requester: &Requester, ctx: &RequestContext) -> Result<()> {
        if requester.is_premium() {
            tracing::debug!("Premium requester {}, skipping quota", requester);
            return Ok(());
        }

        let since = quota::start_of_local_day();
        let readings_today = self
            .history
            .count_since(requester, since)
            .await
            .map_err(history_error)?;

        if self.quota.is_exceeded(readings_today) {
            log_suspect(
                requester,
                ctx,
                &format!("daily quota exceeded ({} readings today)", readings_today),
            );
            return Err(ReadingError::QuotaExceeded);
        }

        Ok(())
    }

    pub async fn generate(
        &self,
        request: ReadingRequest,
        ctx: &RequestContext,
    ) -> Result<ReadingResponse> {
        tracing::info!(
            "Reading request: type={}, cards={}",
            request.reading_type,
            request.cards.len()
        );

        let requester = self
            .resolve_requester(ctx, request.guest_id.as_deref())
            .await;

        self.check_captcha(&requester, request.recaptcha_token.as_deref(), ctx)
            .await?;
        self.check_quota(&requester, ctx).await?;

        let count = catalog::card_count(&request.reading_type);
        let ids = interpretation::selected_ids(&request.cards, count);
        tracing::debug!("Selected card ids: {:?}", ids);

        let cards = self.cards.fetch(&ids).await.map_err(card_store_error)?;
        let readings = interpretation::assemble(&request.reading_type, &request.cards, &cards);
        if readings.len() < ids.len() {
            tracing::warn!(
                "{} of {} selected cards were not found in the store",
                ids.len() - readings.len(),
                ids.len()
            );
        }

        let prompt = prompt::build_prompt(
            &request.reading_type,
            request.question.as_deref(),
            &readings,
        );
        tracing::debug!("Prompt for generation:\n{}", prompt);

        let interpretation = match self.generator.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Text generation failed, using fallback: {}", e);
                FALLBACK_INTERPRETATION.to_string()
            }
        };

        tracing::info!("✅ Reading generated for {}", requester);

        Ok(ReadingResponse {
            cards: readings,
            interpretation,
            reading_type: request.reading_type,
            question: request.question,
        })
    }

    pub async fn save_reading(
        &self,
        request: SaveReadingRequest,
        ctx: &RequestContext,
    ) -> Result<ReadingRecord> {
        if request.reading_type.trim().is_empty() {
            return Err(ReadingError::MalformedPayload {
                message: "reading_type is required".to_string(),
            });
        }

        let requester = self
            .resolve_requester(ctx, request.guest_id.as_deref())
            .await;

        // 匿名寫入同樣要過 reCAPTCHA
        self.check_captcha(&requester, request.recaptcha_token.as_deref(), ctx)
            .await?;

        let (user_id, guest_id) = match &requester {
            Requester::User(user) => (Some(user.id.clone()), None),
            Requester::Guest(guest) => (None, Some(guest.clone())),
            Requester::Address(_) => (None, None),
        };

        let record = ReadingRecord {
            id: Uuid::new_v4(),
            question: request.question,
            reading_type: request.reading_type,
            cards_drawn: request.cards_drawn,
            interpretation: request.interpretation,
            user_id,
            guest_id,
            ip_address: Some(ctx.remote_addr.clone()),
            created_at: Utc::now(),
        };

        let stored = self.history.insert(record).await.map_err(history_error)?;
        tracing::info!("Reading {} saved for {}", stored.id, requester);
        Ok(stored)
    }

    async fn require_user(&self, ctx: &RequestContext) -> Result<String> {
        match self.resolve_requester(ctx, None).await {
            Requester::User(user) => Ok(user.id),
            _ => Err(ReadingError::Unauthorized),
        }
    }

    pub async fn list_readings(&self, ctx: &RequestContext) -> Result<Vec<ReadingRecord>> {
        let user_id = self.require_user(ctx).await?;
        self.history
            .list_for_user(&user_id)
            .await
            .map_err(history_error)
    }

    pub async fn get_reading(&self, id: Uuid, ctx: &RequestContext) -> Result<ReadingRecord> {
        let user_id = self.require_user(ctx).await?;
        self.history
            .find_for_user(&user_id, id)
            .await
            .map_err(history_error)?
            .ok_or(ReadingError::NotFound)
    }
}
