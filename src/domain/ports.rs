use crate::domain::model::{
    AuthenticatedUser, Card, CaptchaVerdict, ReadingRecord, Requester,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `Ok(None)` when the token is absent, expired or unknown.
    async fn authenticate(&self, bearer_token: Option<&str>) -> Result<Option<AuthenticatedUser>>;
}

#[async_trait]
pub trait CardStore: Send + Sync {
    /// Returns the cards found among `ids`; unknown ids are simply absent.
    async fn fetch(&self, ids: &[u32]) -> Result<Vec<Card>>;
}

#[async_trait]
pub trait ReadingHistory: Send + Sync {
    async fn count_since(&self, requester: &Requester, since: DateTime<Utc>) -> Result<u64>;
    async fn insert(&self, record: ReadingRecord) -> Result<ReadingRecord>;
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<ReadingRecord>>;
    async fn find_for_user(&self, user_id: &str, id: Uuid) -> Result<Option<ReadingRecord>>;
}

#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    async fn verify(&self, token: &str, remote_addr: &str) -> Result<CaptchaVerdict>;
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}
