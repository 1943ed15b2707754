//! Process-local adapters: a JSON deck file for card data, an in-memory
//! reading history and a fixed token table for identities. Used for local
//! runs when no Supabase project is configured.

use crate::domain::model::{AuthenticatedUser, Card, ReadingRecord, Requester};
use crate::domain::ports::{CardStore, IdentityProvider, ReadingHistory};
use crate::utils::error::{ReadingError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct InMemoryCardStore {
    cards: HashMap<u32, Card>,
}

impl InMemoryCardStore {
    pub fn new(cards: Vec<Card>) -> Self {
        Self {
            cards: cards.into_iter().map(|card| (card.id, card)).collect(),
        }
    }

    /// 讀取 JSON 牌組檔（Card 陣列）
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            ReadingError::CardStoreUnavailable {
                message: format!("cannot read deck {}: {}", path.as_ref().display(), e),
            }
        })?;
        let cards: Vec<Card> = serde_json::from_str(&content)?;
        tracing::info!("Loaded {} cards from {}", cards.len(), path.as_ref().display());
        Ok(Self::new(cards))
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

#[async_trait]
impl CardStore for InMemoryCardStore {
    async fn fetch(&self, ids: &[u32]) -> Result<Vec<Card>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.cards.get(id).cloned())
            .collect())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryHistory {
    records: RwLock<Vec<ReadingRecord>>,
}

fn owned_by(record: &ReadingRecord, requester: &Requester) -> bool {
    match requester {
        Requester::User(user) => record.user_id.as_deref() == Some(user.id.as_str()),
        Requester::Guest(guest) => record.guest_id.as_deref() == Some(guest.as_str()),
        Requester::Address(ip) => record.ip_address.as_deref() == Some(ip.as_str()),
    }
}

#[async_trait]
impl ReadingHistory for InMemoryHistory {
    async fn count_since(&self, requester: &Requester, since: DateTime<Utc>) -> Result<u64> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|record| record.created_at >= since && owned_by(record, requester))
            .count() as u64)
    }

    async fn insert(&self, record: ReadingRecord) -> Result<ReadingRecord> {
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<ReadingRecord>> {
        let records = self.records.read().await;
        let mut owned: Vec<ReadingRecord> = records
            .iter()
            .filter(|record| record.user_id.as_deref() == Some(user_id))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn find_for_user(&self, user_id: &str, id: Uuid) -> Result<Option<ReadingRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .find(|record| record.id == id && record.user_id.as_deref() == Some(user_id))
            .cloned())
    }
}

/// Resolves bearer tokens from a fixed table. An empty table never
/// authenticates anyone.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    users: HashMap<String, AuthenticatedUser>,
}

impl StaticIdentity {
    pub fn with_user(mut self, token: impl Into<String>, user: AuthenticatedUser) -> Self {
        self.users.insert(token.into(), user);
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn authenticate(&self, bearer_token: Option<&str>) -> Result<Option<AuthenticatedUser>> {
        Ok(bearer_token.and_then(|token| self.users.get(token).cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn record(user: Option<&str>, guest: Option<&str>, ip: &str, age_hours: i64) -> ReadingRecord {
        ReadingRecord {
            id: Uuid::new_v4(),
            question: None,
            reading_type: "single".to_string(),
            cards_drawn: vec![],
            interpretation: String::new(),
            user_id: user.map(str::to_string),
            guest_id: guest.map(str::to_string),
            ip_address: Some(ip.to_string()),
            created_at: Utc::now() - Duration::hours(age_hours),
        }
    }

    #[tokio::test]
    async fn test_deck_file_loading_and_lookup() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            br#"[
                {"id": 0, "name": "El Loco", "keywords_upright": ["inicio"], "keywords_reversed": "caos",
                 "interpretation_upright": "a", "interpretation_reversed": "b"},
                {"id": 1, "name": "El Mago", "keywords_upright": [], "keywords_reversed": [],
                 "interpretation_upright": "c", "interpretation_reversed": "d"}
            ]"#,
        )
        .unwrap();

        let store = InMemoryCardStore::from_json_file(file.path()).unwrap();
        assert_eq!(store.len(), 2);

        let cards = store.fetch(&[1, 42, 0]).await.unwrap();
        let names: Vec<&str> = cards.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["El Mago", "El Loco"]);
        assert_eq!(cards[1].keywords_reversed, vec!["caos"]);
    }

    #[tokio::test]
    async fn test_missing_deck_file_is_a_store_error() {
        let result = InMemoryCardStore::from_json_file("/nonexistent/deck.json");
        assert!(matches!(result, Err(ReadingError::CardStoreUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_count_since_matches_requester_kind() {
        let history = InMemoryHistory::default();
        history.insert(record(Some("u1"), None, "10.0.0.1", 0)).await.unwrap();
        history.insert(record(None, Some("g1"), "10.0.0.2", 0)).await.unwrap();
        history.insert(record(None, Some("g1"), "10.0.0.2", 48)).await.unwrap();

        let since = Utc::now() - Duration::hours(1);
        let user = Requester::User(AuthenticatedUser {
            id: "u1".to_string(),
            premium: false,
        });

        assert_eq!(history.count_since(&user, since).await.unwrap(), 1);
        assert_eq!(
            history
                .count_since(&Requester::Guest("g1".to_string()), since)
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            history
                .count_since(&Requester::Address("10.0.0.2".to_string()), since)
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            history
                .count_since(&Requester::Guest("g2".to_string()), since)
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_list_for_user_is_newest_first() {
        let history = InMemoryHistory::default();
        let old = record(Some("u1"), None, "10.0.0.1", 30);
        let new = record(Some("u1"), None, "10.0.0.1", 1);
        history.insert(old.clone()).await.unwrap();
        history.insert(new.clone()).await.unwrap();
        history.insert(record(Some("u2"), None, "10.0.0.1", 0)).await.unwrap();

        let listed = history.list_for_user("u1").await.unwrap();
        assert_eq!(listed, vec![new, old.clone()]);

        assert!(history.find_for_user("u2", old.id).await.unwrap().is_none());
        assert_eq!(history.find_for_user("u1", old.id).await.unwrap(), Some(old));
    }

    #[tokio::test]
    async fn test_static_identity() {
        let identity = StaticIdentity::default().with_user(
            "t1",
            AuthenticatedUser {
                id: "u1".to_string(),
                premium: true,
            },
        );

        assert!(identity.authenticate(None).await.unwrap().is_none());
        assert!(identity.authenticate(Some("nope")).await.unwrap().is_none());
        assert!(identity.authenticate(Some("t1")).await.unwrap().unwrap().premium);
    }
}
