use crate::domain::model::{AuthenticatedUser, Card, ReadingRecord, Requester};
use crate::domain::ports::{CardStore, IdentityProvider, ReadingHistory};
use crate::utils::error::{ReadingError, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

pub const CARDS_TABLE: &str = "tarot_cards";
pub const READINGS_TABLE: &str = "readings";
const CARD_COLUMNS: &str =
    "id,name,keywords_upright,keywords_reversed,interpretation_upright,interpretation_reversed";

/// PostgREST + Auth client for a Supabase project.
///
/// Implements [`CardStore`], [`ReadingHistory`] and [`IdentityProvider`].
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_key: String,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    app_metadata: AppMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct AppMetadata {
    #[serde(default)]
    premium: bool,
}

impl SupabaseClient {
    pub fn new(base_url: &str, service_key: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
        })
    }

    fn rest(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    async fn read_rows<T: serde::de::DeserializeOwned>(response: Response) -> Result<Vec<T>> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReadingError::HistoryUnavailable {
                message: format!("status {}: {}", status, body),
            });
        }
        Ok(response.json().await?)
    }

    async fn history_rows<T: serde::de::DeserializeOwned>(
        &self,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let response = self
            .rest(self.client.get(self.table_url(READINGS_TABLE)))
            .query(query)
            .send()
            .await
            .map_err(|e| ReadingError::HistoryUnavailable {
                message: e.to_string(),
            })?;
        Self::read_rows(response).await
    }
}

fn owner_filter(requester: &Requester) -> (&'static str, String) {
    match requester {
        Requester::User(user) => ("user_id", format!("eq.{}", user.id)),
        Requester::Guest(guest) => ("guest_id", format!("eq.{}", guest)),
        Requester::Address(ip) => ("ip_address", format!("eq.{}", ip)),
    }
}

#[async_trait]
impl CardStore for SupabaseClient {
    async fn fetch(&self, ids: &[u32]) -> Result<Vec<Card>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let id_list = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");

        tracing::debug!("Fetching cards ({}) from Supabase", id_list);
        let response = self
            .rest(self.client.get(self.table_url(CARDS_TABLE)))
            .query(&[("select", CARD_COLUMNS.to_string()), ("id", format!("in.({})", id_list))])
            .send()
            .await
            .map_err(|e| ReadingError::CardStoreUnavailable {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReadingError::CardStoreUnavailable {
                message: format!("status {}: {}", status, body),
            });
        }

        response
            .json()
            .await
            .map_err(|e| ReadingError::CardStoreUnavailable {
                message: format!("malformed card rows: {}", e),
            })
    }
}

#[async_trait]
impl ReadingHistory for SupabaseClient {
    async fn count_since(&self, requester: &Requester, since: DateTime<Utc>) -> Result<u64> {
        let (column, value) = owner_filter(requester);
        let rows: Vec<serde_json::Value> = self
            .history_rows(&[
                ("select", "id".to_string()),
                (
                    "created_at",
                    format!("gte.{}", since.to_rfc3339_opts(SecondsFormat::Secs, true)),
                ),
                (column, value),
            ])
            .await?;
        Ok(rows.len() as u64)
    }

    async fn insert(&self, record: ReadingRecord) -> Result<ReadingRecord> {
        let response = self
            .rest(self.client.post(self.table_url(READINGS_TABLE)))
            .header("Prefer", "return=representation")
            .json(&record)
            .send()
            .await
            .map_err(|e| ReadingError::HistoryUnavailable {
                message: e.to_string(),
            })?;

        let mut rows: Vec<ReadingRecord> = Self::read_rows(response).await?;
        Ok(if rows.is_empty() { record } else { rows.remove(0) })
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<ReadingRecord>> {
        self.history_rows(&[
            ("select", "*".to_string()),
            ("user_id", format!("eq.{}", user_id)),
            ("order", "created_at.desc".to_string()),
        ])
        .await
    }

    async fn find_for_user(&self, user_id: &str, id: Uuid) -> Result<Option<ReadingRecord>> {
        let rows: Vec<ReadingRecord> = self
            .history_rows(&[
                ("select", "*".to_string()),
                ("user_id", format!("eq.{}", user_id)),
                ("id", format!("eq.{}", id)),
            ])
            .await?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl IdentityProvider for SupabaseClient {
    async fn authenticate(&self, bearer_token: Option<&str>) -> Result<Option<AuthenticatedUser>> {
        let Some(token) = bearer_token else {
            return Ok(None);
        };

        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.service_key)
            .bearer_auth(token)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let user: AuthUser = response.json().await?;
                Ok(Some(AuthenticatedUser {
                    id: user.id,
                    premium: user.app_metadata.premium,
                }))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status => Err(ReadingError::ConfigError {
                message: format!("auth endpoint returned {}", status),
            }),
        }
    }
}
