use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

pub const FALLBACK_INTERPRETATION: &str = "No interpretation available";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Orientation {
    #[default]
    Upright,
    Reversed,
}

impl Orientation {
    pub fn label(self) -> &'static str {
        match self {
            Orientation::Upright => "Al derecho",
            Orientation::Reversed => "Invertida",
        }
    }
}

// 只有 "reversed" 代表逆位，其他值一律視為正位
impl From<String> for Orientation {
    fn from(value: String) -> Self {
        if value == "reversed" {
            Orientation::Reversed
        } else {
            Orientation::Upright
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: u32,
    pub name: String,
    #[serde(default, deserialize_with = "keyword_list")]
    pub keywords_upright: Vec<String>,
    #[serde(default, deserialize_with = "keyword_list")]
    pub keywords_reversed: Vec<String>,
    pub interpretation_upright: String,
    pub interpretation_reversed: String,
}

impl Card {
    pub fn keywords(&self, orientation: Orientation) -> &[String] {
        match orientation {
            Orientation::Upright => &self.keywords_upright,
            Orientation::Reversed => &self.keywords_reversed,
        }
    }

    pub fn interpretation(&self, orientation: Orientation) -> &str {
        match orientation {
            Orientation::Upright => &self.interpretation_upright,
            Orientation::Reversed => &self.interpretation_reversed,
        }
    }
}

/// Keywords may be stored as an array or as one comma-separated string.
fn keyword_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Keywords {
        List(Vec<String>),
        Joined(String),
        Missing(()),
    }

    Ok(match Keywords::deserialize(deserializer)? {
        Keywords::List(list) => list,
        Keywords::Joined(joined) => joined
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect(),
        Keywords::Missing(()) => Vec::new(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedCard {
    pub id: u32,
    #[serde(default)]
    pub orientation: Orientation,
}

fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.trim().is_empty()))
}

/// `null` reads the same as an omitted list.
fn nullable_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadingRequest {
    #[serde(rename = "type", default)]
    pub reading_type: String,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default, deserialize_with = "nullable_list")]
    pub cards: Vec<SelectedCard>,
    #[serde(rename = "recaptchaToken", default, deserialize_with = "non_empty")]
    pub recaptcha_token: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub guest_id: Option<String>,
}

/// One interpreted card, as returned to the client and as stored in history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardReading {
    pub name: String,
    pub orientation: String,
    pub keywords: Vec<String>,
    pub interpretation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingResponse {
    pub cards: Vec<CardReading>,
    pub interpretation: String,
    #[serde(rename = "type")]
    pub reading_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveReadingRequest {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(alias = "type", default)]
    pub reading_type: String,
    #[serde(alias = "cards", default, deserialize_with = "nullable_list")]
    pub cards_drawn: Vec<CardReading>,
    #[serde(default)]
    pub interpretation: String,
    #[serde(default, deserialize_with = "non_empty")]
    pub guest_id: Option<String>,
    #[serde(rename = "recaptchaToken", default, deserialize_with = "non_empty")]
    pub recaptcha_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingRecord {
    pub id: Uuid,
    #[serde(default)]
    pub question: Option<String>,
    pub reading_type: String,
    #[serde(default)]
    pub cards_drawn: Vec<CardReading>,
    #[serde(default)]
    pub interpretation: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub guest_id: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: String,
    pub premium: bool,
}

/// Who is asking: the unit of rate limiting and record ownership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requester {
    User(AuthenticatedUser),
    Guest(String),
    Address(String),
}

impl Requester {
    pub fn resolve(user: Option<AuthenticatedUser>, guest_id: Option<&str>, address: &str) -> Self {
        match (user, guest_id) {
            (Some(user), _) => Requester::User(user),
            (None, Some(guest)) => Requester::Guest(guest.to_string()),
            (None, None) => Requester::Address(address.to_string()),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Requester::User(_))
    }

    pub fn is_premium(&self) -> bool {
        matches!(self, Requester::User(user) if user.premium)
    }
}

impl fmt::Display for Requester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requester::User(user) => write!(f, "user:{}", user.id),
            Requester::Guest(id) => write!(f, "guest:{}", id),
            Requester::Address(ip) => write!(f, "ip:{}", ip),
        }
    }
}

/// Per-request facts the transport layer extracts before the service runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub bearer_token: Option<String>,
    pub remote_addr: String,
}

impl RequestContext {
    pub fn new(bearer_token: Option<String>, remote_addr: impl Into<String>) -> Self {
        Self {
            bearer_token,
            remote_addr: remote_addr.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptchaVerdict {
    pub success: bool,
    #[serde(default)]
    pub score: Option<f64>,
}
