//! Journal entry model and related payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Journal entry entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: Uuid,
    pub title: String,
    pub notes: String,
    pub tag: Vec<String>,
    pub is_favourite: bool,
    pub user_id: Uuid,
    pub created_on: DateTime<Utc>,
    pub image_url: String,
    pub journal_date: DateTime<Utc>,
}

/// Validated fields for a new entry
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub user_id: Uuid,
    pub title: String,
    pub notes: String,
    pub tag: Vec<String>,
    pub image_url: String,
    pub journal_date: DateTime<Utc>,
}

/// Validated replacement fields for an existing entry
#[derive(Debug, Clone)]
pub struct EntryChanges {
    pub title: String,
    pub notes: String,
    pub tag: Vec<String>,
    pub image_url: String,
    pub journal_date: DateTime<Utc>,
}

impl EntryChanges {
    pub fn into_new_entry(self, user_id: Uuid) -> NewEntry {
        NewEntry {
            user_id,
            title: self.title,
            notes: self.notes,
            tag: self.tag,
            image_url: self.image_url,
            journal_date: self.journal_date,
        }
    }
}

/// Milliseconds since the Unix epoch, sent either as a JSON number or as a
/// numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EpochMillis {
    Number(i64),
    Text(String),
}

impl EpochMillis {
    pub fn as_millis(&self) -> Option<i64> {
        match self {
            EpochMillis::Number(ms) => Some(*ms),
            EpochMillis::Text(text) => text.trim().parse().ok(),
        }
    }
}

impl From<i64> for EpochMillis {
    fn from(ms: i64) -> Self {
        EpochMillis::Number(ms)
    }
}

/// Body of the add and edit endpoints
///
/// Every field is optional at the wire level so that missing fields surface
/// as validation errors rather than deserialization failures.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EntryRequest {
    pub title: Option<String>,
    pub notes: Option<String>,
    pub tag: Option<Vec<String>>,
    pub image_url: Option<String>,
    pub journal_date: Option<EpochMillis>,
}

/// Body of the favourite toggle endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavouriteRequest {
    pub is_favourite: bool,
}
