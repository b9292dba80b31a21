//! Journal entry lifecycle
//!
//! Every operation is scoped to the authenticated owner. Lookups by ID go
//! through [`owned`], so an entry that belongs to another user is reported
//! exactly like one that does not exist.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use tracing::info;
use uuid::Uuid;

use super::{ServiceError, ServiceResult, is_blank};
use crate::{
    media::MediaStore,
    models::{EntryChanges, EntryRequest, JournalEntry},
    repositories::EntryStore,
};

const ENTRY_NOT_FOUND: &str = "Journal entry not found";

/// Earliest year a PostgreSQL `timestamptz` can hold in full (4713 BC)
const MIN_JOURNAL_YEAR: i32 = -4712;

/// Ownership guard: a scoped lookup that came back empty is `NotFound`
fn owned<T>(found: Option<T>) -> ServiceResult<T> {
    found.ok_or_else(|| ServiceError::NotFound(ENTRY_NOT_FOUND.to_string()))
}

/// Stable partition putting favourites first
fn favourites_first(mut entries: Vec<JournalEntry>) -> Vec<JournalEntry> {
    entries.sort_by_key(|entry| !entry.is_favourite);
    entries
}

fn date_from_millis(millis: i64) -> ServiceResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .filter(|date| date.year() >= MIN_JOURNAL_YEAR)
        .ok_or_else(|| ServiceError::Validation("Invalid journal date".to_string()))
}

/// Journal entry service
#[derive(Clone)]
pub struct EntryService {
    entries: Arc<dyn EntryStore>,
    media: MediaStore,
}

impl EntryService {
    pub fn new(entries: Arc<dyn EntryStore>, media: MediaStore) -> Self {
        Self { entries, media }
    }

    /// Validate an add/edit payload before anything touches the store
    fn validate(&self, request: EntryRequest) -> ServiceResult<EntryChanges> {
        let missing = || ServiceError::Validation("All fields are required".to_string());

        let title = request.title.filter(|t| !is_blank(t)).ok_or_else(missing)?;
        let notes = request.notes.filter(|n| !is_blank(n)).ok_or_else(missing)?;
        let tag = request.tag.ok_or_else(missing)?;
        let journal_date = request.journal_date.ok_or_else(missing)?;

        let millis = journal_date
            .as_millis()
            .ok_or_else(|| ServiceError::Validation("Invalid journal date".to_string()))?;

        let image_url = request
            .image_url
            .filter(|url| !is_blank(url))
            .unwrap_or_else(|| self.media.placeholder_url().to_string());

        Ok(EntryChanges {
            title,
            notes,
            tag,
            image_url,
            journal_date: date_from_millis(millis)?,
        })
    }

    pub async fn create(&self, owner: Uuid, request: EntryRequest) -> ServiceResult<JournalEntry> {
        let changes = self.validate(request)?;
        let entry = self.entries.insert(changes.into_new_entry(owner)).await?;

        info!("User {} added journal entry {}", owner, entry.id);
        Ok(entry)
    }

    /// All entries of the owner, favourites first
    pub async fn list(&self, owner: Uuid) -> ServiceResult<Vec<JournalEntry>> {
        let entries = self.entries.list_by_owner(owner).await?;
        Ok(favourites_first(entries))
    }

    /// Replace an entry's editable fields
    ///
    /// When the image reference changes, the previous upload is removed in
    /// the background.
    pub async fn update(
        &self,
        owner: Uuid,
        id: Uuid,
        request: EntryRequest,
    ) -> ServiceResult<JournalEntry> {
        let changes = self.validate(request)?;

        let current = owned(self.entries.find_owned(owner, id).await?)?;
        let updated = owned(self.entries.update_owned(owner, id, changes).await?)?;

        if current.image_url != updated.image_url {
            self.media.spawn_removal(current.image_url);
        }

        info!("User {} updated journal entry {}", owner, id);
        Ok(updated)
    }

    /// Delete an entry, then drop its image without waiting for the outcome
    pub async fn delete(&self, owner: Uuid, id: Uuid) -> ServiceResult<JournalEntry> {
        let removed = owned(self.entries.delete_owned(owner, id).await?)?;

        self.media.spawn_removal(removed.image_url.clone());

        info!("User {} deleted journal entry {}", owner, id);
        Ok(removed)
    }

    pub async fn set_favourite(
        &self,
        owner: Uuid,
        id: Uuid,
        is_favourite: bool,
    ) -> ServiceResult<JournalEntry> {
        owned(
            self.entries
                .set_favourite_owned(owner, id, is_favourite)
                .await?,
        )
    }

    /// Case-insensitive substring search over title, notes and tags
    pub async fn search(&self, owner: Uuid, query: &str) -> ServiceResult<Vec<JournalEntry>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ServiceError::Validation("Query is required".to_string()));
        }

        let entries = self.entries.search_owned(owner, query).await?;
        Ok(favourites_first(entries))
    }

    /// Entries whose journal date lies in `[start_ms, end_ms]`
    ///
    /// An inverted range is valid and simply matches nothing.
    pub async fn filter_by_date_range(
        &self,
        owner: Uuid,
        start_ms: i64,
        end_ms: i64,
    ) -> ServiceResult<Vec<JournalEntry>> {
        let start = date_from_millis(start_ms)?;
        let end = date_from_millis(end_ms)?;
        if start > end {
            return Ok(Vec::new());
        }

        let entries = self.entries.filter_by_date_owned(owner, start, end).await?;
        Ok(favourites_first(entries))
    }
}
