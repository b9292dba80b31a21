//! Journal entry repository for database operations
//!
//! Every query carries the owner's ID, so an entry belonging to somebody
//! else behaves exactly like a missing one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::StoreResult;
use crate::models::{EntryChanges, JournalEntry, NewEntry};

/// Persistence of journal entries, scoped by owner
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Insert a new entry (not favourite, created now)
    async fn insert(&self, entry: NewEntry) -> StoreResult<JournalEntry>;

    /// All entries of an owner in the store's natural order
    async fn list_by_owner(&self, owner: Uuid) -> StoreResult<Vec<JournalEntry>>;

    async fn find_owned(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<JournalEntry>>;

    /// Replace the editable fields; `None` when the owner has no such entry
    async fn update_owned(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: EntryChanges,
    ) -> StoreResult<Option<JournalEntry>>;

    async fn set_favourite_owned(
        &self,
        owner: Uuid,
        id: Uuid,
        is_favourite: bool,
    ) -> StoreResult<Option<JournalEntry>>;

    /// Remove an entry and hand back the removed record
    async fn delete_owned(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<JournalEntry>>;

    /// Entries whose title, notes or any tag contains `query`, ignoring case
    async fn search_owned(&self, owner: Uuid, query: &str) -> StoreResult<Vec<JournalEntry>>;

    /// Entries whose journal date lies in `[start, end]`
    async fn filter_by_date_owned(
        &self,
        owner: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<JournalEntry>>;
}

/// PostgreSQL journal entry repository
#[derive(Clone)]
pub struct PgEntryRepository {
    pool: PgPool,
}

impl PgEntryRepository {
    /// Create a new journal entry repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntryStore for PgEntryRepository {
    async fn insert(&self, entry: NewEntry) -> StoreResult<JournalEntry> {
        let entry = sqlx::query_as::<_, JournalEntry>(
            r#"
            INSERT INTO journal_entries (id, user_id, title, notes, tag, image_url, journal_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, title, notes, tag, is_favourite, user_id, created_on, image_url, journal_date
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.user_id)
        .bind(&entry.title)
        .bind(&entry.notes)
        .bind(&entry.tag)
        .bind(&entry.image_url)
        .bind(entry.journal_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn list_by_owner(&self, owner: Uuid) -> StoreResult<Vec<JournalEntry>> {
        let entries = sqlx::query_as::<_, JournalEntry>(
            r#"
            SELECT id, title, notes, tag, is_favourite, user_id, created_on, image_url, journal_date
            FROM journal_entries
            WHERE user_id = $1
            ORDER BY created_on ASC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn find_owned(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<JournalEntry>> {
        let entry = sqlx::query_as::<_, JournalEntry>(
            r#"
            SELECT id, title, notes, tag, is_favourite, user_id, created_on, image_url, journal_date
            FROM journal_entries
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn update_owned(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: EntryChanges,
    ) -> StoreResult<Option<JournalEntry>> {
        let entry = sqlx::query_as::<_, JournalEntry>(
            r#"
            UPDATE journal_entries
            SET title = $3, notes = $4, tag = $5, image_url = $6, journal_date = $7
            WHERE id = $1 AND user_id = $2
            RETURNING id, title, notes, tag, is_favourite, user_id, created_on, image_url, journal_date
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(&changes.title)
        .bind(&changes.notes)
        .bind(&changes.tag)
        .bind(&changes.image_url)
        .bind(changes.journal_date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn set_favourite_owned(
        &self,
        owner: Uuid,
        id: Uuid,
        is_favourite: bool,
    ) -> StoreResult<Option<JournalEntry>> {
        let entry = sqlx::query_as::<_, JournalEntry>(
            r#"
            UPDATE journal_entries
            SET is_favourite = $3
            WHERE id = $1 AND user_id = $2
            RETURNING id, title, notes, tag, is_favourite, user_id, created_on, image_url, journal_date
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(is_favourite)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn delete_owned(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<JournalEntry>> {
        let entry = sqlx::query_as::<_, JournalEntry>(
            r#"
            DELETE FROM journal_entries
            WHERE id = $1 AND user_id = $2
            RETURNING id, title, notes, tag, is_favourite, user_id, created_on, image_url, journal_date
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn search_owned(&self, owner: Uuid, query: &str) -> StoreResult<Vec<JournalEntry>> {
        // strpos instead of ILIKE so that % and _ in the query stay literal
        let entries = sqlx::query_as::<_, JournalEntry>(
            r#"
            SELECT id, title, notes, tag, is_favourite, user_id, created_on, image_url, journal_date
            FROM journal_entries
            WHERE user_id = $1
              AND (
                strpos(lower(title), lower($2)) > 0
                OR strpos(lower(notes), lower($2)) > 0
                OR EXISTS (
                    SELECT 1 FROM unnest(tag) AS t(value)
                    WHERE strpos(lower(t.value), lower($2)) > 0
                )
              )
            ORDER BY created_on ASC
            "#,
        )
        .bind(owner)
        .bind(query)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn filter_by_date_owned(
        &self,
        owner: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<JournalEntry>> {
        let entries = sqlx::query_as::<_, JournalEntry>(
            r#"
            SELECT id, title, notes, tag, is_favourite, user_id, created_on, image_url, journal_date
            FROM journal_entries
            WHERE user_id = $1 AND journal_date >= $2 AND journal_date <= $3
            ORDER BY created_on ASC
            "#,
        )
        .bind(owner)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
