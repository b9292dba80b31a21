//! In-memory stores
//!
//! Used by the `memory` storage backend and by the test suites. Each store
//! keeps its records behind a single lock, so a check and the write that
//! depends on it happen under the same guard.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CredentialStore, EntryStore, StoreError, StoreResult};
use crate::models::{EntryChanges, JournalEntry, NewEntry, NewUser, User};

/// In-memory user store keyed by ID
#[derive(Debug, Clone, Default)]
pub struct MemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryUserRepository {
    async fn insert(&self, new_user: NewUser) -> StoreResult<User> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.email == new_user.email) {
            return Err(StoreError::DuplicateEmail);
        }

        let user = User {
            id: Uuid::new_v4(),
            full_name: new_user.full_name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            created_on: Utc::now(),
        };
        users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }
}

/// In-memory journal entry store, kept in insertion order
#[derive(Debug, Clone, Default)]
pub struct MemoryEntryRepository {
    entries: Arc<RwLock<Vec<JournalEntry>>>,
}

impl MemoryEntryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn select<F>(&self, owner: Uuid, predicate: F) -> Vec<JournalEntry>
    where
        F: Fn(&JournalEntry) -> bool,
    {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|e| e.user_id == owner && predicate(e))
            .cloned()
            .collect()
    }

    async fn modify_owned<F>(&self, owner: Uuid, id: Uuid, apply: F) -> Option<JournalEntry>
    where
        F: FnOnce(&mut JournalEntry),
    {
        let mut entries = self.entries.write().await;
        let entry = entries
            .iter_mut()
            .find(|e| e.id == id && e.user_id == owner)?;
        apply(entry);
        Some(entry.clone())
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

#[async_trait]
impl EntryStore for MemoryEntryRepository {
    async fn insert(&self, entry: NewEntry) -> StoreResult<JournalEntry> {
        let entry = JournalEntry {
            id: Uuid::new_v4(),
            title: entry.title,
            notes: entry.notes,
            tag: entry.tag,
            is_favourite: false,
            user_id: entry.user_id,
            created_on: Utc::now(),
            image_url: entry.image_url,
            journal_date: entry.journal_date,
        };

        self.entries.write().await.push(entry.clone());
        Ok(entry)
    }

    async fn list_by_owner(&self, owner: Uuid) -> StoreResult<Vec<JournalEntry>> {
        Ok(self.select(owner, |_| true).await)
    }

    async fn find_owned(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<JournalEntry>> {
        Ok(self.select(owner, |e| e.id == id).await.into_iter().next())
    }

    async fn update_owned(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: EntryChanges,
    ) -> StoreResult<Option<JournalEntry>> {
        Ok(self
            .modify_owned(owner, id, |entry| {
                entry.title = changes.title;
                entry.notes = changes.notes;
                entry.tag = changes.tag;
                entry.image_url = changes.image_url;
                entry.journal_date = changes.journal_date;
            })
            .await)
    }

    async fn set_favourite_owned(
        &self,
        owner: Uuid,
        id: Uuid,
        is_favourite: bool,
    ) -> StoreResult<Option<JournalEntry>> {
        Ok(self
            .modify_owned(owner, id, |entry| entry.is_favourite = is_favourite)
            .await)
    }

    async fn delete_owned(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<JournalEntry>> {
        let mut entries = self.entries.write().await;
        let position = entries
            .iter()
            .position(|e| e.id == id && e.user_id == owner);
        Ok(position.map(|index| entries.remove(index)))
    }

    async fn search_owned(&self, owner: Uuid, query: &str) -> StoreResult<Vec<JournalEntry>> {
        let needle = query.to_lowercase();
        Ok(self
            .select(owner, |e| {
                contains_ignore_case(&e.title, &needle)
                    || contains_ignore_case(&e.notes, &needle)
                    || e.tag.iter().any(|t| contains_ignore_case(t, &needle))
            })
            .await)
    }

    async fn filter_by_date_owned(
        &self,
        owner: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<JournalEntry>> {
        Ok(self
            .select(owner, |e| e.journal_date >= start && e.journal_date <= end)
            .await)
    }
}
