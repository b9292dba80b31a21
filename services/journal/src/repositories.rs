//! Repositories for database operations
//!
//! Each store is a trait so the services can run against PostgreSQL in
//! production and against the in-memory implementations in tests or in the
//! `memory` storage mode.

use thiserror::Error;

pub mod entry;
pub mod memory;
pub mod user;

pub use entry::{EntryStore, PgEntryRepository};
pub use memory::{MemoryEntryRepository, MemoryUserRepository};
pub use user::{CredentialStore, PgUserRepository};

/// Errors raised by the stores
#[derive(Error, Debug)]
pub enum StoreError {
    /// The email is already registered (unique constraint)
    #[error("email already registered")]
    DuplicateEmail,

    /// Any other database failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Type alias for store results
pub type StoreResult<T> = Result<T, StoreError>;
