//! Domain services: authentication and the journal entry lifecycle

use thiserror::Error;

use crate::{media::MediaError, repositories::StoreError};

pub mod auth;
pub mod entries;

pub use auth::{AuthService, AuthSession};
pub use entries::EntryService;

/// Domain error taxonomy shared by the services
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Missing or malformed input
    #[error("{0}")]
    Validation(String),

    /// Missing, invalid or expired token, or a token for a vanished user
    #[error("Unauthorized")]
    Unauthorized,

    /// Absent, or owned by someone else
    #[error("{0}")]
    NotFound(String),

    #[error("User already exists")]
    DuplicateUser,

    #[error("Invalid Credentials")]
    InvalidCredentials,

    #[error("{0}")]
    UnsupportedMediaType(String),

    /// Persistence or filesystem failure
    #[error("{0}")]
    Storage(String),

    /// Token signing or password hashing failure
    #[error("{0}")]
    Internal(String),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => ServiceError::DuplicateUser,
            StoreError::Database(e) => ServiceError::Storage(e.to_string()),
        }
    }
}

impl From<MediaError> for ServiceError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::UnsupportedMediaType(msg) => ServiceError::UnsupportedMediaType(msg),
            MediaError::Io(e) => ServiceError::Storage(e.to_string()),
        }
    }
}

/// Type alias for service results
pub type ServiceResult<T> = Result<T, ServiceError>;

/// True when a required text field is absent or blank
pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
