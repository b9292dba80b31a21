//! Domain records and request/response payloads

pub mod entry;
pub mod user;

pub use entry::{EntryChanges, EntryRequest, EpochMillis, FavouriteRequest, JournalEntry, NewEntry};
pub use user::{CreateAccountRequest, LoginRequest, NewUser, User, UserProfile, UserSummary};
