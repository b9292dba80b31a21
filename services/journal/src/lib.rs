//! Travel journal service
//!
//! Account registration and login with bearer tokens, per-user journal
//! entries with search and date filtering, and local image attachments.

pub mod config;
pub mod error;
pub mod jwt;
pub mod media;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
