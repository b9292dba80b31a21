//! Application state shared across handlers

use std::sync::Arc;

use chrono::Duration;

use crate::{
    config::AppConfig,
    jwt::JwtService,
    media::MediaStore,
    repositories::{CredentialStore, EntryStore},
    services::{AuthService, EntryService},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: AuthService,
    pub entries: EntryService,
    pub media: MediaStore,
}

impl AppState {
    /// Wire the services on top of the given stores
    pub fn new(
        config: AppConfig,
        users: Arc<dyn CredentialStore>,
        entries: Arc<dyn EntryStore>,
    ) -> Self {
        let jwt = JwtService::new(
            config.access_token_secret.as_bytes(),
            Duration::hours(config.token_ttl_hours),
        );
        let media = MediaStore::new(&config.upload_dir, &config.public_base_url);

        Self {
            auth: AuthService::new(users, jwt),
            entries: EntryService::new(entries, media.clone()),
            media,
            config: Arc::new(config),
        }
    }
}
