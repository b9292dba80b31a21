//! Account registration, login and token verification

use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{ServiceError, ServiceResult, is_blank};
use crate::{
    jwt::JwtService,
    models::{NewUser, UserProfile, UserSummary},
    repositories::CredentialStore,
};

/// A freshly issued token together with the public profile
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub access_token: String,
    pub user: UserSummary,
}

/// Authentication gateway
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn CredentialStore>,
    jwt: JwtService,
}

impl AuthService {
    pub fn new(users: Arc<dyn CredentialStore>, jwt: JwtService) -> Self {
        Self { users, jwt }
    }

    /// Create an account and sign the new user in
    pub async fn register(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> ServiceResult<AuthSession> {
        if is_blank(full_name) || is_blank(email) || is_blank(password) {
            return Err(ServiceError::Validation(
                "All fields are required".to_string(),
            ));
        }

        info!("Registering account for {}", email);

        let password_hash = hash_password(password)?;
        let user = self
            .users
            .insert(NewUser {
                full_name: full_name.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await?;

        let access_token = self.issue_token(user.id)?;
        Ok(AuthSession {
            access_token,
            user: UserSummary::from(&user),
        })
    }

    /// Check credentials and issue a token
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<AuthSession> {
        if is_blank(email) || is_blank(password) {
            return Err(ServiceError::Validation(
                "Email and Password are required".to_string(),
            ));
        }

        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

        if !verify_password(&user.password_hash, password)? {
            warn!("Rejected login for {}", email);
            return Err(ServiceError::InvalidCredentials);
        }

        info!("User {} logged in", user.id);
        let access_token = self.issue_token(user.id)?;
        Ok(AuthSession {
            access_token,
            user: UserSummary::from(&user),
        })
    }

    /// Issue a signed token for a user
    pub fn issue_token(&self, user_id: Uuid) -> ServiceResult<String> {
        self.jwt.issue(user_id).map_err(|e| {
            error!("Failed to sign token: {}", e);
            ServiceError::Internal(format!("Failed to sign token: {}", e))
        })
    }

    /// Verify a bearer token and return the user ID it carries
    pub fn verify_token(&self, token: &str) -> ServiceResult<Uuid> {
        self.jwt.verify(token).map_err(|e| {
            info!("Rejected token: {}", e);
            ServiceError::Unauthorized
        })
    }

    /// Profile of the authenticated user
    pub async fn get_profile(&self, user_id: Uuid) -> ServiceResult<UserProfile> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(ServiceError::Unauthorized)?;

        Ok(UserProfile::from(&user))
    }
}

/// Hash a password with argon2 and a random salt
fn hash_password(password: &str) -> ServiceResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::Internal(format!("Failed to hash password: {}", e)))
}

/// Compare a password with a stored hash
fn verify_password(password_hash: &str, password: &str) -> ServiceResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| ServiceError::Internal(format!("Failed to parse password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
