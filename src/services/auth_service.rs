//! Domain service for registration, email confirmation and login.
//!
//! Accounts must confirm their email address before a bearer token is issued.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::services::token::AuthUser;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email not confirmed")]
    EmailNotConfirmed,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// User info DTO for responses.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub email_confirmed: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterResult {
    pub message: String,
    pub user_id: String,
}

/// Login result containing the signed bearer token.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates an unconfirmed account and mails a confirmation link.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] for a malformed email or a weak password,
    /// [`AuthError::Conflict`] if the email is taken, and [`AuthError::Internal`]
    /// if the confirmation email could not be sent (the account is not kept).
    async fn register(&self, email: &str, password: &str) -> Result<RegisterResult, AuthError>;

    /// Redeems a confirmation token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] for a wrong, expired or reused token.
    async fn confirm_email(&self, user_id: &str, token: &str) -> Result<(), AuthError>;

    /// Verifies credentials and issues a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] or [`AuthError::EmailNotConfirmed`].
    async fn login(&self, email: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Resolves a bearer token to the user it was issued for.
    fn verify_token(&self, token: &str) -> Result<AuthUser, AuthError>;

    /// Gets information for a specific user.
    async fn current_user(&self, user_id: &str) -> Result<UserInfo, AuthError>;
}
