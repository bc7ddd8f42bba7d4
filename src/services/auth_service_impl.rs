//! `SeaORM` implementation of the `AuthService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sea_orm::{DbErr, SqlErr};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::db::{ConfirmOutcome, Store};
use crate::db::repositories::user::{generate_token, hash_password_blocking, verify_password};
use crate::services::auth_service::{
    AuthError, AuthService, LoginResult, RegisterResult, UserInfo,
};
use crate::services::email::{Mailer, OutgoingEmail};
use crate::services::token::{AuthUser, JwtIssuer};

pub struct SeaOrmAuthService {
    store: Store,
    config: Arc<RwLock<Config>>,
    mailer: Arc<dyn Mailer>,
    tokens: JwtIssuer,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(
        store: Store,
        config: Arc<RwLock<Config>>,
        mailer: Arc<dyn Mailer>,
        tokens: JwtIssuer,
    ) -> Self {
        Self {
            store,
            config,
            mailer,
            tokens,
        }
    }

    fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    fn validate_email(email: &str) -> Result<(), AuthError> {
        if email.is_empty() {
            return Err(AuthError::Validation("Email is required".to_string()));
        }
        email
            .parse::<lettre::Address>()
            .map_err(|_| AuthError::Validation(format!("Invalid email address: {email}")))?;
        Ok(())
    }

    fn is_unique_violation(err: &anyhow::Error) -> bool {
        err.downcast_ref::<DbErr>()
            .and_then(DbErr::sql_err)
            .is_some_and(|e| matches!(e, SqlErr::UniqueConstraintViolation(_)))
    }

    fn confirmation_link(public_url: &str, user_id: &str, token: &str) -> String {
        format!(
            "{}/api/auth/confirm-email?user_id={}&token={}",
            public_url.trim_end_matches('/'),
            urlencoding::encode(user_id),
            urlencoding::encode(token)
        )
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, email: &str, password: &str) -> Result<RegisterResult, AuthError> {
        let email = Self::normalize_email(email);
        Self::validate_email(&email)?;

        let (security, public_url) = {
            let config = self.config.read().await;
            (config.security.clone(), config.server.public_url.clone())
        };

        let problems = security.password_policy.violations(password);
        if !problems.is_empty() {
            return Err(AuthError::Validation(problems.join("; ")));
        }

        if self.store.get_user_by_email(&email).await?.is_some() {
            return Err(AuthError::Conflict(format!(
                "Email {email} is already registered"
            )));
        }

        let password_hash = hash_password_blocking(password, &security).await?;
        let token = generate_token();
        let expires_at =
            Utc::now() + Duration::hours(i64::from(security.confirmation_token_hours));

        let user = match self
            .store
            .create_user(&email, password_hash, &token, expires_at)
            .await
        {
            Ok(user) => user,
            Err(e) if Self::is_unique_violation(&e) => {
                return Err(AuthError::Conflict(format!(
                    "Email {email} is already registered"
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let link = Self::confirmation_link(&public_url, &user.id, &token);
        let message = OutgoingEmail {
            to: user.email.clone(),
            subject: "Confirm your email".to_string(),
            body: format!("Please confirm your account by visiting this link: {link}"),
        };

        if let Err(e) = self.mailer.send(message).await {
            error!("Failed to send confirmation email to {}: {e:#}", user.email);
            if let Err(cleanup) = self.store.delete_user(&user.id).await {
                error!("Failed to roll back registration for {}: {cleanup:#}", user.id);
            }
            return Err(AuthError::Internal(
                "Failed to send confirmation email".to_string(),
            ));
        }

        info!("Registered user {} ({})", user.id, user.email);

        Ok(RegisterResult {
            message: "Registration successful. Please check your email to confirm your account."
                .to_string(),
            user_id: user.id,
        })
    }

    async fn confirm_email(&self, user_id: &str, token: &str) -> Result<(), AuthError> {
        if user_id.trim().is_empty() || token.trim().is_empty() {
            return Err(AuthError::Validation(
                "user_id and token are required".to_string(),
            ));
        }

        match self.store.confirm_user_email(user_id, token).await? {
            ConfirmOutcome::Confirmed => {
                info!("Email confirmed for user {user_id}");
                Ok(())
            }
            ConfirmOutcome::UserNotFound => Err(AuthError::UserNotFound),
            ConfirmOutcome::Rejected => {
                warn!("Rejected confirmation token for user {user_id}");
                Err(AuthError::Validation("Error confirming email".to_string()))
            }
        }
    }

    async fn login(&self, email: &str, password: &str) -> Result<LoginResult, AuthError> {
        let email = Self::normalize_email(email);

        let Some((user, password_hash)) = self.store.get_user_credentials(&email).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &password_hash).await? {
            return Err(AuthError::InvalidCredentials);
        }

        if !user.email_confirmed {
            return Err(AuthError::EmailNotConfirmed);
        }

        let issued = self.tokens.issue(&user.id, &user.email)?;

        Ok(LoginResult {
            token: issued.token,
            token_type: "Bearer".to_string(),
            expires_at: issued.expires_at,
        })
    }

    fn verify_token(&self, token: &str) -> Result<AuthUser, AuthError> {
        self.tokens
            .verify(token)
            .map_err(|_| AuthError::InvalidToken)
    }

    async fn current_user(&self, user_id: &str) -> Result<UserInfo, AuthError> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(UserInfo {
            id: user.id,
            email: user.email,
            email_confirmed: user.email_confirmed,
            created_at: user.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(
            SeaOrmAuthService::normalize_email("  Alice@Example.COM "),
            "alice@example.com"
        );
    }

    #[test]
    fn test_validate_email() {
        assert!(SeaOrmAuthService::validate_email("alice@example.com").is_ok());
        assert!(SeaOrmAuthService::validate_email("").is_err());
        assert!(SeaOrmAuthService::validate_email("alice").is_err());
        assert!(SeaOrmAuthService::validate_email("alice@").is_err());
    }

    #[test]
    fn test_confirmation_link() {
        let link = SeaOrmAuthService::confirmation_link("http://localhost:5080/", "abc", "f00d");
        assert_eq!(
            link,
            "http://localhost:5080/api/auth/confirm-email?user_id=abc&token=f00d"
        );
    }
}
