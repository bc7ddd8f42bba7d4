use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use chrono::{DateTime, SecondsFormat, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::users;

/// User data returned from repository (without sensitive password hash)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub email_confirmed: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            email_confirmed: model.email_confirmed,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Result of redeeming a confirmation token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Confirmed,
    UserNotFound,
    /// Wrong, expired or already used token.
    Rejected,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Inserts an unconfirmed user. The password must already be hashed.
    pub async fn create(
        &self,
        email: &str,
        password_hash: String,
        confirmation_token: &str,
        confirmation_expires_at: DateTime<Utc>,
    ) -> Result<User> {
        let now = Utc::now().to_rfc3339();

        let active_model = users::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash),
            email_confirmed: Set(false),
            confirmation_token: Set(Some(confirmation_token.to_string())),
            confirmation_expires_at: Set(Some(timestamp(confirmation_expires_at))),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        };

        let model = active_model
            .insert(&self.conn)
            .await
            .context("Failed to insert user")?;

        Ok(User::from(model))
    }

    /// Get user by email
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(User::from))
    }

    /// Get user by email together with the stored password hash
    pub async fn get_by_email_with_password(&self, email: &str) -> Result<Option<(User, String)>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(|u| {
            let password_hash = u.password_hash.clone();
            (User::from(u), password_hash)
        }))
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: &str) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(id.to_string())
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = users::Entity::delete_by_id(id.to_string())
            .exec(&self.conn)
            .await
            .context("Failed to delete user")?;

        Ok(result.rows_affected > 0)
    }

    /// Marks the user confirmed if `token` matches and has not expired.
    /// The token is cleared on success so it cannot be redeemed twice.
    pub async fn confirm_email(&self, id: &str, token: &str) -> Result<ConfirmOutcome> {
        let exists = users::Entity::find_by_id(id.to_string())
            .count(&self.conn)
            .await
            .context("Failed to query user for confirmation")?
            > 0;
        if !exists {
            return Ok(ConfirmOutcome::UserNotFound);
        }

        let now = timestamp(Utc::now());
        let result = users::Entity::update_many()
            .col_expr(users::Column::EmailConfirmed, Expr::value(true))
            .col_expr(
                users::Column::ConfirmationToken,
                Expr::value(Option::<String>::None),
            )
            .col_expr(
                users::Column::ConfirmationExpiresAt,
                Expr::value(Option::<String>::None),
            )
            .col_expr(users::Column::UpdatedAt, Expr::value(now.clone()))
            .filter(users::Column::Id.eq(id))
            .filter(users::Column::ConfirmationToken.eq(token))
            .filter(users::Column::ConfirmationExpiresAt.gt(now))
            .exec(&self.conn)
            .await
            .context("Failed to confirm user email")?;

        if result.rows_affected == 0 {
            return Ok(ConfirmOutcome::Rejected);
        }

        Ok(ConfirmOutcome::Confirmed)
    }
}

/// Fixed-width UTC timestamp, so stored values compare correctly as text.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Hash a password using Argon2id with the configured params.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    use rand::Rng;

    let salt_bytes: [u8; 16] = rand::rng().random();
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| anyhow::anyhow!("Failed to encode password salt: {e}"))?;

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Hashes on the blocking pool; Argon2 would otherwise stall the runtime.
pub async fn hash_password_blocking(password: &str, config: &SecurityConfig) -> Result<String> {
    let password = password.to_string();
    let config = config.clone();
    task::spawn_blocking(move || hash_password(&password, &config))
        .await
        .context("Password hashing task panicked")?
}

/// Checks `password` against a stored PHC-format hash on the blocking pool.
pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let password = password.to_string();
    let password_hash = password_hash.to_string();

    task::spawn_blocking(move || {
        let parsed_hash = PasswordHash::new(&password_hash)
            .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

        Ok::<bool, anyhow::Error>(
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok(),
        )
    })
    .await
    .context("Password verification task panicked")?
}

/// Generate a random one-time token (64 character hex string)
#[must_use]
pub fn generate_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        }
    }

    #[test]
    fn test_generate_token_is_hex() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_token());
    }

    #[tokio::test]
    async fn test_hash_and_verify_password() {
        let hash = hash_password_blocking("Secret1!", &fast_config())
            .await
            .unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Secret1!", &hash).await.unwrap());
        assert!(!verify_password("secret1!", &hash).await.unwrap());

        let again = hash_password_blocking("Secret1!", &fast_config())
            .await
            .unwrap();
        assert_ne!(hash, again, "each hash must carry a fresh salt");
        assert!(verify_password("Secret1!", &again).await.unwrap());
    }

    async fn repo_with_user(expires_at: DateTime<Utc>) -> (UserRepository, User) {
        let store = crate::db::Store::new("sqlite::memory:").await.unwrap();
        let repo = UserRepository::new(store.conn);
        let user = repo
            .create("a@example.com", "hash".to_string(), "abc123", expires_at)
            .await
            .unwrap();
        (repo, user)
    }

    #[tokio::test]
    async fn test_confirm_email_redeems_token_once() {
        let (repo, user) = repo_with_user(Utc::now() + chrono::Duration::hours(1)).await;

        assert_eq!(
            repo.confirm_email(&user.id, "abc124").await.unwrap(),
            ConfirmOutcome::Rejected
        );
        assert_eq!(
            repo.confirm_email("missing", "abc123").await.unwrap(),
            ConfirmOutcome::UserNotFound
        );
        assert_eq!(
            repo.confirm_email(&user.id, "abc123").await.unwrap(),
            ConfirmOutcome::Confirmed
        );
        assert!(repo.get_by_id(&user.id).await.unwrap().unwrap().email_confirmed);
        assert_eq!(
            repo.confirm_email(&user.id, "abc123").await.unwrap(),
            ConfirmOutcome::Rejected
        );
    }

    #[tokio::test]
    async fn test_confirm_email_rejects_expired_token() {
        let (repo, user) = repo_with_user(Utc::now() - chrono::Duration::minutes(1)).await;

        assert_eq!(
            repo.confirm_email(&user.id, "abc123").await.unwrap(),
            ConfirmOutcome::Rejected
        );
        assert!(!repo.get_by_id(&user.id).await.unwrap().unwrap().email_confirmed);
    }

    #[test]
    fn test_timestamps_sort_chronologically_as_text() {
        let earlier = Utc::now();
        let later = earlier + chrono::Duration::milliseconds(1);
        assert!(timestamp(earlier) < timestamp(later));
        assert_eq!(timestamp(earlier).len(), timestamp(later).len());
    }

    #[tokio::test]
    async fn test_verify_rejects_malformed_hash() {
        assert!(verify_password("Secret1!", "not-a-hash").await.is_err());
    }
}
