//! HS256 bearer tokens issued at login.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;

/// Tokens are valid for a fixed hour after issue.
pub const TOKEN_LIFETIME_MINUTES: i64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

/// Identity resolved from a valid bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct JwtIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
}

impl JwtIssuer {
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
        }
    }

    pub fn issue(&self, user_id: &str, email: &str) -> anyhow::Result<IssuedToken> {
        self.issue_at(user_id, email, Utc::now())
    }

    fn issue_at(
        &self,
        user_id: &str,
        email: &str,
        issued_at: DateTime<Utc>,
    ) -> anyhow::Result<IssuedToken> {
        let expires_at = issued_at + Duration::minutes(TOKEN_LIFETIME_MINUTES);
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to sign token: {e}"))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Checks signature, expiry, issuer and audience.
    pub fn verify(&self, token: &str) -> Result<AuthUser, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(AuthUser {
            id: data.claims.sub,
            email: data.claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> JwtIssuer {
        JwtIssuer::new(&JwtConfig::default())
    }

    #[test]
    fn test_issue_and_verify() {
        let jwt = issuer();
        let issued = jwt.issue("user-1", "a@example.com").unwrap();

        let user = jwt.verify(&issued.token).unwrap();
        assert_eq!(user.id, "user-1");
        assert_eq!(user.email, "a@example.com");
    }

    #[test]
    fn test_token_expires_after_an_hour() {
        let now = Utc::now();
        let issued = issuer().issue_at("user-1", "a@example.com", now).unwrap();
        assert_eq!(
            issued.expires_at.timestamp() - now.timestamp(),
            TOKEN_LIFETIME_MINUTES * 60
        );
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let jwt = issuer();
        let issued = jwt
            .issue_at("user-1", "a@example.com", Utc::now() - Duration::hours(3))
            .unwrap();
        assert!(jwt.verify(&issued.token).is_err());
    }

    #[test]
    fn test_wrong_secret_or_audience_is_rejected() {
        let jwt = issuer();
        let issued = jwt.issue("user-1", "a@example.com").unwrap();

        let other = JwtIssuer::new(&JwtConfig {
            secret: "another-secret-that-is-long-enough-0123456789".to_string(),
            ..JwtConfig::default()
        });
        assert!(other.verify(&issued.token).is_err());

        let other_audience = JwtIssuer::new(&JwtConfig {
            audience: "someone-else".to_string(),
            ..JwtConfig::default()
        });
        assert!(other_audience.verify(&issued.token).is_err());
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(issuer().verify("not.a.jwt").is_err());
    }
}
