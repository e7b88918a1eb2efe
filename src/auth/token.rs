use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::user::Role;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
}

impl JwtConfig {
    /// Reads `JWT_SECRET` (required) and `JWT_EXPIRATION_HOURS`
    /// (default 168, i.e. 7 days).
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").expect("JWT_SECRET must be set");
        let expiration_hours = std::env::var("JWT_EXPIRATION_HOURS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(168);
        Self {
            secret,
            expiration_hours,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Access token has expired")]
    Expired,
    #[error("Invalid access token")]
    Invalid,
}

pub fn issue(config: &JwtConfig, user_id: Uuid, role: Role) -> Result<String, TokenError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(config.expiration_hours)).timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|_| TokenError::Invalid)
}

pub fn verify(config: &JwtConfig, token: &str) -> Result<Claims, TokenError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-at-least-32-bytes-long!!".to_string(),
            expiration_hours: 1,
        }
    }

    #[test]
    fn issued_token_verifies() {
        let cfg = config();
        let user_id = Uuid::new_v4();

        let token = issue(&cfg, user_id, Role::Customer).expect("issue failed");
        let claims = verify(&cfg, &token).expect("verify failed");

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, "customer");
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = issue(&config(), Uuid::new_v4(), Role::Admin).unwrap();
        let other = JwtConfig {
            secret: "a-completely-different-32-byte-secret".to_string(),
            expiration_hours: 1,
        };

        assert!(matches!(verify(&other, &token), Err(TokenError::Invalid)));
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let cfg = JwtConfig {
            expiration_hours: -2,
            ..config()
        };
        let token = issue(&cfg, Uuid::new_v4(), Role::Customer).unwrap();

        assert!(matches!(verify(&cfg, &token), Err(TokenError::Expired)));
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(matches!(
            verify(&config(), "not-a-token"),
            Err(TokenError::Invalid)
        ));
    }
}
