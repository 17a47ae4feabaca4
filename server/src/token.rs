//! Signed bearer credentials.
//!
//! Tokens carry the voter id and role as lookup keys only. Verification
//! state and voting history are always re-read from the voter record at
//! request time, so a stale token cannot skip a re-check.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    models::Role,
};

const TOKEN_LIFETIME_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: i64,
}

pub fn issue(secret: &str, voter_id: &str, role: Role) -> Result<String, AppError> {
    let claims = Claims {
        sub: voter_id.to_string(),
        role: role.as_str().to_string(),
        exp: (Utc::now() + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(e.into()))
}

pub fn validate(secret: &str, token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized("Not authorized, token failed".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let token = issue("secret", "v1", Role::Voter).unwrap();
        let claims = validate("secret", &token).unwrap();

        assert_eq!(claims.sub, "v1");
        assert_eq!(claims.role, "voter");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue("secret", "v1", Role::Admin).unwrap();
        assert!(validate("other", &token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(validate("secret", "not-a-token").is_err());
        assert!(validate("secret", "").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = Claims {
            sub: "v1".into(),
            role: "voter".into(),
            exp: (Utc::now() - Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        assert!(validate("secret", &token).is_err());
    }
}
