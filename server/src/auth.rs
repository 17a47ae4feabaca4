//! Request guards.
//!
//! The bearer token only identifies the voter; role and verification state
//! are re-read from the store on every request, so revoking or
//! un-verifying an account takes effect immediately regardless of token
//! age.

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};

use crate::{
    database,
    error::AppError,
    models::{Role, Voter},
    state::AppState,
    token,
};

/// Any authenticated account, freshly loaded.
pub struct AuthUser(pub Voter);

/// An authenticated admin.
pub struct AdminUser(pub Voter);

/// An authenticated voter who has completed OTP verification.
pub struct VerifiedVoter(pub Voter);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(no_token)?;

        let token = header.strip_prefix("Bearer ").ok_or_else(no_token)?;
        let claims = token::validate(&state.config.jwt_secret, token)?;

        let mut conn = state.redis_connection.clone();
        let voter = database::load_voter(&mut conn, &claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Not authorized, user not found".into()))?;

        Ok(AuthUser(voter))
    }
}

impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(voter) = AuthUser::from_request_parts(parts, state).await?;

        if voter.role != Role::Admin {
            return Err(AppError::Forbidden("Not authorized as admin".into()));
        }

        Ok(AdminUser(voter))
    }
}

impl FromRequestParts<Arc<AppState>> for VerifiedVoter {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(voter) = AuthUser::from_request_parts(parts, state).await?;

        if voter.role != Role::Voter || !voter.is_verified {
            return Err(AppError::Forbidden(
                "Not authorized as verified voter".into(),
            ));
        }

        Ok(VerifiedVoter(voter))
    }
}

fn no_token() -> AppError {
    AppError::Unauthorized("Not authorized, no token provided".into())
}
