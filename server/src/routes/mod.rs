//! HTTP surface. Handlers translate between the JSON API and the core
//! modules; every outcome is an `AppError` mapped to a status code.

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};
use serde::Serialize;

use crate::{models::Voter, state::AppState};

pub mod admin;
pub mod auth;
pub mod election;
pub mod voter;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/verify-otp", post(auth::verify_otp))
        .route("/auth/login", post(auth::login))
        .route("/auth/admin/login", post(auth::admin_login))
        .route("/election/add", post(election::add))
        .route("/election/live", get(election::live))
        .route("/election/previous", get(election::previous))
        .route("/election/active", get(election::active))
        .route("/election/{id}/parties", get(election::parties))
        .route("/election/vote", post(election::vote))
        .route("/voter/candidates", get(voter::candidates))
        .route("/voter/verify-face", post(voter::verify_face))
        .route("/voter/verify-and-vote", post(voter::verify_and_vote))
        .route("/admin/voters", get(admin::voters))
        .route(
            "/admin/candidates",
            get(admin::candidates)
                .post(admin::add_candidate)
                .delete(admin::remove_all_candidates),
        )
        .route("/admin/candidates/{id}", delete(admin::remove_candidate))
        .route("/admin/reset-votes", post(admin::reset_votes))
        .route("/admin/results", get(admin::results))
        .with_state(state)
}

/// What a voter is allowed to see about themselves in auth responses.
/// Password hashes, codes and biometrics never leave the store.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub is_verified: bool,
}

impl UserSummary {
    pub fn of(voter: &Voter) -> Self {
        Self {
            id: voter.id.clone(),
            name: voter.name.clone(),
            email: voter.email.clone(),
            role: voter.role.as_str().to_string(),
            is_verified: voter.is_verified,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub message: String,
    pub token: String,
    pub user: UserSummary,
}
