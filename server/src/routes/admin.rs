//! Party lifecycle and reporting, admin only.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    auth::AdminUser,
    database,
    error::AppError,
    models::{Party, Voter},
    state::AppState,
    votes,
};

/// Voter overview for the admin dashboard. Credentials, codes and
/// biometrics are not part of it.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterOverview {
    id: String,
    name: String,
    email: String,
    phone_number: String,
    role: String,
    is_verified: bool,
    voted_party: Option<String>,
}

impl VoterOverview {
    fn of(voter: &Voter) -> Self {
        Self {
            id: voter.id.clone(),
            name: voter.name.clone(),
            email: voter.email.clone(),
            phone_number: voter.phone_number.clone(),
            role: voter.role.as_str().to_string(),
            is_verified: voter.is_verified,
            voted_party: voter.voted_party.clone(),
        }
    }
}

pub async fn voters(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
) -> Result<Json<Vec<VoterOverview>>, AppError> {
    let mut conn = state.redis_connection.clone();

    let voters = database::list_voters(&mut conn).await?;

    Ok(Json(voters.iter().map(VoterOverview::of).collect()))
}

pub async fn candidates(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
) -> Result<Json<Vec<Party>>, AppError> {
    let mut conn = state.redis_connection.clone();

    let mut parties = database::list_parties(&mut conn).await?;
    parties.retain(|p| p.is_active);

    Ok(Json(parties))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCandidateRequest {
    name: String,
    party_name: String,
    party_symbol: String,
}

pub async fn add_candidate(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
    Json(payload): Json<AddCandidateRequest>,
) -> Result<(StatusCode, Json<Party>), AppError> {
    if payload.name.trim().is_empty()
        || payload.party_name.trim().is_empty()
        || payload.party_symbol.is_empty()
    {
        return Err(AppError::Validation("All fields are required".into()));
    }

    let party = Party {
        id: Uuid::new_v4().to_string(),
        name: payload.name.trim().to_string(),
        party_name: payload.party_name.trim().to_string(),
        party_symbol: payload.party_symbol,
        votes: 0,
        is_active: true,
    };

    let mut conn = state.redis_connection.clone();
    database::create_party(&mut conn, &party).await?;

    Ok((StatusCode::CREATED, Json(party)))
}

pub async fn remove_candidate(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let mut conn = state.redis_connection.clone();

    if !database::deactivate_party(&mut conn, &id).await? {
        return Err(AppError::NotFound("Candidate not found".into()));
    }

    Ok(Json(json!({ "message": "Candidate deleted successfully" })))
}

pub async fn remove_all_candidates(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
) -> Result<Json<Value>, AppError> {
    let mut conn = state.redis_connection.clone();

    database::deactivate_all_parties(&mut conn).await?;

    Ok(Json(json!({ "message": "All candidates deleted successfully" })))
}

pub async fn reset_votes(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
) -> Result<Json<Value>, AppError> {
    let mut conn = state.redis_connection.clone();

    let updated = votes::reset_tallies(&mut conn).await?;

    Ok(Json(json!({
        "message": "All vote counts reset to zero",
        "candidatesUpdated": updated,
    })))
}

pub async fn results(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
) -> Result<Json<Vec<Party>>, AppError> {
    let mut conn = state.redis_connection.clone();

    let results = votes::results(&mut conn).await?;

    Ok(Json(results))
}
