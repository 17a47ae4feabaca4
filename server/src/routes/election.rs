//! Election creation, listings and OTP-verified vote casting.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    auth::{AdminUser, AuthUser, VerifiedVoter},
    elections,
    error::AppError,
    models::{Election, Party, VerificationMethod},
    state::AppState,
    votes,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateElectionRequest {
    title: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    parties: Vec<String>,
}

#[derive(Serialize)]
pub struct CreateElectionResponse {
    message: String,
    election: Election,
}

pub async fn add(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
    Json(payload): Json<CreateElectionRequest>,
) -> Result<(StatusCode, Json<CreateElectionResponse>), AppError> {
    let mut conn = state.redis_connection.clone();

    let election = elections::create(
        &mut conn,
        &payload.title,
        payload.start_date,
        payload.end_date,
        payload.parties,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateElectionResponse {
            message: "Election created successfully".into(),
            election,
        }),
    ))
}

pub async fn live(
    State(state): State<Arc<AppState>>,
    AuthUser(_): AuthUser,
) -> Result<Json<Value>, AppError> {
    let mut conn = state.redis_connection.clone();
    let elections = elections::live(&mut conn, Utc::now()).await?;

    Ok(Json(json!({ "elections": elections })))
}

pub async fn previous(
    State(state): State<Arc<AppState>>,
    AuthUser(_): AuthUser,
) -> Result<Json<Value>, AppError> {
    let mut conn = state.redis_connection.clone();
    let elections = elections::previous(&mut conn, Utc::now()).await?;

    Ok(Json(json!({ "elections": elections })))
}

pub async fn active(
    State(state): State<Arc<AppState>>,
    AuthUser(_): AuthUser,
) -> Result<Json<Value>, AppError> {
    let mut conn = state.redis_connection.clone();
    let elections = elections::open(&mut conn, Utc::now()).await?;

    Ok(Json(json!({ "elections": elections })))
}

pub async fn parties(
    State(state): State<Arc<AppState>>,
    AuthUser(_): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<Party>>, AppError> {
    let mut conn = state.redis_connection.clone();
    let parties = elections::parties_of(&mut conn, &id).await?;

    Ok(Json(parties))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    election_id: String,
    party_id: String,
}

/// Casting for voters verified by OTP at registration time.
pub async fn vote(
    State(state): State<Arc<AppState>>,
    VerifiedVoter(voter): VerifiedVoter,
    Json(payload): Json<VoteRequest>,
) -> Result<Json<Value>, AppError> {
    let mut conn = state.redis_connection.clone();

    votes::cast(
        &mut conn,
        &voter.id,
        &payload.election_id,
        &payload.party_id,
        VerificationMethod::Otp,
    )
    .await?;

    Ok(Json(json!({ "message": "Vote cast successfully" })))
}
