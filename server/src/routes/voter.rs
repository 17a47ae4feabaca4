//! Voter-facing routes: candidate listing and face-gated flows.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::{IntoResponse, Response}};
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::{AuthUser, VerifiedVoter},
    database,
    error::AppError,
    models::{Party, VerificationMethod},
    state::AppState,
    votes,
};

pub async fn candidates(
    State(state): State<Arc<AppState>>,
    VerifiedVoter(_): VerifiedVoter,
) -> Result<Json<Vec<Party>>, AppError> {
    let mut conn = state.redis_connection.clone();

    let mut parties = database::list_parties(&mut conn).await?;
    parties.retain(|p| p.is_active);

    Ok(Json(parties))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyFaceRequest {
    face_image: String,
}

/// Standalone face check against the registered encoding. The mismatch
/// response carries the distance so the client can show it.
pub async fn verify_face(
    State(state): State<Arc<AppState>>,
    AuthUser(voter): AuthUser,
    Json(payload): Json<VerifyFaceRequest>,
) -> Result<Response, AppError> {
    let outcome = state
        .face
        .matches(&voter.face_encoding, &payload.face_image)
        .await?;

    if !outcome.is_match {
        return Ok((
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "message": "Face does not match",
                "distance": outcome.distance,
            })),
        )
            .into_response());
    }

    Ok(Json(json!({
        "message": "Face verified successfully",
        "distance": outcome.distance,
    }))
    .into_response())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyAndVoteRequest {
    face_image: String,
    election_id: String,
    candidate_id: String,
}

/// Face check and cast in one request. The ballot is only written after
/// the match passes; a mismatch or an unreachable matcher leaves no trace
/// in the ledger.
pub async fn verify_and_vote(
    State(state): State<Arc<AppState>>,
    VerifiedVoter(voter): VerifiedVoter,
    Json(payload): Json<VerifyAndVoteRequest>,
) -> Result<Response, AppError> {
    let outcome = state
        .face
        .matches(&voter.face_encoding, &payload.face_image)
        .await?;

    if !outcome.is_match {
        return Ok((
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "message": "Face does not match",
                "distance": outcome.distance,
            })),
        )
            .into_response());
    }

    let mut conn = state.redis_connection.clone();

    votes::cast(
        &mut conn,
        &voter.id,
        &payload.election_id,
        &payload.candidate_id,
        VerificationMethod::Face,
    )
    .await?;

    Ok(Json(json!({
        "message": "Vote cast successfully",
        "distance": outcome.distance,
    }))
    .into_response())
}
