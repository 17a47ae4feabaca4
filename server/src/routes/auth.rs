//! Registration, OTP confirmation and login.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{
    database,
    error::AppError,
    models::{Role, Voter},
    state::AppState,
    token, utils,
};

use super::{TokenResponse, UserSummary};

const OTP_LIFETIME_MINUTES: i64 = 10;
const BCRYPT_COST: u32 = 10;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    name: String,
    email: String,
    phone_number: String,
    password: String,
    date_of_birth: String,
    face_image: String,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), AppError> {
    if payload.name.trim().is_empty()
        || payload.email.is_empty()
        || payload.phone_number.is_empty()
        || payload.password.is_empty()
        || payload.date_of_birth.is_empty()
        || payload.face_image.is_empty()
    {
        return Err(AppError::Validation("All fields are required".into()));
    }

    if !utils::valid_phone_number(&payload.phone_number) {
        return Err(AppError::Validation(
            "Please enter a valid 10-digit Indian phone number".into(),
        ));
    }

    if !utils::valid_email(&payload.email) {
        return Err(AppError::Validation("Please enter a valid email".into()));
    }

    let date_of_birth = payload
        .date_of_birth
        .parse()
        .map_err(|_| AppError::Validation("Please enter a valid date of birth".into()))?;

    if utils::age_on(date_of_birth, Utc::now().date_naive()) < 18 {
        return Err(AppError::Validation(
            "You must be at least 18 years old to register".into(),
        ));
    }

    let mut conn = state.redis_connection.clone();

    if database::find_voter_by_email(&mut conn, &payload.email)
        .await?
        .is_some()
    {
        return Err(AppError::Validation(
            "User with this email already exists".into(),
        ));
    }

    // The face service extracts the descriptor; a failure here rejects the
    // registration outright.
    let face_encoding = state.face.encode(&payload.face_image).await?;

    let password_hash = bcrypt::hash(&payload.password, BCRYPT_COST)
        .map_err(|e| AppError::Internal(e.into()))?;

    let otp = utils::generate_otp();

    let voter = Voter {
        id: Uuid::new_v4().to_string(),
        name: payload.name.trim().to_string(),
        email: payload.email.clone(),
        phone_number: payload.phone_number.clone(),
        password_hash,
        date_of_birth,
        face_encoding,
        role: Role::Voter,
        is_verified: false,
        otp: Some(otp.clone()),
        otp_expiry: Some(Utc::now() + Duration::minutes(OTP_LIFETIME_MINUTES)),
        voted_for: None,
        voted_party: None,
        created_at: Utc::now(),
    };

    database::create_voter(&mut conn, &voter).await?;

    state.mailer.send_otp(&voter.email, &otp).await?;

    let token = token::issue(&state.config.jwt_secret, &voter.id, voter.role)?;

    info!(voter = %voter.id, "registered");

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            message: "Registration successful! Please verify your email with the OTP sent.".into(),
            token,
            user: UserSummary::of(&voter),
        }),
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    user_id: String,
    otp: String,
}

pub async fn verify_otp(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VerifyOtpRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let mut conn = state.redis_connection.clone();

    let voter = database::load_voter(&mut conn, &payload.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if let Some(expiry) = voter.otp_expiry {
        if expiry < Utc::now() {
            return Err(AppError::Validation(
                "OTP has expired. Please request a new one.".into(),
            ));
        }
    }

    match &voter.otp {
        Some(stored) if *stored == payload.otp => {}
        _ => {
            return Err(AppError::Validation(
                "Invalid OTP. Please try again.".into(),
            ));
        }
    }

    database::mark_verified(&mut conn, &voter.id).await?;

    let token = token::issue(&state.config.jwt_secret, &voter.id, voter.role)?;

    info!(voter = %voter.id, "email verified");

    Ok(Json(TokenResponse {
        message: "Email verified successfully".into(),
        token,
        user: UserSummary {
            is_verified: true,
            ..UserSummary::of(&voter)
        },
    }))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let mut conn = state.redis_connection.clone();

    let voter = authenticate(&mut conn, &payload).await?;

    let token = token::issue(&state.config.jwt_secret, &voter.id, voter.role)?;

    info!(voter = %voter.id, "logged in");

    Ok(Json(TokenResponse {
        message: "Login successful".into(),
        token,
        user: UserSummary::of(&voter),
    }))
}

pub async fn admin_login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let mut conn = state.redis_connection.clone();

    let voter = database::find_voter_by_email(&mut conn, &payload.email)
        .await?
        .filter(|v| v.role == Role::Admin)
        .ok_or_else(|| {
            AppError::Unauthorized("Invalid credentials or unauthorized access".into())
        })?;

    verify_password(&payload.password, &voter)?;

    let token = token::issue(&state.config.jwt_secret, &voter.id, voter.role)?;

    info!(admin = %voter.id, "admin logged in");

    Ok(Json(TokenResponse {
        message: "Login successful".into(),
        token,
        user: UserSummary::of(&voter),
    }))
}

async fn authenticate(
    conn: &mut redis::aio::ConnectionManager,
    payload: &LoginRequest,
) -> Result<Voter, AppError> {
    let voter = database::find_voter_by_email(conn, &payload.email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".into()))?;

    verify_password(&payload.password, &voter)?;

    Ok(voter)
}

fn verify_password(password: &str, voter: &Voter) -> Result<(), AppError> {
    let matches = bcrypt::verify(password, &voter.password_hash)
        .map_err(|e| AppError::Internal(e.into()))?;

    if !matches {
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    Ok(())
}
