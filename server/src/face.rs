//! Client for the external face-matching service.
//!
//! The service owns encoding and comparison; we only turn its distance
//! score into a decision. Every transport failure is a verification
//! failure: a vote is never allowed through because the matcher was
//! unreachable.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Euclidean distance below which two face descriptors are the same
/// person. Standard threshold for 128-d descriptors.
pub const FACE_MATCH_THRESHOLD: f64 = 0.6;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct FaceClient {
    http: Client,
    base_url: String,
}

#[derive(Debug)]
pub struct FaceMatch {
    pub is_match: bool,
    pub distance: Option<f64>,
}

#[derive(Serialize)]
struct EncodeRequest<'a> {
    image: &'a str,
}

#[derive(Deserialize)]
struct EncodeResponse {
    encoding: Option<Vec<f64>>,
    error: Option<String>,
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    encoding: &'a [f64],
    image: &'a str,
}

#[derive(Deserialize)]
struct VerifyResponse {
    distance: Option<f64>,
    reason: Option<String>,
}

pub fn is_match(distance: f64) -> bool {
    distance < FACE_MATCH_THRESHOLD
}

impl FaceClient {
    pub fn new(base_url: &str) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("HTTP client misconfigured!");

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Extracts the descriptor for a registration image. A clean "no face
    /// in image" answer is the caller's fault; anything else means the
    /// service is down.
    pub async fn encode(&self, image: &str) -> Result<Vec<f64>, AppError> {
        let response = self
            .http
            .post(format!("{}/encode-face", self.base_url))
            .json(&EncodeRequest { image })
            .send()
            .await
            .map_err(unavailable)?;

        let body: EncodeResponse = response.json().await.map_err(unavailable)?;

        match body.encoding {
            Some(encoding) => Ok(encoding),
            None => Err(AppError::Validation(format!(
                "Face encoding failed: {}",
                body.error.unwrap_or_else(|| "No face detected".into())
            ))),
        }
    }

    /// Compares a stored descriptor against a freshly captured image. The
    /// decision is ours: distance strictly below the threshold. A missing
    /// distance (no face found in the capture) is not a match.
    pub async fn matches(&self, encoding: &[f64], image: &str) -> Result<FaceMatch, AppError> {
        let response = self
            .http
            .post(format!("{}/verify-encoding", self.base_url))
            .json(&VerifyRequest { encoding, image })
            .send()
            .await
            .map_err(unavailable)?;

        let body: VerifyResponse = response.json().await.map_err(unavailable)?;

        if let Some(reason) = &body.reason {
            tracing::debug!("face service: {reason}");
        }

        Ok(FaceMatch {
            is_match: body.distance.map(is_match).unwrap_or(false),
            distance: body.distance,
        })
    }
}

fn unavailable(err: reqwest::Error) -> AppError {
    AppError::ServiceUnavailable(format!("Face verification unavailable: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_decision() {
        assert!(is_match(0.0));
        assert!(is_match(0.59));
        // The threshold itself is a rejection.
        assert!(!is_match(0.6));
        assert!(!is_match(1.4));
    }
}
