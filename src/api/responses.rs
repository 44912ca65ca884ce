//! API request and response structures

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{error::SessionError, state::SessionSnapshot};

/// Body of `POST /session`. Exactly one of the fields must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartRequest {
    pub minutes: Option<u64>,
    pub seconds: Option<u64>,
}

/// Body of `POST /session/scrub`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrubRequest {
    pub remaining_seconds: u64,
}

/// Response for every endpoint that touches the session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub session: Option<SessionSnapshot>,
}

impl SessionResponse {
    pub fn new(message: impl Into<String>, session: Option<SessionSnapshot>) -> Self {
        Self {
            message: message.into(),
            timestamp: Utc::now(),
            session,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MindfulMinutesResponse {
    pub total_minutes: u64,
}

/// Duration picker choices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetsResponse {
    pub presets: Vec<u64>,
    pub min: u64,
    pub max: u64,
    pub default: u64,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub uptime: String,
}

impl HealthResponse {
    pub fn ok(uptime: String) -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

/// Error returned by the handlers, rendered as JSON
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: message.into(),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        let status = match e {
            SessionError::NoSession => StatusCode::NOT_FOUND,
            SessionError::InvalidTransition { .. } => StatusCode::CONFLICT,
            SessionError::InvalidDuration { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.message,
            timestamp: Utc::now(),
        };
        (self.status, Json(body)).into_response()
    }
}
