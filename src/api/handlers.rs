//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{extract::State, response::Json};
use tracing::{info, warn};

use crate::state::AppState;
use super::responses::{
    ApiError, HealthResponse, MindfulMinutesResponse, PresetsResponse, ScrubRequest,
    SessionResponse, StartRequest,
};

/// Quick-pick durations offered by the picker, in minutes
pub const PRESET_MINUTES: [u64; 3] = [10, 30, 60];
pub const MIN_MINUTES: u64 = 1;
pub const MAX_MINUTES: u64 = 90;
pub const DEFAULT_MINUTES: u64 = 10;

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Resolve a start request into a duration in seconds
pub fn requested_duration(request: &StartRequest) -> Result<u64, ApiError> {
    match (request.minutes, request.seconds) {
        (Some(minutes), None) => {
            if (MIN_MINUTES..=MAX_MINUTES).contains(&minutes) {
                Ok(minutes * 60)
            } else {
                Err(ApiError::unprocessable(format!(
                    "minutes must be between {} and {}, got {}",
                    MIN_MINUTES, MAX_MINUTES, minutes
                )))
            }
        }
        (None, Some(seconds)) => Ok(seconds),
        _ => Err(ApiError::unprocessable(
            "exactly one of `minutes` or `seconds` is required",
        )),
    }
}

/// Handle POST /session - Start a new session
pub async fn start_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartRequest>,
) -> ApiResult<SessionResponse> {
    let duration = requested_duration(&request).inspect_err(|e| {
        warn!("Rejected start request: {}", e.message);
    })?;

    let snapshot = state.start(duration)?;
    info!("Start endpoint called - {}s session running", duration);
    Ok(Json(SessionResponse::new("Session started", Some(snapshot))))
}

/// Handle POST /session/pause
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> ApiResult<SessionResponse> {
    let snapshot = state.pause()?;
    info!("Pause endpoint called - {} left", snapshot.display_time);
    Ok(Json(SessionResponse::new("Session paused", Some(snapshot))))
}

/// Handle POST /session/resume
pub async fn resume_handler(State(state): State<Arc<AppState>>) -> ApiResult<SessionResponse> {
    let snapshot = state.resume()?;
    info!("Resume endpoint called - {} left", snapshot.display_time);
    Ok(Json(SessionResponse::new("Session resumed", Some(snapshot))))
}

/// Handle POST /session/scrub - Jump to a remaining time
pub async fn scrub_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ScrubRequest>,
) -> ApiResult<SessionResponse> {
    let snapshot = state.scrub(request.remaining_seconds)?;
    Ok(Json(SessionResponse::new("Session scrubbed", Some(snapshot))))
}

/// Handle DELETE /session - Cancel and discard the session
pub async fn cancel_handler(State(state): State<Arc<AppState>>) -> ApiResult<SessionResponse> {
    state.cancel()?;
    info!("Cancel endpoint called - session discarded");
    Ok(Json(SessionResponse::new("Session cancelled", None)))
}

/// Handle GET /session - Return the current session
pub async fn session_handler(State(state): State<Arc<AppState>>) -> Json<SessionResponse> {
    let snapshot = state.snapshot();
    let message = if snapshot.is_some() { "Active session" } else { "No active session" };
    Json(SessionResponse::new(message, snapshot))
}

/// Handle GET /mindful-minutes
pub async fn mindful_minutes_handler(State(state): State<Arc<AppState>>) -> Json<MindfulMinutesResponse> {
    Json(MindfulMinutesResponse {
        total_minutes: state.total_minutes(),
    })
}

/// Handle GET /presets
pub async fn presets_handler() -> Json<PresetsResponse> {
    Json(PresetsResponse {
        presets: PRESET_MINUTES.to_vec(),
        min: MIN_MINUTES,
        max: MAX_MINUTES,
        default: DEFAULT_MINUTES,
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse::ok(state.get_uptime()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn request(minutes: Option<u64>, seconds: Option<u64>) -> StartRequest {
        StartRequest { minutes, seconds }
    }

    #[test]
    fn minutes_are_bounded_by_picker_range() {
        assert_eq!(requested_duration(&request(Some(1), None)).unwrap(), 60);
        assert_eq!(requested_duration(&request(Some(90), None)).unwrap(), 5400);
        assert!(requested_duration(&request(Some(0), None)).is_err());
        assert!(requested_duration(&request(Some(91), None)).is_err());
    }

    #[test]
    fn exactly_one_unit_required() {
        let err = requested_duration(&request(None, None)).unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(requested_duration(&request(Some(1), Some(60))).is_err());
        assert_eq!(requested_duration(&request(None, Some(45))).unwrap(), 45);
    }
}
