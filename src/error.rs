//! Error types for session intents

use thiserror::Error;

use crate::state::SessionStatus;

/// Errors returned when a user intent cannot be applied to the session.
///
/// Playback, wake-lock and storage failures never show up here: those are
/// logged where they happen and the countdown carries on without them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No session has been started, or it was cancelled
    #[error("No active session")]
    NoSession,

    /// The requested transition is not valid from the current status
    #[error("Cannot {action} a session that is {status}")]
    InvalidTransition {
        action: &'static str,
        status: SessionStatus,
    },

    /// Requested duration is zero or longer than the allowed maximum
    #[error("Session duration must be between 1 and {max} seconds, got {requested}")]
    InvalidDuration { requested: u64, max: u64 },
}
