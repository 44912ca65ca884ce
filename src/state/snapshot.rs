//! Read-only views of the session handed to clients and observers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SessionStatus;
use crate::services::GongTrack;

/// Point-in-time view of the active session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub initial_duration_seconds: u64,
    pub remaining_seconds: u64,
    /// Slider position: time already sat, counted from the start
    pub elapsed_seconds: u64,
    /// Remaining time as `m:ss`
    pub display_time: String,
    pub track: GongTrack,
    pub wake_lock_held: bool,
    pub warning_played: bool,
    /// Scrubbed to 0:00; the session will not complete until scrubbed back up
    pub parked_at_zero: bool,
    pub started_at: DateTime<Utc>,
    /// Only set while running
    pub expires_at: Option<DateTime<Utc>>,
}

/// Session lifecycle notifications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    Started { duration_seconds: u64, track: GongTrack },
    Paused { remaining_seconds: u64 },
    Resumed { remaining_seconds: u64 },
    Scrubbed { remaining_seconds: u64 },
    Cancelled { remaining_seconds: u64 },
    Completed { minutes: u64, total_minutes: Option<u64> },
}

/// Format seconds as `m:ss`, minutes not wrapped at the hour
pub fn display_time(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
