//! State management module
//!
//! The countdown engine, the session runtime that drives it, and the views
//! handed to clients.

pub mod app_state;
pub mod countdown;
pub mod snapshot;

// Re-export main types
pub use app_state::AppState;
pub use countdown::{
    CountdownEngine, Effect, GongCue, SessionStatus, MAX_DURATION_SECS, WARNING_THRESHOLD_SECS,
};
pub use snapshot::{SessionEvent, SessionSnapshot};
