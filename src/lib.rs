//! Gongy - A meditation timer daemon
//!
//! This library provides the countdown engine behind a meditation session,
//! the gong player and screen wake lock it drives, the persisted
//! mindful-minutes counter, and the HTTP API that exposes them.

pub mod config;
pub mod error;
pub mod state;
pub mod api;
pub mod services;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::SessionError;
pub use state::AppState;
pub use api::create_router;
pub use utils::signals::shutdown_signal;
