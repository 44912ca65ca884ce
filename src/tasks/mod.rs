//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod observer;
pub mod ticker;

// Re-export main functions
pub use observer::session_observer_task;
pub use ticker::session_tick_task;
