//! External service module
//!
//! Gong playback, the screen wake lock and the mindful-minutes counter.
//! Each one fails soft: errors are logged and the countdown carries on.

pub mod counter;
pub mod gong;
pub mod wake_lock;

// Re-export main types
pub use counter::CounterStore;
pub use gong::{AudioBackend, CommandAudio, GongPlayer, GongTrack};
pub use wake_lock::{SystemdInhibit, Unsupported, WakeLockBackend, WakeLockGuard, WakeLockSentinel};
