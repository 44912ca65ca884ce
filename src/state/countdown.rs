//! Countdown engine for a single meditation session
//!
//! The engine is a wall-clock state machine. It owns no thread and no timer:
//! every operation takes the current instant, and the caller drives `tick()`
//! on a short interval while the session runs. Transitions never perform side
//! effects themselves; they return the ordered [`Effect`]s the caller applies.
//!
//! ```text
//! Running <-> Paused -> Expired
//! ```

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Longest session the engine accepts (90 minutes)
pub const MAX_DURATION_SECS: u64 = 90 * 60;

/// Remaining time at which the warning gong sounds
pub const WARNING_THRESHOLD_SECS: u64 = 10;

/// Lifecycle status of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Running,
    Paused,
    Expired,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionStatus::Running => "running",
            SessionStatus::Paused => "paused",
            SessionStatus::Expired => "expired",
        };
        f.write_str(name)
    }
}

/// Why a gong is being played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GongCue {
    Start,
    Warning,
    Expiry,
}

/// Side effect requested by an engine transition, applied in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    AcquireWakeLock,
    ReleaseWakeLock,
    PlayGong(GongCue),
    /// Add to the persisted mindful-minutes total
    CreditMinutes(u64),
    /// Tell observers the session completed naturally
    NotifyCompleted { minutes: u64 },
}

/// Timer state machine for one session
#[derive(Debug, Clone)]
pub struct CountdownEngine {
    initial_duration_secs: u64,
    status: SessionStatus,
    expiry_at: DateTime<Utc>,
    /// Last observed remaining time; frozen while paused.
    remaining_ms: u64,
    /// Set when a scrub parks the countdown at zero. Parked sessions never expire.
    parked_at_zero: bool,
    warning_armed: bool,
    warning_fired: bool,
}

impl CountdownEngine {
    /// Start a new running session of `duration_secs`.
    pub fn create(
        duration_secs: u64,
        now: DateTime<Utc>,
    ) -> Result<(Self, Vec<Effect>), SessionError> {
        if duration_secs == 0 || duration_secs > MAX_DURATION_SECS {
            return Err(SessionError::InvalidDuration {
                requested: duration_secs,
                max: MAX_DURATION_SECS,
            });
        }

        let remaining_ms = duration_secs * 1000;
        let engine = Self {
            initial_duration_secs: duration_secs,
            status: SessionStatus::Running,
            expiry_at: now + millis(remaining_ms),
            remaining_ms,
            parked_at_zero: false,
            warning_armed: duration_secs > WARNING_THRESHOLD_SECS,
            warning_fired: false,
        };

        Ok((
            engine,
            vec![Effect::AcquireWakeLock, Effect::PlayGong(GongCue::Start)],
        ))
    }

    // Queries

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn initial_duration_secs(&self) -> u64 {
        self.initial_duration_secs
    }

    pub fn expiry_at(&self) -> DateTime<Utc> {
        self.expiry_at
    }

    pub fn warning_fired(&self) -> bool {
        self.warning_fired
    }

    /// Whether a scrub left the countdown parked at 0:00
    pub fn is_parked(&self) -> bool {
        self.parked_at_zero
    }

    /// Remaining milliseconds as of `now`.
    ///
    /// Derived from the clock while running, frozen otherwise.
    pub fn remaining_ms_at(&self, now: DateTime<Utc>) -> u64 {
        match self.status {
            SessionStatus::Running => self.clock_remaining_ms(now),
            SessionStatus::Paused | SessionStatus::Expired => self.remaining_ms,
        }
    }

    /// Whole seconds remaining as of `now`, rounded up.
    pub fn remaining_secs_at(&self, now: DateTime<Utc>) -> u64 {
        self.remaining_ms_at(now).div_ceil(1000)
    }

    /// Whole seconds remaining as of the last tick or transition.
    pub fn remaining_secs(&self) -> u64 {
        self.remaining_ms.div_ceil(1000)
    }

    // Transitions

    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<Vec<Effect>, SessionError> {
        self.require(SessionStatus::Running, "pause")?;
        self.remaining_ms = self.clock_remaining_ms(now);
        self.status = SessionStatus::Paused;
        Ok(vec![Effect::ReleaseWakeLock])
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<Vec<Effect>, SessionError> {
        self.require(SessionStatus::Paused, "resume")?;
        self.expiry_at = now + millis(self.remaining_ms);
        self.status = SessionStatus::Running;
        if self.parked_at_zero {
            return Ok(Vec::new());
        }
        Ok(vec![Effect::AcquireWakeLock])
    }

    /// Move the countdown to `remaining_secs`, clamped to the session length.
    ///
    /// Keeps the current running/paused status. Scrubbing to zero parks the
    /// session instead of expiring it, so no minutes are credited. A parked
    /// session does not hold the wake lock; scrubbing back up while running
    /// takes it again.
    pub fn scrub_to(
        &mut self,
        remaining_secs: u64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Effect>, SessionError> {
        if self.status == SessionStatus::Expired {
            return Err(SessionError::InvalidTransition {
                action: "scrub",
                status: self.status,
            });
        }

        let was_parked = self.parked_at_zero;
        let clamped = remaining_secs.min(self.initial_duration_secs);
        self.remaining_ms = clamped * 1000;
        self.expiry_at = now + millis(self.remaining_ms);
        self.parked_at_zero = clamped == 0;
        if clamped > WARNING_THRESHOLD_SECS {
            self.warning_armed = true;
        }

        if self.status != SessionStatus::Running {
            return Ok(Vec::new());
        }
        Ok(match (was_parked, self.parked_at_zero) {
            (false, true) => vec![Effect::ReleaseWakeLock],
            (true, false) => vec![Effect::AcquireWakeLock],
            _ => Vec::new(),
        })
    }

    /// Recompute the remaining time from the clock.
    ///
    /// Emits the one-shot warning gong and, when the countdown reaches zero
    /// on its own, the expiry effects. No-op unless running.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<Effect> {
        if self.status != SessionStatus::Running {
            return Vec::new();
        }

        self.remaining_ms = self.clock_remaining_ms(now);
        let remaining_secs = self.remaining_secs();
        let mut effects = Vec::new();

        if remaining_secs > WARNING_THRESHOLD_SECS {
            self.warning_armed = true;
        } else if remaining_secs > 0 && self.warning_armed && !self.warning_fired {
            self.warning_fired = true;
            effects.push(Effect::PlayGong(GongCue::Warning));
        }

        if self.remaining_ms == 0 && !self.parked_at_zero {
            effects.extend(self.expire());
        }

        effects
    }

    fn expire(&mut self) -> Vec<Effect> {
        self.status = SessionStatus::Expired;
        self.remaining_ms = 0;
        let minutes = self.initial_duration_secs / 60;
        vec![
            Effect::CreditMinutes(minutes),
            Effect::PlayGong(GongCue::Expiry),
            Effect::ReleaseWakeLock,
            Effect::NotifyCompleted { minutes },
        ]
    }

    fn require(&self, expected: SessionStatus, action: &'static str) -> Result<(), SessionError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                action,
                status: self.status,
            })
        }
    }

    fn clock_remaining_ms(&self, now: DateTime<Utc>) -> u64 {
        let ms = (self.expiry_at - now).num_milliseconds().max(0) as u64;
        ms.min(self.initial_duration_secs * 1000)
    }
}

fn millis(ms: u64) -> Duration {
    Duration::milliseconds(ms as i64)
}
