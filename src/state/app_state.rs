//! Main application state management
//!
//! `AppState` owns the single active session together with its gong player
//! and the wake lock guard. Every intent and every tick reads the clock and
//! runs under one lock, so a tick can never land in the middle of a pause or
//! scrub, nor apply an instant older than the transition before it.

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::{
    snapshot::display_time, CountdownEngine, Effect, SessionEvent, SessionSnapshot,
    SessionStatus,
};
use crate::{
    error::SessionError,
    services::{AudioBackend, CounterStore, GongPlayer, WakeLockBackend, WakeLockGuard},
    utils::Clock,
};

/// One countdown plus the gong player that belongs to it
struct Session {
    engine: CountdownEngine,
    gong: GongPlayer,
    started_at: DateTime<Utc>,
}

/// Everything guarded by the session lock
struct Desk {
    session: Option<Session>,
    wake_lock: WakeLockGuard,
}

/// Main application state shared by the API handlers and background tasks
pub struct AppState {
    desk: Mutex<Desk>,
    audio: Arc<dyn AudioBackend>,
    counter: CounterStore,
    clock: Arc<dyn Clock>,
    /// Server metadata
    pub start_time: Instant,
    /// Lifecycle notifications (started, paused, completed, ...)
    pub event_tx: broadcast::Sender<SessionEvent>,
}

impl AppState {
    pub fn new(
        audio: Arc<dyn AudioBackend>,
        wake_lock: Arc<dyn WakeLockBackend>,
        counter: CounterStore,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(100);

        Self {
            desk: Mutex::new(Desk {
                session: None,
                wake_lock: WakeLockGuard::new(wake_lock),
            }),
            audio,
            counter,
            clock,
            start_time: Instant::now(),
            event_tx,
        }
    }

    /// Start a new session, discarding any current one
    pub fn start(&self, duration_secs: u64) -> Result<SessionSnapshot, SessionError> {
        let mut desk = self.lock_desk();
        let now = self.clock.now();
        let (engine, effects) = CountdownEngine::create(duration_secs, now)?;

        if let Some(previous) = desk.session.take() {
            info!("Replacing {} session with a new one", previous.engine.status());
            desk.wake_lock.release();
        }

        let gong = GongPlayer::new(Arc::clone(&self.audio));
        info!("Starting {}s session with {:?}", duration_secs, gong.track());
        self.notify(SessionEvent::Started {
            duration_seconds: duration_secs,
            track: gong.track(),
        });
        desk.session = Some(Session {
            engine,
            gong,
            started_at: now,
        });

        self.apply(&mut desk, effects, now);
        Self::snapshot_of(&desk, now).ok_or(SessionError::NoSession)
    }

    pub fn pause(&self) -> Result<SessionSnapshot, SessionError> {
        self.transition(|engine, now| {
            let effects = engine.pause(now)?;
            Ok((effects, SessionEvent::Paused { remaining_seconds: engine.remaining_secs() }))
        })
    }

    pub fn resume(&self) -> Result<SessionSnapshot, SessionError> {
        self.transition(|engine, now| {
            let effects = engine.resume(now)?;
            Ok((effects, SessionEvent::Resumed { remaining_seconds: engine.remaining_secs() }))
        })
    }

    /// Move the countdown to `remaining_secs` without changing running/paused
    pub fn scrub(&self, remaining_secs: u64) -> Result<SessionSnapshot, SessionError> {
        self.transition(|engine, now| {
            let effects = engine.scrub_to(remaining_secs, now)?;
            if engine.is_parked() {
                warn!("Session parked at 0:00; it will not complete until scrubbed back up or cancelled");
            }
            Ok((effects, SessionEvent::Scrubbed { remaining_seconds: engine.remaining_secs() }))
        })
    }

    /// Discard the session and release the wake lock
    pub fn cancel(&self) -> Result<(), SessionError> {
        let mut desk = self.lock_desk();
        let now = self.clock.now();
        let session = desk.session.take().ok_or(SessionError::NoSession)?;
        desk.wake_lock.release();

        info!("Session cancelled");
        self.notify(SessionEvent::Cancelled {
            remaining_seconds: session.engine.remaining_secs_at(now),
        });
        Ok(())
    }

    /// Advance the active session from the clock and apply what it emits
    pub fn tick(&self) -> Option<SessionSnapshot> {
        let mut desk = self.lock_desk();
        let now = self.clock.now();
        let session = desk.session.as_mut()?;
        if session.engine.status() != SessionStatus::Running {
            return None;
        }

        let effects = session.engine.tick(now);
        self.apply(&mut desk, effects, now);
        Self::snapshot_of(&desk, now)
    }

    /// Current session view, `None` when idle
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        let desk = self.lock_desk();
        let now = self.clock.now();
        Self::snapshot_of(&desk, now)
    }

    pub fn is_wake_lock_held(&self) -> bool {
        self.lock_desk().wake_lock.is_held()
    }

    /// Persisted mindful-minutes total
    pub fn total_minutes(&self) -> u64 {
        self.counter.read()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    fn transition<F>(&self, op: F) -> Result<SessionSnapshot, SessionError>
    where
        F: FnOnce(&mut CountdownEngine, DateTime<Utc>) -> Result<(Vec<Effect>, SessionEvent), SessionError>,
    {
        let mut desk = self.lock_desk();
        let now = self.clock.now();
        let session = desk.session.as_mut().ok_or(SessionError::NoSession)?;

        let (effects, event) = op(&mut session.engine, now)?;
        debug!("Session transition: {:?}", event);
        self.notify(event);
        self.apply(&mut desk, effects, now);
        Self::snapshot_of(&desk, now).ok_or(SessionError::NoSession)
    }

    /// Apply engine effects in the order they were emitted
    fn apply(&self, desk: &mut Desk, effects: Vec<Effect>, now: DateTime<Utc>) {
        let mut credited_total = None;
        for effect in effects {
            match effect {
                Effect::AcquireWakeLock => desk.wake_lock.acquire(),
                Effect::ReleaseWakeLock => desk.wake_lock.release(),
                Effect::PlayGong(cue) => {
                    if let Some(session) = desk.session.as_mut() {
                        session.gong.play(cue, now);
                    }
                }
                Effect::CreditMinutes(minutes) => {
                    credited_total = self.counter.increment(minutes);
                    info!("Credited {} mindful minutes (total {:?})", minutes, credited_total);
                }
                Effect::NotifyCompleted { minutes } => {
                    info!("Session completed");
                    self.notify(SessionEvent::Completed {
                        minutes,
                        total_minutes: credited_total,
                    });
                }
            }
        }
    }

    fn notify(&self, event: SessionEvent) {
        if let Err(e) = self.event_tx.send(event) {
            debug!("No listeners for session event: {}", e);
        }
    }

    fn snapshot_of(desk: &Desk, now: DateTime<Utc>) -> Option<SessionSnapshot> {
        let session = desk.session.as_ref()?;
        let engine = &session.engine;
        let remaining = engine.remaining_secs_at(now);
        let running = engine.status() == SessionStatus::Running;

        Some(SessionSnapshot {
            status: engine.status(),
            initial_duration_seconds: engine.initial_duration_secs(),
            remaining_seconds: remaining,
            elapsed_seconds: engine.initial_duration_secs() - remaining,
            display_time: display_time(remaining),
            track: session.gong.track(),
            wake_lock_held: desk.wake_lock.is_held(),
            warning_played: engine.warning_fired(),
            parked_at_zero: engine.is_parked(),
            started_at: session.started_at,
            expires_at: running.then(|| engine.expiry_at()),
        })
    }

    fn lock_desk(&self) -> MutexGuard<'_, Desk> {
        self.desk.lock().unwrap_or_else(|e| e.into_inner())
    }
}
