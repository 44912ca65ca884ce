//! Session tick background task

use std::{sync::Arc, time::Duration};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::state::AppState;

/// Background task that advances the active session on a fixed interval
pub async fn session_tick_task(state: Arc<AppState>, period: Duration) {
    info!("Starting session tick task ({}ms)", period.as_millis());

    let mut interval = interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;

        if let Some(snapshot) = state.tick() {
            debug!(
                "Session {} at {} ({}s left)",
                snapshot.status, snapshot.display_time, snapshot.remaining_seconds
            );
        }
    }
}
