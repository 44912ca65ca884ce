//! Session lifecycle observer background task

use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

use crate::state::{AppState, SessionEvent};

/// Background task that logs session lifecycle events
pub async fn session_observer_task(state: Arc<AppState>) {
    info!("Starting session observer task");

    let mut events = state.subscribe();

    loop {
        match events.recv().await {
            Ok(SessionEvent::Completed { minutes, total_minutes }) => match total_minutes {
                Some(total) => info!("Session complete: +{} mindful minutes, {} in total", minutes, total),
                None => warn!("Session complete: +{} mindful minutes could not be saved", minutes),
            },
            Ok(event) => info!("Session event: {:?}", event),
            Err(RecvError::Lagged(skipped)) => {
                warn!("Session observer lagged, skipped {} events", skipped);
            }
            Err(RecvError::Closed) => {
                error!("Session event channel closed, observer exiting");
                break;
            }
        }
    }
}
