//! Gongy - A meditation timer daemon
//!
//! This is the main entry point for the gongy application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use gongy::{
    config::Config,
    state::AppState,
    api::create_router,
    services::{CommandAudio, CounterStore, SystemdInhibit, Unsupported, WakeLockBackend},
    tasks::{session_observer_task, session_tick_task},
    utils::{shutdown_signal, SystemClock},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("gongy={},tower_http=info", config.log_level()))
        .init();

    info!("Starting gongy server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, tick={}ms, sounds={}",
          config.host, config.port, config.tick_ms, config.sounds_dir.display());

    // The wake lock is optional: without systemd-inhibit sessions simply run unguarded
    let wake_lock: Arc<dyn WakeLockBackend> = if config.no_wake_lock {
        info!("Wake lock disabled by configuration");
        Arc::new(Unsupported)
    } else {
        match SystemdInhibit::detect().await {
            Some(backend) => Arc::new(backend),
            None => {
                warn!("systemd-inhibit is not available, screen may sleep during sessions");
                Arc::new(Unsupported)
            }
        }
    };

    let counter = CounterStore::in_dir(&config.data_dir());
    info!("Mindful minutes stored in {} (currently {})", counter.path().display(), counter.read());

    // Create application state
    let state = Arc::new(AppState::new(
        Arc::new(CommandAudio::new(&config.player, config.sounds_dir.clone())),
        wake_lock,
        counter,
        Arc::new(SystemClock),
    ));

    // Start the background tasks
    let tick_state = Arc::clone(&state);
    let tick_interval = config.tick_interval();
    tokio::spawn(async move {
        session_tick_task(tick_state, tick_interval).await;
    });

    let observer_state = Arc::clone(&state);
    tokio::spawn(async move {
        session_observer_task(observer_state).await;
    });

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST   /session          - Start a session ({{\"minutes\": n}})");
    info!("  GET    /session          - Current session");
    info!("  DELETE /session          - Cancel the session");
    info!("  POST   /session/pause    - Pause");
    info!("  POST   /session/resume   - Resume");
    info!("  POST   /session/scrub    - Jump to remaining time");
    info!("  GET    /mindful-minutes  - Total mindful minutes");
    info!("  GET    /presets          - Duration presets");
    info!("  GET    /health           - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    // Drop any running session so the inhibitor is released
    if state.cancel().is_ok() {
        info!("Active session discarded on shutdown");
    }

    info!("Server shutdown complete");
    Ok(())
}
