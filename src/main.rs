//! Pomodoro Server - a work/break countdown timer served over HTTP
//!
//! This is the main entry point for the pomodoro-server application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use pomodoro_server::{
    api::create_router,
    config::Config,
    services::StateStore,
    state::{AppState, DurationConfig},
    tasks::{session_recorder_task, ticker_task},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("pomodoro_server={},tower_http=info", config.log_level()))
        .init();

    info!("Starting pomodoro-server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, work={}min, break={}min, tick={}ms",
          config.host, config.port, config.work, config.break_minutes, config.tick_ms);

    let store = match config.state_path() {
        Some(path) => {
            info!("Persisting state to {}", path.display());
            StateStore::new(path)
        }
        None => {
            info!("Persistence disabled, state is kept in memory");
            StateStore::in_memory()
        }
    };

    // Create application state
    let durations = DurationConfig::from_minutes(config.work, config.break_minutes);
    let state = Arc::new(AppState::new(config.port, config.host.clone(), durations, store));

    // Start the countdown ticker and the session recorder
    let ticker_state = Arc::clone(&state);
    let period = config.tick_period();
    tokio::spawn(async move {
        ticker_task(ticker_state, period).await;
    });

    let recorder_state = Arc::clone(&state);
    tokio::spawn(async move {
        session_recorder_task(recorder_state).await;
    });

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /start, /pause, /toggle, /reset - Control the countdown");
    info!("  GET  /status                          - Timer, sessions and theme");
    info!("  GET|PUT /settings                     - Work/break durations");
    info!("  POST /settings/validate, /settings/step");
    info!("  GET  /sessions, PUT /sessions/markers/:index, DELETE /sessions");
    info!("  GET  /theme, POST /theme/toggle");
    info!("  GET  /events                          - Server-sent timer events");
    info!("  GET  /health                          - Health check");

    // Open event streams never finish, so race the server against the signal
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

    state.persist().await;
    info!("Server shutdown complete");
    Ok(())
}
