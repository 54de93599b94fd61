//! Cuedeck - carousel autoplay and toast queue daemon
//!
//! This is the main entry point for the cuedeck application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use cuedeck::{
    api::create_router,
    config::Config,
    scheduling::TokioHost,
    state::AppState,
    tasks::{toast_monitor_task, wire_carousel_advance},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("cuedeck={},tower_http=info", config.log_level()))
        .init();

    info!("Starting cuedeck server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, interval={}ms, slides={}, toast={}ms, autoplay={}",
        config.host,
        config.port,
        config.interval_ms,
        config.slides,
        config.toast_ms,
        !config.no_autoplay
    );

    // Create application state on the tokio timer wheel
    let scheduler = Arc::new(TokioHost::new());
    let state = Arc::new(AppState::new(scheduler, &config));

    // Advance the carousel whenever the autoplay countdown elapses
    let _advance = wire_carousel_advance(&state);

    // Present toasts as they become active
    let monitor_state = Arc::clone(&state);
    tokio::spawn(async move {
        toast_monitor_task(monitor_state).await;
    });

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /autoplay/{{start,stop,toggle,pause,resume,reset}}");
    info!("  POST /autoplay/{{enable,disable}}   - External autoplay gate");
    info!("  POST /carousel/{{next,prev}}        - Manual navigation");
    info!("  GET  /toasts, POST /toasts         - Inspect or add toasts");
    info!("  POST /toasts/{{hide,remove,clear,pause,resume}}");
    info!("  GET  /status                       - Current status");
    info!("  GET  /health                       - Health check");

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

    // Drop pending countdowns before the runtime goes away
    state.autoplay.stop();
    state.toasts.clear_toast_queue();

    info!("Server shutdown complete");
    Ok(())
}
