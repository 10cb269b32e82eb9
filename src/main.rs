//! Shorts Shield - popup controller for a short-form video blocker
//!
//! Opens the popup against the JSON store, serves the local view layer, and
//! closes the popup on SIGINT/SIGTERM. A running countdown survives the close
//! and resumes on the next start.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use shorts_shield::{
    close_signal,
    config::Config,
    create_router, launch,
    messaging::TabBridge,
    storage::JsonFileStore,
    utils::{Clock, SystemClock},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "shorts_shield={},tower_http=info",
            config.log_level()
        ))
        .init();

    info!("Starting shorts-shield popup v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, store={}",
        config.host,
        config.port,
        config.store.display()
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let bridge = TabBridge::new(64);

    // Open the popup: load persisted state and start the event loop
    let (popup, event_loop) = launch(
        Box::new(JsonFileStore::new(&config.store)),
        Box::new(bridge.clone()),
        Arc::clone(&clock),
    )?;

    let state = Arc::new(AppState::new(
        popup.clone(),
        bridge,
        clock,
        config.host.clone(),
        config.port,
    ));
    let app = create_router(state);

    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Popup running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /toggle              - Main toggle click");
    info!("  POST /active              - Set the master toggle");
    info!("  POST /features/:feature   - Change a feature flag");
    info!("  POST /developer/unlock    - Developer unlock click");
    info!("  POST /developer/settings  - Save developer settings");
    info!("  GET  /status              - Render the popup");
    info!("  GET  /health              - Health check");
    info!("  POST /tabs/:tab/focus     - Mark the active tab");
    info!("  GET  /tabs/:tab/messages  - Content-script message stream");

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = close_signal() => {
            info!("Close signal received");
        }
    }

    popup.close();
    if let Err(e) = event_loop.await {
        tracing::error!("Popup event loop failed: {}", e);
    }

    info!("Popup closed");
    Ok(())
}
