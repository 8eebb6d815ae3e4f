use anyhow::Result;
use ledger::spawn_recurring_processors;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::config::{initialize_app_state, Settings};
use crate::router::create_router;

pub async fn serve(settings: Settings) -> Result<()> {
    trace!("Entering serve function");
    info!("Budgeting application starting up");
    debug!("Bind address: {}", settings.bind_address);

    let state = match initialize_app_state(&settings).await {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize application state: {}", e);
            return Err(e);
        }
    };

    let cancel = CancellationToken::new();
    let processors = spawn_recurring_processors(state.db.clone(), &settings.scheduler, cancel.clone());
    debug!("Started {} recurring processors", processors.len());

    let app = create_router(state);

    let listener = match TcpListener::bind(&settings.bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to address {}: {}", settings.bind_address, e);
            cancel.cancel();
            return Err(e.into());
        }
    };

    info!("Budgeting API server running on http://{}", settings.bind_address);
    info!("Swagger UI available at http://{}/swagger-ui", settings.bind_address);

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await;

    // Covers the server failing on its own as well as ctrl-c.
    cancel.cancel();
    for handle in processors {
        if let Err(e) = handle.await {
            warn!("Recurring processor ended abnormally: {}", e);
        }
    }

    if let Err(e) = result {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    info!("Server shutdown gracefully");
    Ok(())
}

async fn shutdown_signal(cancel: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!("Failed to listen for ctrl-c: {}", e);
            }
            info!("Shutdown requested");
            cancel.cancel();
        }
        _ = cancel.cancelled() => {}
    }
}
