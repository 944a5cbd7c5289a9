//! # finance-api
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ApiConfig::load ──► Database::new (pool + migrations) ──► AppState    │
//! │        │                                                    │          │
//! │        └──► socket_addr ──► TcpListener ──► axum::serve(router)        │
//! │                                                 │                      │
//! │                               Ctrl+C / SIGTERM ─┘ graceful shutdown    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use atlvs_db::Database;
use atlvs_finance_api::{init_tracing, router, ApiConfig, AppState, CONFIG_PATH_ENV};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting ATLVS finance API...");

    let config = ApiConfig::load(env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))?;
    let addr = config.socket_addr()?;
    info!(
        %addr,
        db_path = %config.database.path.display(),
        forecast_months = config.reports.forecast_months,
        "Configuration loaded"
    );

    let db = Database::new(config.db_config()).await?;
    info!("Database ready");

    let app = router(AppState::new(Arc::new(db), config));

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM. A handler that cannot be installed is
/// logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
