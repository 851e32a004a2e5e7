// src/main.rs
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum_server::Handle;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use poll_backend::config::{Config, Storage};
use poll_backend::ids::SortableIds;
use poll_backend::{db, routes, Services};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Environment misconfigured: {e}");
            std::process::exit(1);
        }
    };

    let services = match (config.storage, config.database_url.as_deref()) {
        (Storage::Postgres, Some(database_url)) => {
            // Create the database connection pool
            match db::create_pool(database_url, config.max_connections).await {
                Ok(pool) => {
                    info!("Successfully connected!");
                    Services::postgres(pool)
                }
                Err(e) => {
                    error!("Failed to connect to the database: {e}");
                    std::process::exit(1);
                }
            }
        }
        _ => {
            info!("Using in-memory storage");
            Services::in_memory(Arc::new(SortableIds))
        }
    };

    let app = routes::create_routes(Arc::new(services));

    let address = SocketAddr::from(([0, 0, 0, 0], config.port));
    let handle = Handle::new();
    tokio::spawn(shutdown_signal(handle.clone()));

    info!("Server running on {address}");
    if let Err(e) = axum_server::bind(address)
        .handle(handle)
        .serve(app.into_make_service())
        .await
    {
        error!("Server error: {e}");
    }

    info!("Server shutting down...");
}

async fn shutdown_signal(handle: Handle) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
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

    handle.graceful_shutdown(Some(Duration::from_secs(10)));
}
