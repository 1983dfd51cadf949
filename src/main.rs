use std::{sync::Arc, time::Duration};

use config::Config;
use repositories::AppwriteRepo;
use routes::{configure_cors, create_routes};
use services::{auth::AccountService, feed::FeedService, posts::PostService};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub use self::errors::{Error, Result};

mod config;
mod errors;
mod handlers;
mod middleware;
mod models;
mod repositories;
mod routes;
mod services;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub account_service: AccountService,
    pub post_service: PostService,
    pub feed_service: FeedService,
}

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::init();

    let backend = match AppwriteRepo::new(
        config.appwrite.clone(),
        Duration::from_secs(config.timeout_secs),
    ) {
        Ok(repo) => {
            info!(endpoint = %repo.config().url, "✅ Backend client ready");
            Arc::new(repo)
        }
        Err(err) => {
            tracing::error!("🔥 Failed to build the backend client: {}", err);
            std::process::exit(1);
        }
    };

    let app_state = AppState {
        config: config.clone(),
        account_service: AccountService::new(backend.clone(), backend.clone()),
        post_service: PostService::new(backend.clone(), backend.clone()),
        feed_service: FeedService::new(backend),
    };

    let app = create_routes(Arc::new(app_state)).layer(configure_cors());

    let address = format!("[::]:{}", config.port);
    let listener = match TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("🔥 Failed to bind {}: {}", address, err);
            std::process::exit(1);
        }
    };
    info!("Server running on {address}");

    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {}", err);
    }

    info!("Server shut down");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                tracing::warn!("Failed to install terminate handler: {}", err);
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
