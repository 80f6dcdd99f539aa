//! Relay Server - delivers queued push notifications and records outcomes.

mod config;

use axum::Router;
use color_eyre::eyre::WrapErr as _;
use tower_http::trace::TraceLayer;

use config::{Config, ConfigError};
use relay_service::{Dispatcher, Producer, Relay};

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("relay-server starting");

    let config = match Config::load() {
        Ok(c) => {
            tracing::info!(path = %Config::config_path().display(), "configuration loaded");
            c
        }
        Err(ConfigError::NotFound(path)) => {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
            Config::default()
        }
        Err(e) => return Err(e).wrap_err("failed to load config"),
    }
    .with_env_overrides();

    // Initialize storage
    let storage = relay_storage::SqliteStorage::new(&config.database_url)
        .wrap_err("failed to initialize storage")?;

    storage
        .run_migrations()
        .wrap_err("failed to run migrations")?;

    let gateway = relay_push::ensure_initialized(&config.gateway)
        .wrap_err("failed to initialize push gateway")?;

    // Wire the change feed: producer -> relay -> dispatcher
    let (publisher, subscription) =
        relay_service::change_feed(config.feed_capacity, config.collection.as_str());

    let dispatcher = Dispatcher::new(storage.clone(), gateway, config.dispatch.clone());
    let relay = tokio::spawn(Relay::new(dispatcher, config.max_in_flight).run(subscription));

    let producer = Producer::new(storage, publisher, config.collection.as_str());

    let app = Router::new()
        .merge(relay_http::api_router(producer))
        .layer(axum::middleware::from_fn(relay_http::logging_middleware))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .wrap_err("failed to bind")?;

    tracing::info!(addr = %config.listen, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("server error")?;

    // The server has dropped every publisher; wait for in-flight deliveries.
    relay.await.wrap_err("relay task failed")?;

    tracing::info!("relay-server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => tracing::info!("received SIGINT"),
        _ = terminate => tracing::info!("received SIGTERM"),
    }
}
