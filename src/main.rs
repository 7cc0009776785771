//! Scoreboard Back binary entrypoint wiring the REST API to the selected storage backend.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scoreboard_back::{
    config::{AppConfig, StoreBackend},
    dao::{
        score_store::{ScoreStore, memory::MemoryScoreStore},
        storage::StorageError,
    },
    routes,
    services::storage_supervisor,
    state::{AppState, SharedState},
};

const DEFAULT_PORT: u16 = 8080;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = AppState::new(config);

    spawn_storage_supervisor(app_state.clone(), StoreBackend::from_env());
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Start the background task that connects the chosen backend and keeps it healthy.
fn spawn_storage_supervisor(state: SharedState, backend: StoreBackend) {
    info!(?backend, "selected storage backend");
    match backend {
        StoreBackend::Memory => {
            tokio::spawn(storage_supervisor::run(state, || async {
                Ok::<Arc<dyn ScoreStore>, StorageError>(Arc::new(MemoryScoreStore::new()))
            }));
        }
        #[cfg(feature = "mongo-store")]
        StoreBackend::Mongo => {
            use scoreboard_back::dao::score_store::mongodb::{MongoConfig, MongoScoreStore};

            tokio::spawn(storage_supervisor::run(state, || async {
                let config = MongoConfig::from_env().await?;
                let store = MongoScoreStore::connect(config).await?;
                Ok::<Arc<dyn ScoreStore>, StorageError>(Arc::new(store))
            }));
        }
        #[cfg(feature = "couch-store")]
        StoreBackend::Couch => {
            use scoreboard_back::dao::score_store::couchdb::{CouchConfig, CouchScoreStore};

            tokio::spawn(storage_supervisor::run(state, || async {
                let config = CouchConfig::from_env()?;
                let store = CouchScoreStore::connect(config).await?;
                Ok::<Arc<dyn ScoreStore>, StorageError>(Arc::new(store))
            }));
        }
        #[allow(unreachable_patterns)]
        other => {
            warn!(
                backend = ?other,
                "storage backend not compiled in; staying in degraded mode"
            );
        }
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
