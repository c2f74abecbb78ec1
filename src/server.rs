use anyhow::Result;
use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::db;
use crate::handlers;
use crate::predictor::{HttpPredictor, Predictor};
use crate::storage::BlobStore;

/// Handles to everything a request may talk to. Built once at startup.
pub(crate) struct State {
    pub(crate) db: DatabaseConnection,
    pub(crate) predictor: Arc<dyn Predictor>,
    pub(crate) blobs: BlobStore,
}

impl State {
    /// Attempt to create a new State instance
    pub(crate) async fn try_new(config: &Config) -> Result<State> {
        let db = db::connect(config).await?;
        let predictor = Arc::new(HttpPredictor::try_new(
            &config.predictor_url,
            config.predictor_timeout,
        )?);
        let blobs = BlobStore::try_from_config(&config.storage)?;

        Ok(State {
            db,
            predictor,
            blobs,
        })
    }
}

/// All routes, with middleware and state attached.
pub(crate) fn router(state: Arc<State>) -> Router {
    Router::new()
        .route("/", get(handlers::health))
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/predict", post(handlers::predict))
        .route("/history/:user_id", get(handlers::history))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(Extension(state))
}

/// Run the server.
pub(crate) async fn run() -> Result<()> {
    let config = Config::from_env()?;
    let state = Arc::new(State::try_new(&config).await?);

    tracing::info!(
        "Storing uploads with {:?} in bucket {}, predicting with {}",
        config.storage.backend,
        config.storage.bucket,
        config.predictor_url
    );
    tracing::info!("Listening on {}", config.bind_addr);

    axum::Server::bind(&config.bind_addr)
        .serve(router(state).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // the last handle to State (and the pool inside it) went away with the server
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl-c, shutdown must be forced: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down, draining in-flight requests");
}
