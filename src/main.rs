use std::sync::Arc;

use crate::config::Config;
use crate::services::db::project_store::ProjectStore;
use crate::services::project_services::upload::ImageStorage;
use anyhow::{Context, Result};
use axum::{extract::DefaultBodyLimit, Router};
use dotenv::dotenv;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

//Logging
use tracing::info;
use tracing_appender::rolling;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod models;
mod services;

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn ProjectStore>, //Arc so every handler shares one store
    images: Arc<ImageStorage>,
}

impl AppState {
    pub fn new(store: Arc<dyn ProjectStore>, images: ImageStorage) -> Self {
        AppState {
            store,
            images: Arc::new(images),
        }
    }
}

/**
 * full router: project routes, stored uploads, cors, tracing, body limit
 */
pub fn build_router(state: AppState, config: &Config) -> Router {
    //setting cors
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(services::project::router())
        .nest_service("/uploads", ServeDir::new(&config.upload_dir))
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let config = Config::from_env()?;

    let file_appender = rolling::daily(&config.log_dir, "projects.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Logging initialised");

    let store = services::db::connect_store(&config).await?;
    let images = ImageStorage::new(&config.upload_dir);
    tokio::fs::create_dir_all(images.dir())
        .await
        .with_context(|| format!("Cannot create upload dir {}", images.dir().display()))?;

    let state = AppState::new(store, images);
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Cannot bind {}", config.bind_addr))?;
    info!("Listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
