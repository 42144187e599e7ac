#![allow(dead_code)]

pub mod config;
pub mod db;
pub mod logging;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
pub mod uploads;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::state::AppState;
use crate::uploads::UploadStore;

pub async fn create_app() -> axum::Router {
    let config = Config::from_env();

    let upload_store = UploadStore::new(&config.upload_root);
    if let Err(err) = upload_store.provision() {
        tracing::warn!(error = %err, "upload tree not provisioned");
    }

    let db_proxy = match db::DatabaseProxy::from_env().await {
        Ok(proxy) => Some(proxy),
        Err(_) => None,
    };

    let state = AppState::new(db_proxy, upload_store);

    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
