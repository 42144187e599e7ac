use std::net::SocketAddr;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use lms_backend_rust::config::Config;
use lms_backend_rust::db::DatabaseProxy;
use lms_backend_rust::logging;
use lms_backend_rust::routes;
use lms_backend_rust::state::AppState;
use lms_backend_rust::uploads::UploadStore;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();

    let _log_guard = logging::init_tracing(&config.log_level);

    // The upload tree is part of the deployment contract and must exist
    // before the listener binds.
    let upload_store = UploadStore::new(&config.upload_root);
    if let Err(err) = upload_store.provision() {
        tracing::error!(error = %err, root = %upload_store.root().display(), "upload tree provisioning failed");
        std::process::exit(1);
    }
    tracing::info!(root = %upload_store.root().display(), "upload tree provisioned");

    let db_proxy = match DatabaseProxy::from_env().await {
        Ok(proxy) => Some(proxy),
        Err(err) => {
            tracing::warn!(error = %err, "database proxy not initialized");
            None
        }
    };

    let state = AppState::new(db_proxy, upload_store);

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.bind_addr();
    tracing::info!(%addr, "lms-backend listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("bind listener failed");

    let server = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal());

    if let Err(e) = server.await {
        tracing::error!(error = %e, "server error");
    }

    tracing::info!("HTTP server stopped, shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
