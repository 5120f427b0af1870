use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderName, HeaderValue};
use proctor_shield::config::Config;
use proctor_shield::event_log::FileEventLog;
use proctor_shield::extractors::SESSION_HEADER;
use proctor_shield::logging::{init_tracing, LogConfig};
use proctor_shield::routes::build_router;
use proctor_shield::state::AppState;
use proctor_shield::tracking::session_sweep_loop;
use proctor_shield::vision::cascade::CascadeDetector;
use tokio::sync::broadcast;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

const SESSION_HEADER_NAME: HeaderName = HeaderName::from_static(SESSION_HEADER);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = Config::from_env();

    init_tracing(&LogConfig::from(&config));
    tracing::info!(?config, "Starting proctor-shield");

    let detector = Arc::new(
        CascadeDetector::load(&config.detector).expect("Failed to load cascade classifiers"),
    );
    let event_log = Arc::new(
        FileEventLog::open(&config.event_log_path).expect("Failed to open event log"),
    );
    tracing::info!(path = %event_log.path().display(), "Event log ready");

    let (shutdown_tx, _) = broadcast::channel::<()>(8);

    let state = AppState::new(detector, event_log, &config, shutdown_tx.clone());

    let sweep_handle = tokio::spawn(session_sweep_loop(
        state.sessions().clone(),
        Duration::from_secs(config.tracking.sweep_interval_secs),
        state.shutdown_rx(),
    ));

    let cors_layer = build_cors_layer(&config);

    let app = build_router(state)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ));

    let addr = SocketAddr::new(config.host, config.port);
    tracing::info!(%addr, "Listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");

    let server_future = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal(shutdown_tx.clone()));

    if let Err(e) = server_future.await {
        tracing::error!(error = %e, "HTTP server crashed");
    }

    let _ = shutdown_tx.send(());
    if let Err(e) = sweep_handle.await {
        tracing::error!(error = %e, "Session sweep task panicked");
    }
    tracing::info!("Shutdown complete");
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    if config.cors_origin.trim() == "*" {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_credentials(false)
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT, SESSION_HEADER_NAME])
            .allow_methods(Any);
    }

    match config.cors_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT, SESSION_HEADER_NAME])
            .allow_methods(Any),
        Err(e) => {
            panic!(
                "FATAL: Invalid CORS_ORIGIN '{}': {}. \
                 Fix the CORS_ORIGIN environment variable.",
                config.cors_origin, e
            );
        }
    }
}

async fn shutdown_signal(shutdown_tx: broadcast::Sender<()>) {
    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = sigterm.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("Shutdown signal received");
    let _ = shutdown_tx.send(());
}
