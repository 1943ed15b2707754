//! HTTP surface: one reading-generation endpoint plus reading history,
//! the reading-type catalog and a liveness probe.

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{get, post},
    Router,
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{AllowOrigin, CorsLayer};

pub mod routes;
pub mod state;

use crate::config::AppConfig;
use crate::utils::error::Result;
use routes::{
    generate_handler, get_reading_handler, health_handler, list_readings_handler,
    reading_types_handler, save_reading_handler,
};
pub use state::AppState;

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring invalid CORS origin {}: {}", origin, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60))
}

pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    let router = Router::new()
        .route("/api/reading/generate", post(generate_handler))
        .route(
            "/api/readings",
            post(save_reading_handler).get(list_readings_handler),
        )
        .route("/api/readings/{id}", get(get_reading_handler))
        .route("/api/reading-types", get(reading_types_handler))
        .route("/health", get(health_handler));

    let router = if allowed_origins.is_empty() {
        router
    } else {
        router.layer(cors_layer(allowed_origins))
    };

    router.with_state(state)
}

pub async fn start_server(config: AppConfig) -> Result<()> {
    tracing::info!("Initializing state...");
    let state = AppState::from_config(&config)?;

    let app = build_router(state, config.server.allowed_origins());

    let address = format!("{}:{}", config.server.host(), config.server.port());
    tracing::info!("Binding to {}", address);
    let listener = TcpListener::bind(&address).await?;
    tracing::info!("🔮 Server running on {}", address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }

        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
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
}
