#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use axum::{
    Router,
    http::{Method, header},
    routing::{get, post},
};
use chatflow::AppCore;
use chatflow::api::chat::chat;
use chatflow::config::Settings;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[derive(serde::Serialize)]
struct Health {
    status: String,
    service: String,
}

async fn health() -> axum::Json<Health> {
    axum::Json(Health {
        status: "healthy".to_string(),
        service: "chatflow".to_string(),
    })
}

#[tokio::main]
async fn main() {
    // Initialize tracing logger
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,chatflow=debug".into()),
        )
        .with_target(false)
        .with_line_number(true)
        .init();

    tracing::info!("Starting chatflow server");

    let settings = Settings::from_env();
    settings.validate().expect("Invalid configuration");

    let bind_addr = settings.bind_addr.clone();
    let core = Arc::new(AppCore::new(settings).expect("Failed to initialize app core"));

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat))
        .layer(cors)
        .with_state(core);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {bind_addr}: {e}"));

    tracing::info!("chatflow running on http://{bind_addr}");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
