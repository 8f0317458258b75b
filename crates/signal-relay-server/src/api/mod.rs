use crate::state::AppState;
use crate::ws;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub connections: usize,
    pub publishers: usize,
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        // Health check
        .route("/health", get(health))
        // WebSocket endpoint
        .route("/ws", get(ws::handler::ws_handler));

    // Browser client, if one is configured
    if let Some(static_dir) = &state.config.static_dir {
        tracing::info!("Serving static files from {}", static_dir.display());
        router = router.fallback_service(ServeDir::new(static_dir));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        connections: state.connections.connection_count().await,
        publishers: state.directory.publisher_count().await,
    })
}
