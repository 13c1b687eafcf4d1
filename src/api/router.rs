use axum::{
    http::{header, Method},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::health;
use super::state::AppState;
use super::v1;

/// Create the application router.
///
/// The CORS layer answers `OPTIONS` preflight requests with an empty success
/// response before they reach any handler.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/live", get(health::live_check))
        .route(
            "/v1/chat",
            get(v1::chat::chat_ready).post(v1::chat::create_chat),
        )
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
