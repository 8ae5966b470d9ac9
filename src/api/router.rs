use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::status::apply_error_status;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // Operational routes
    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render));

    // Metered API; every call re-authenticates from the request body
    let api = Router::new()
        .route("/register", post(handlers::register::register))
        .route("/classify", post(handlers::classify::classify))
        .route("/refill", post(handlers::refill::refill))
        .layer(middleware::map_response_with_state(
            state.clone(),
            apply_error_status,
        ));

    public
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
