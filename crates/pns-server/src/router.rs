use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with all PNS endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route(
            "/v1/names",
            get(handler::list_names).post(handler::register_name),
        )
        .route("/v1/names/:name", get(handler::resolve_name))
        .route(
            "/v1/names/:name/services",
            get(handler::list_services).post(handler::register_service),
        )
        .route("/v1/names/:name/services/:sub_name", get(handler::resolve_service))
        .route("/v1/names/:name/reservations", post(handler::reserve_service))
        .route("/v1/storage", post(handler::provision_storage))
        .route("/v1/resolve", get(handler::resolve_uri))
        .route(
            "/v1/profiles",
            get(handler::list_profiles).post(handler::create_profile),
        )
        .route(
            "/v1/profiles/:address",
            get(handler::fetch_profile).put(handler::update_profile),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
