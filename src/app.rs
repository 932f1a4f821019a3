//! Router construction for the authentication API.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::{
    auth::{require_free_pass, require_identity, require_shared_secret, require_super_admin},
    routes,
    state::AppState,
};

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.settings.body_limit_bytes();
    let concurrency_limit = state.settings.concurrency_limit();

    let signed_in = Router::new()
        .route("/verify/{challenge}", post(routes::verify))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_identity,
        ));

    let super_admin = Router::new()
        .route("/admin/auth", get(routes::admin_auth))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_super_admin,
        ));

    let shared_secret = Router::new()
        .route("/connectioncodes/auth", get(routes::connection_codes_auth))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_shared_secret,
        ));

    let free_pass = Router::new()
        .route("/test/auth", get(routes::test_auth))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_free_pass,
        ));

    Router::new()
        .route("/health", get(routes::health))
        .route("/ask", get(routes::ask))
        .route("/poll/{challenge}", get(routes::poll))
        .route("/save", post(routes::post_save))
        .route("/save/{key}", get(routes::poll_save))
        .merge(signed_in)
        .merge(super_admin)
        .merge(shared_secret)
        .merge(free_pass)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(GlobalConcurrencyLimitLayer::new(concurrency_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
