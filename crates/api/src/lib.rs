//! Fieldops API - REST service for field visit planning.
//!
//! Distributors register shops and build dated plans that route a team
//! member through an ordered set of them. Team members pull their plan for
//! the day, record visits and move plans through their lifecycle.
//!
//! # Architecture
//!
//! - Axum web framework serving JSON
//! - Bearer token authentication with a per-route role gate
//! - `PostgreSQL` via sqlx, or an in-memory store for development and tests
//! - Sentry error tracking and `tracing` diagnostics

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, extract::Request};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use config::ApiConfig;
pub use state::AppState;

/// Build the application: routes, request IDs, tracing and CORS.
///
/// Sentry layers are added by the binary so tests can serve this router
/// without a Sentry client.
pub fn app(state: AppState) -> Router {
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = tracing::field::Empty,
            user_id = tracing::field::Empty,
        )
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    routes::routes()
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(trace)
        .layer(cors)
        .with_state(state)
}
