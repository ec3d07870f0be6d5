//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Store reachability
//!
//! # Users
//! POST /users/register         - Register
//! POST /users/login            - Log in
//! GET  /users/profile          - Caller's identity            (any role)
//!
//! # Shops
//! GET    /shops                - List shops                   (any role)
//! POST   /shops                - Add a shop                   (admin, distributor)
//! GET    /shops/{id}           - Shop detail                  (any role)
//! PUT    /shops/{id}           - Edit a shop                  (admin, distributor)
//! PUT    /shops/{id}/visit     - Record a visit               (team member)
//! DELETE /shops/{id}           - Delete a shop                (admin)
//!
//! # Plans
//! POST /plans                  - Create a plan                (admin, distributor)
//! GET  /plans                  - List plans                   (admin, distributor)
//! GET  /plans/my-day           - Caller's plan for today      (team member)
//! GET  /plans/{id}             - Plan detail                  (any role, own only for team members)
//! PUT  /plans/{id}/status      - Change plan status           (any role, own only for team members)
//! ```

pub mod plans;
pub mod shops;
pub mod users;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Build the API router (without state or layers).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/users", user_routes())
        .nest("/shops", shop_routes())
        .nest("/plans", plan_routes())
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route("/profile", get(users::profile))
}

fn shop_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(shops::index).post(shops::create))
        .route(
            "/{id}",
            get(shops::show).put(shops::update).delete(shops::destroy),
        )
        .route("/{id}/visit", put(shops::visit))
}

fn plan_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(plans::index).post(plans::create))
        .route("/my-day", get(plans::my_day))
        .route("/{id}", get(plans::show))
        .route("/{id}/status", put(plans::update_status))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
