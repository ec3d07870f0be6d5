//! User route handlers.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use fieldops_core::{access::policy, authorize};

use crate::error::{ApiJson, Result};
use crate::middleware::RequireAuth;
use crate::models::{AuthResponse, LoginRequest, Profile, RegisterRequest};
use crate::services::AuthService;
use crate::state::AppState;

/// Register an account and return it with a bearer token.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let resp = AuthService::new(state.store(), state.tokens())
        .register(req)
        .await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

/// Exchange email and password for a bearer token.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let resp = AuthService::new(state.store(), state.tokens())
        .login(req)
        .await?;
    tracing::info!(user_id = %resp.profile.id, "User logged in");
    Ok(Json(resp))
}

/// The caller's own identity.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn profile(RequireAuth(user): RequireAuth) -> Result<Json<Profile>> {
    authorize(policy::AUTHENTICATED, Some(user.role))?;
    Ok(Json(Profile::from(&user)))
}
