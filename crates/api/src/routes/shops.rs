//! Shop route handlers.

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use serde_json::{Value, json};
use tracing::instrument;

use fieldops_core::{ShopId, access::policy, authorize};

use crate::error::{ApiJson, ApiPath, Result};
use crate::middleware::RequireAuth;
use crate::models::{CreateShopRequest, Shop, UpdateShopRequest, VisitRequest};
use crate::services::ShopService;
use crate::state::AppState;

/// List every shop.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Shop>>> {
    authorize(policy::AUTHENTICATED, Some(user.role))?;
    Ok(Json(ShopService::new(state.store()).list().await?))
}

/// Add a shop.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(req): ApiJson<CreateShopRequest>,
) -> Result<(StatusCode, Json<Shop>)> {
    authorize(policy::MANAGERS, Some(user.role))?;
    let shop = ShopService::new(state.store()).create(req).await?;
    Ok((StatusCode::CREATED, Json(shop)))
}

/// Get one shop.
#[instrument(skip_all, fields(user_id = %user.id, shop_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<ShopId>,
) -> Result<Json<Shop>> {
    authorize(policy::AUTHENTICATED, Some(user.role))?;
    Ok(Json(ShopService::new(state.store()).get(id).await?))
}

/// Edit a shop's details.
#[instrument(skip_all, fields(user_id = %user.id, shop_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<ShopId>,
    ApiJson(req): ApiJson<UpdateShopRequest>,
) -> Result<Json<Shop>> {
    authorize(policy::MANAGERS, Some(user.role))?;
    Ok(Json(ShopService::new(state.store()).update(id, req).await?))
}

/// Record a visit to a shop.
#[instrument(skip_all, fields(user_id = %user.id, shop_id = %id))]
pub async fn visit(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<ShopId>,
    ApiJson(req): ApiJson<VisitRequest>,
) -> Result<Json<Shop>> {
    authorize(policy::TEAM_MEMBERS, Some(user.role))?;
    let shop = ShopService::new(state.store())
        .visit(id, req, Utc::now())
        .await?;
    Ok(Json(shop))
}

/// Delete a shop.
#[instrument(skip_all, fields(user_id = %user.id, shop_id = %id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<ShopId>,
) -> Result<Json<Value>> {
    authorize(policy::ADMINS, Some(user.role))?;
    ShopService::new(state.store()).delete(id).await?;
    Ok(Json(json!({ "message": "Shop removed" })))
}
