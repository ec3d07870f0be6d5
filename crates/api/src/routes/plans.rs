//! Plan route handlers.
//!
//! Calendar days ("today", bare `YYYY-MM-DD` dates) are the server's local days.

use axum::{Json, extract::State, http::StatusCode};
use chrono::Local;
use tracing::instrument;

use fieldops_core::{PlanId, access::policy, authorize};

use crate::error::{ApiJson, ApiPath, Result};
use crate::middleware::RequireAuth;
use crate::models::{CreatePlanRequest, Plan, PlanDetail, UpdatePlanStatusRequest};
use crate::services::PlanService;
use crate::state::AppState;

/// Create a plan for a team member.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(req): ApiJson<CreatePlanRequest>,
) -> Result<(StatusCode, Json<Plan>)> {
    authorize(policy::MANAGERS, Some(user.role))?;
    let plan = PlanService::new(state.store()).create(req, &Local).await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

/// List every plan.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<PlanDetail>>> {
    authorize(policy::MANAGERS, Some(user.role))?;
    Ok(Json(PlanService::new(state.store()).list().await?))
}

/// Get one plan. Team members only see their own.
#[instrument(skip_all, fields(user_id = %user.id, plan_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<PlanId>,
) -> Result<Json<PlanDetail>> {
    authorize(policy::EVERY_ROLE, Some(user.role))?;
    Ok(Json(PlanService::new(state.store()).get(id, &user).await?))
}

/// The caller's plan for today.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn my_day(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<PlanDetail>> {
    authorize(policy::TEAM_MEMBERS, Some(user.role))?;
    let plan = PlanService::new(state.store())
        .my_day(&user, &Local::now())
        .await?;
    Ok(Json(plan))
}

/// Change a plan's status. Team members only change their own.
#[instrument(skip_all, fields(user_id = %user.id, plan_id = %id))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<PlanId>,
    ApiJson(req): ApiJson<UpdatePlanStatusRequest>,
) -> Result<Json<Plan>> {
    authorize(policy::EVERY_ROLE, Some(user.role))?;
    let plan = PlanService::new(state.store())
        .set_status(id, &user, &req)
        .await?;
    Ok(Json(plan))
}
