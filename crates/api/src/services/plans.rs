//! Plan assignment.
//!
//! Plans store plain ids; reads resolve them to the team member summary and
//! the shop records, keeping plan order and skipping shops that have since
//! been deleted.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, TimeZone};
use thiserror::Error;

use fieldops_core::{PlanId, Role, ShopId, UserId, day_window};

use crate::db::{RepositoryError, Store};
use crate::models::{
    CreatePlanRequest, Plan, PlanDetail, UpdatePlanStatusRequest, User, UserSummary,
    ValidationError,
};

/// Errors from plan operations.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The request body was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The plan names a team member or shop that does not exist.
    #[error("Unknown {0}")]
    UnknownReference(String),

    /// No plan with the requested id.
    #[error("Plan not found.")]
    NotFound,

    /// A team member asked for someone else's plan.
    #[error("Forbidden: You can only view your own plans.")]
    NotOwnPlan,

    /// A team member tried to change someone else's plan.
    #[error("Forbidden: You can only update the status of your own plans.")]
    NotOwnPlanStatus,

    /// The caller has no plan dated today.
    #[error("No plan found for today.")]
    NoPlanToday,

    /// The requested status is not one of the plan statuses.
    #[error("Invalid plan status.")]
    InvalidStatus,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for PlanError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::UnknownReference(what) => Self::UnknownReference(what),
            RepositoryError::NotFound => Self::NotFound,
            other => Self::Repository(other),
        }
    }
}

/// Team members are limited to their own plans; managers see every plan.
fn may_access(caller: &User, plan: &Plan) -> bool {
    caller.role != Role::TeamMember || plan.team_member == caller.id
}

/// Plan creation, lookup and status changes.
pub struct PlanService<'a> {
    store: &'a dyn Store,
}

impl<'a> PlanService<'a> {
    /// Create a new plan service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Create a plan and mark its shops as assigned.
    ///
    /// Dates without an offset are read in `tz`.
    ///
    /// # Errors
    ///
    /// Returns `PlanError::Validation` if required fields are missing or the
    /// date is unreadable, and `PlanError::UnknownReference` if the team
    /// member or a shop does not exist.
    pub async fn create<Tz: TimeZone>(
        &self,
        req: CreatePlanRequest,
        tz: &Tz,
    ) -> Result<Plan, PlanError> {
        let new = req.validate(tz)?;
        let plan = self.store.insert_plan(&new).await?;
        tracing::info!(
            plan_id = %plan.id,
            team_member = %plan.team_member,
            shops = plan.shops.len(),
            "Plan created"
        );
        Ok(plan)
    }

    /// Every plan with references resolved, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `PlanError::Repository` if the store fails.
    pub async fn list(&self) -> Result<Vec<PlanDetail>, PlanError> {
        let plans = self.store.list_plans().await?;
        self.resolve(plans).await
    }

    /// One plan with references resolved.
    ///
    /// # Errors
    ///
    /// Returns `PlanError::NotFound` if the plan does not exist and
    /// `PlanError::NotOwnPlan` if a team member asks for another's plan.
    pub async fn get(&self, id: PlanId, caller: &User) -> Result<PlanDetail, PlanError> {
        let plan = self.store.find_plan(id).await?.ok_or(PlanError::NotFound)?;
        if !may_access(caller, &plan) {
            return Err(PlanError::NotOwnPlan);
        }
        self.resolve_one(plan).await
    }

    /// The caller's plan for the calendar day containing `now`.
    ///
    /// # Errors
    ///
    /// Returns `PlanError::NoPlanToday` if no plan is dated within that day.
    pub async fn my_day<Tz: TimeZone>(
        &self,
        caller: &User,
        now: &DateTime<Tz>,
    ) -> Result<PlanDetail, PlanError> {
        let (start, end) = day_window(now);
        let plan = self
            .store
            .find_plan_in_window(caller.id, start, end)
            .await?
            .ok_or(PlanError::NoPlanToday)?;
        self.resolve_one(plan).await
    }

    /// Move a plan to the requested status. Any status may follow any other.
    ///
    /// # Errors
    ///
    /// Checked in order: `PlanError::NotFound`, then
    /// `PlanError::NotOwnPlanStatus` for a team member changing another's
    /// plan, then `PlanError::InvalidStatus`.
    pub async fn set_status(
        &self,
        id: PlanId,
        caller: &User,
        req: &UpdatePlanStatusRequest,
    ) -> Result<Plan, PlanError> {
        let plan = self.store.find_plan(id).await?.ok_or(PlanError::NotFound)?;
        if !may_access(caller, &plan) {
            return Err(PlanError::NotOwnPlanStatus);
        }
        let status = req.target().ok_or(PlanError::InvalidStatus)?;

        let updated = self.store.set_plan_status(id, status).await?;
        tracing::info!(plan_id = %id, status = %status, "Plan status changed");
        Ok(updated)
    }

    async fn resolve_one(&self, plan: Plan) -> Result<PlanDetail, PlanError> {
        self.resolve(vec![plan])
            .await?
            .pop()
            .ok_or(PlanError::NotFound)
    }

    async fn resolve(&self, plans: Vec<Plan>) -> Result<Vec<PlanDetail>, PlanError> {
        let user_ids: Vec<UserId> = plans
            .iter()
            .map(|p| p.team_member)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let shop_ids: Vec<ShopId> = plans
            .iter()
            .flat_map(|p| p.shops.iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let users: HashMap<UserId, UserSummary> = self
            .store
            .find_users(&user_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, UserSummary::from(u)))
            .collect();
        let shops: HashMap<ShopId, _> = self
            .store
            .find_shops(&shop_ids)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        Ok(plans
            .into_iter()
            .map(|plan| {
                let team_member = users.get(&plan.team_member).cloned();
                let resolved = plan
                    .shops
                    .iter()
                    .filter_map(|id| shops.get(id).cloned())
                    .collect();
                PlanDetail::new(plan, team_member, resolved)
            })
            .collect())
    }
}
