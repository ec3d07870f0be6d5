//! Plan domain types and request bodies.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use fieldops_core::{PlanId, PlanStatus, ShopId, UserId, start_of_day};

use super::{Shop, UserSummary, ValidationError, required_text};

const MISSING_PLAN_FIELDS: &str = "Please provide all required fields for the plan.";

/// A plan as stored: references are plain ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: PlanId,
    pub team_member: UserId,
    pub date: DateTime<Utc>,
    /// Shops in visiting order.
    pub shops: Vec<ShopId>,
    pub starting_point: String,
    pub final_destination: String,
    pub status: PlanStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A plan with its references resolved, as returned by the read endpoints.
///
/// Shops deleted since the plan was created are left out. `teamMember` is
/// `null` if the user no longer exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDetail {
    pub id: PlanId,
    pub team_member: Option<UserSummary>,
    pub date: DateTime<Utc>,
    pub shops: Vec<Shop>,
    pub starting_point: String,
    pub final_destination: String,
    pub status: PlanStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlanDetail {
    /// Combine a plan with its resolved team member and shops.
    #[must_use]
    pub fn new(plan: Plan, team_member: Option<UserSummary>, shops: Vec<Shop>) -> Self {
        Self {
            id: plan.id,
            team_member,
            date: plan.date,
            shops,
            starting_point: plan.starting_point,
            final_destination: plan.final_destination,
            status: plan.status,
            created_at: plan.created_at,
            updated_at: plan.updated_at,
        }
    }
}

/// A validated plan about to be inserted. Status always starts as `Planned`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlan {
    pub team_member: UserId,
    pub date: DateTime<Utc>,
    /// Distinct shop ids in the order first given.
    pub shops: Vec<ShopId>,
    pub starting_point: String,
    pub final_destination: String,
}

/// Body of `POST /plans`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanRequest {
    pub team_member: Option<UserId>,
    /// RFC 3339 timestamp, or a bare `YYYY-MM-DD` meaning the start of that day.
    pub date: Option<String>,
    pub shop_ids: Option<Vec<ShopId>>,
    pub starting_point: Option<String>,
    pub final_destination: Option<String>,
}

impl CreatePlanRequest {
    /// Check required fields and resolve the date.
    ///
    /// Dates without an offset are interpreted in `tz`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MissingFields` if any field is absent or
    /// blank or `shopIds` is empty, and `ValidationError::InvalidDate` if
    /// the date cannot be parsed.
    pub fn validate<Tz: TimeZone>(self, tz: &Tz) -> Result<NewPlan, ValidationError> {
        let (Some(team_member), Some(date), Some(shop_ids), Some(starting_point), Some(final_destination)) = (
            self.team_member,
            required_text(self.date),
            self.shop_ids.filter(|ids| !ids.is_empty()),
            required_text(self.starting_point),
            required_text(self.final_destination),
        ) else {
            return Err(ValidationError::MissingFields(MISSING_PLAN_FIELDS));
        };

        let mut seen = HashSet::with_capacity(shop_ids.len());
        let shops = shop_ids.into_iter().filter(|id| seen.insert(*id)).collect();

        Ok(NewPlan {
            team_member,
            date: parse_plan_date(&date, tz)?,
            shops,
            starting_point,
            final_destination,
        })
    }
}

fn parse_plan_date<Tz: TimeZone>(value: &str, tz: &Tz) -> Result<DateTime<Utc>, ValidationError> {
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc));
    }
    if let Ok(day) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(start_of_day(tz, day));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .and_then(|local| tz.from_local_datetime(&local).earliest())
        .map(|at| at.with_timezone(&Utc))
        .ok_or_else(|| ValidationError::InvalidDate(value.to_owned()))
}

/// Body of `PUT /plans/{id}/status`.
///
/// The status is kept as a string so an unknown value reaches the handler
/// and can be rejected after the ownership check.
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePlanStatusRequest {
    pub status: Option<String>,
}

impl UpdatePlanStatusRequest {
    /// The requested status, if it names one.
    #[must_use]
    pub fn target(&self) -> Option<PlanStatus> {
        self.status.as_deref().and_then(|s| s.parse().ok())
    }
}
