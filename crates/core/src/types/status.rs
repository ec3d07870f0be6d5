//! Roles and lifecycle statuses.
//!
//! The JSON spellings (`"Team Member"`, `"In Progress"`, `"Permanently Shut"`)
//! are the ones existing clients send, so serde renames each variant
//! explicitly. In `PostgreSQL` the same values are stored as snake_case enum
//! labels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a role or status string is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct UnknownVariant {
    /// What was being parsed ("role", "shop status", ...).
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// User role controlling route access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "snake_case")
)]
pub enum Role {
    /// Full access, including shop deletion.
    Admin,
    /// Manages shops and creates plans.
    Distributor,
    /// Works a daily plan and records visits.
    #[default]
    #[serde(rename = "Team Member")]
    TeamMember,
}

impl Role {
    /// Every role, in privilege order.
    pub const ALL: [Self; 3] = [Self::Admin, Self::Distributor, Self::TeamMember];

    /// The JSON spelling of this role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Distributor => "Distributor",
            Self::TeamMember => "Team Member",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" | "admin" => Ok(Self::Admin),
            "Distributor" | "distributor" => Ok(Self::Distributor),
            "Team Member" | "team_member" => Ok(Self::TeamMember),
            _ => Err(UnknownVariant::new("role", s)),
        }
    }
}

/// Operating status of a shop, as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop_status", rename_all = "snake_case")
)]
pub enum ShopStatus {
    #[default]
    Open,
    Closed,
    #[serde(rename = "Permanently Shut")]
    PermanentlyShut,
}

impl ShopStatus {
    /// The JSON spelling of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Closed => "Closed",
            Self::PermanentlyShut => "Permanently Shut",
        }
    }
}

impl fmt::Display for ShopStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShopStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Open" => Ok(Self::Open),
            "Closed" => Ok(Self::Closed),
            "Permanently Shut" => Ok(Self::PermanentlyShut),
            _ => Err(UnknownVariant::new("shop status", s)),
        }
    }
}

/// Lifecycle status of a plan.
///
/// Any status may be set from any other; there is no transition graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "plan_status", rename_all = "snake_case")
)]
pub enum PlanStatus {
    #[default]
    Planned,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    Cancelled,
}

impl PlanStatus {
    /// Every plan status.
    pub const ALL: [Self; 4] = [
        Self::Planned,
        Self::InProgress,
        Self::Completed,
        Self::Cancelled,
    ];

    /// The JSON spelling of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planned => "Planned",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("plan status", s))
    }
}
