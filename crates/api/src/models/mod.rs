//! Domain models and request bodies.
//!
//! Request bodies keep every field optional so that a missing field produces
//! the service's own 400 message instead of a deserializer error. Each body
//! has a method that validates it into the domain type the store accepts.

pub mod plan;
pub mod shop;
pub mod user;

pub use plan::{CreatePlanRequest, NewPlan, Plan, PlanDetail, UpdatePlanStatusRequest};
pub use shop::{
    CreateShopRequest, NewShop, Shop, ShopChanges, ShopVisit, UpdateShopRequest, VisitRequest,
};
pub use user::{AuthResponse, LoginRequest, NewUser, Profile, RegisterRequest, User, UserSummary};

use thiserror::Error;

use fieldops_core::LocationError;

/// A request body failed validation.
///
/// The `Display` text is sent to the client verbatim.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// One or more required fields were missing or blank.
    #[error("{0}")]
    MissingFields(&'static str),

    /// A text field was present but blank where a value is required.
    #[error("{0} cannot be empty")]
    Blank(&'static str),

    /// Coordinates out of range.
    #[error("{0}")]
    Location(#[from] LocationError),

    /// A date that could not be parsed.
    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

/// Trim a required text field, treating blank as absent.
fn required_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
