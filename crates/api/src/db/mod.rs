//! Persistence for users, shops and plans.
//!
//! Handlers and services talk to a [`Store`], never to a concrete backend.
//! Two backends implement it:
//!
//! - [`PgStore`] - `PostgreSQL` via sqlx (production)
//! - [`MemoryStore`] - in-process maps (local development and tests)
//!
//! ## Tables
//!
//! - `users` - Accounts with argon2 password hashes and a role
//! - `shops` - Visit locations and their last visit outcome
//! - `plans` - One team member's route for a day
//! - `plan_shops` - Ordered shop references of each plan (no FK to `shops`,
//!   so deleting a shop leaves plans intact)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p fieldops-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use fieldops_core::{Email, PlanId, PlanStatus, ShopId, UserId};

use crate::models::{NewPlan, NewShop, NewUser, Plan, Shop, ShopChanges, ShopVisit, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A write referenced a user or shop that does not exist.
    #[error("unknown reference: {0}")]
    UnknownReference(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// User accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    async fn insert_user(&self, user: &NewUser) -> Result<User, RepositoryError>;

    /// Get a user by ID.
    async fn find_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Get a user and their password hash by email.
    async fn find_user_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    /// Get every user whose ID is in `ids`, in no particular order.
    async fn find_users(&self, ids: &[UserId]) -> Result<Vec<User>, RepositoryError>;
}

/// Shop records.
#[async_trait]
pub trait ShopStore: Send + Sync {
    /// All shops, oldest first.
    async fn list_shops(&self) -> Result<Vec<Shop>, RepositoryError>;

    /// Get a shop by ID.
    async fn find_shop(&self, id: ShopId) -> Result<Option<Shop>, RepositoryError>;

    /// Get every shop whose ID is in `ids`, in no particular order.
    async fn find_shops(&self, ids: &[ShopId]) -> Result<Vec<Shop>, RepositoryError>;

    /// Insert a shop. New shops are open for assignment.
    async fn insert_shop(&self, shop: &NewShop) -> Result<Shop, RepositoryError>;

    /// Write only the fields present in `changes` and bump `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the shop no longer exists.
    async fn update_shop(
        &self,
        id: ShopId,
        changes: &ShopChanges,
    ) -> Result<Shop, RepositoryError>;

    /// Record a visit. Only status, visit remarks, `last_visited` and
    /// `updated_at` are written.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the shop no longer exists.
    async fn record_visit(&self, id: ShopId, visit: &ShopVisit) -> Result<Shop, RepositoryError>;

    /// Delete a shop. Returns whether a row was removed.
    async fn delete_shop(&self, id: ShopId) -> Result<bool, RepositoryError>;
}

/// Plans and their shop assignments.
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Insert a plan with status `Planned` and flag its shops as assigned.
    ///
    /// Both happen or neither does.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::UnknownReference` if the team member or any
    /// shop does not exist.
    async fn insert_plan(&self, plan: &NewPlan) -> Result<Plan, RepositoryError>;

    /// All plans, oldest first.
    async fn list_plans(&self) -> Result<Vec<Plan>, RepositoryError>;

    /// Get a plan by ID.
    async fn find_plan(&self, id: PlanId) -> Result<Option<Plan>, RepositoryError>;

    /// The lowest-id plan of `team_member` dated within `[start, end)`.
    async fn find_plan_in_window(
        &self,
        team_member: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<Plan>, RepositoryError>;

    /// Set a plan's status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the plan does not exist.
    async fn set_plan_status(&self, id: PlanId, status: PlanStatus)
    -> Result<Plan, RepositoryError>;
}

/// Everything the service needs from persistence.
#[async_trait]
pub trait Store: UserStore + ShopStore + PlanStore {
    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}
