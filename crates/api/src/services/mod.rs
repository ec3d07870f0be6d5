//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration, login and bearer token resolution
//! - `shops` - Shop registry and visit recording
//! - `plans` - Plan creation, lookup and status changes
//!
//! Services borrow a `&dyn Store` for the duration of one request, so they
//! run unchanged over `PostgreSQL` and the in-memory store.

pub mod auth;
pub mod plans;
pub mod shops;

pub use auth::{AuthError, AuthService, TokenSigner, create_user};
pub use plans::{PlanError, PlanService};
pub use shops::{ShopError, ShopService};
