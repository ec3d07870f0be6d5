//! Core types for Fieldops.
//!
//! This module provides type-safe wrappers for the domain concepts shared
//! between the service and its tooling.

pub mod email;
pub mod id;
pub mod location;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use location::{Location, LocationError};
pub use status::*;
