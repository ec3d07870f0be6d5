//! Fieldops Core - Shared types library.
//!
//! This crate provides the types shared by every Fieldops component:
//! - `api` - The REST service (shops, plans, users)
//! - `cli` - Command-line tools for migrations and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Anything that decides *whether* something is allowed or
//! *which day* a timestamp belongs to lives here so it can be tested without
//! a server.
//!
//! # Modules
//!
//! - [`types`] - Typed ids, emails, roles, statuses and locations
//! - [`access`] - The role gate applied to every protected route
//! - [`calendar`] - Day windows used by the "my day" lookup

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod calendar;
pub mod types;

pub use access::{AccessDenied, authorize, is_allowed};
pub use calendar::{day_window, start_of_day};
pub use types::*;
