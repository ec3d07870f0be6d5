//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! FIELDOPS_NEW_USER_PASSWORD='...' \
//!     fieldops-cli user create -n "Asha Rao" -e asha@example.com -r distributor
//! ```
//!
//! # Environment Variables
//!
//! - `FIELDOPS_DATABASE_URL` - `PostgreSQL` connection string
//! - `FIELDOPS_NEW_USER_PASSWORD` - Password for the new user

use secrecy::ExposeSecret;

use fieldops_api::db::PgStore;
use fieldops_api::services::create_user;
use fieldops_core::{Role, UserId};

use super::{CommandError, connect, new_user_password};

/// Create a new user.
///
/// # Returns
///
/// The ID of the created user.
pub async fn create(name: &str, email: &str, role: &str) -> Result<UserId, CommandError> {
    let role: Role = role
        .parse()
        .map_err(|_| CommandError::InvalidRole(role.to_owned()))?;
    let password = new_user_password()?;

    let store = PgStore::new(connect().await?);

    tracing::info!("Creating user: {} ({})", email, role);
    let user = create_user(&store, name, email, password.expose_secret(), role).await?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );

    Ok(user.id)
}
