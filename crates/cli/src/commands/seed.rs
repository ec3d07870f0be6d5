//! Seed the database with demo users and shops.
//!
//! Reads a YAML file of users and shops and inserts whatever is not already
//! present, so running it twice is harmless. Every seeded user gets the
//! password from `FIELDOPS_NEW_USER_PASSWORD`.
//!
//! ```yaml
//! users:
//!   - name: Dev Distributor
//!     email: distributor@example.com
//!     role: distributor
//! shops:
//!   - name: Corner Store
//!     contact: "555-0100"
//!     address: 1 Main St
//!     latitude: 12.97
//!     longitude: 77.59
//! ```

use std::path::Path;

use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::info;

use fieldops_api::db::{PgStore, ShopStore};
use fieldops_api::models::CreateShopRequest;
use fieldops_api::services::{AuthError, ShopService, create_user};
use fieldops_core::Role;

use super::{CommandError, connect, new_user_password};

#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    users: Vec<SeedUser>,
    #[serde(default)]
    shops: Vec<SeedShop>,
}

#[derive(Debug, Deserialize)]
struct SeedUser {
    name: String,
    email: String,
    /// Parsed like the `user create --role` flag.
    role: String,
}

#[derive(Debug, Deserialize)]
struct SeedShop {
    name: String,
    contact: String,
    address: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    remarks: Option<String>,
}

/// Insert the users and shops listed in `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, the password or
/// database URL is missing, or an insert fails for a reason other than the
/// record already existing.
pub async fn run(file_path: &str) -> Result<(), CommandError> {
    let path = Path::new(file_path);
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CommandError::SeedFile(file_path.to_owned(), e))?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;
    info!(
        users = seed.users.len(),
        shops = seed.shops.len(),
        "Parsed seed file"
    );

    let password = new_user_password()?;
    let store = PgStore::new(connect().await?);

    let mut users_created = 0;
    for user in &seed.users {
        let role: Role = user
            .role
            .parse()
            .map_err(|_| CommandError::InvalidRole(user.role.clone()))?;
        match create_user(
            &store,
            &user.name,
            &user.email,
            password.expose_secret(),
            role,
        )
        .await
        {
            Ok(created) => {
                info!(user_id = %created.id, email = %created.email, "Seeded user");
                users_created += 1;
            }
            Err(AuthError::UserAlreadyExists) => {
                info!(email = %user.email, "User already exists, skipping");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let existing = store
        .list_shops()
        .await
        .map_err(|e| CommandError::Shop(e.into()))?;
    let shops = ShopService::new(&store);
    let mut shops_created = 0;
    for shop in seed.shops {
        if existing
            .iter()
            .any(|s| s.name == shop.name && s.address == shop.address)
        {
            info!(name = %shop.name, "Shop already exists, skipping");
            continue;
        }

        let created = shops
            .create(CreateShopRequest {
                name: Some(shop.name),
                contact: Some(shop.contact),
                address: Some(shop.address),
                latitude: Some(shop.latitude),
                longitude: Some(shop.longitude),
                status: None,
                remarks: shop.remarks,
            })
            .await?;
        info!(shop_id = %created.id, name = %created.name, "Seeded shop");
        shops_created += 1;
    }

    info!(users_created, shops_created, "Seeding complete");
    Ok(())
}
