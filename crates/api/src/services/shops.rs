//! Shop registry.

use chrono::{DateTime, Utc};
use thiserror::Error;

use fieldops_core::ShopId;

use crate::db::{RepositoryError, Store};
use crate::models::{CreateShopRequest, Shop, UpdateShopRequest, ValidationError, VisitRequest};

/// Errors from shop operations.
#[derive(Debug, Error)]
pub enum ShopError {
    /// The request body was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No shop with the requested id.
    #[error("Shop not found")]
    NotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Shop CRUD and visit recording.
pub struct ShopService<'a> {
    store: &'a dyn Store,
}

impl<'a> ShopService<'a> {
    /// Create a new shop service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Every shop, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Repository` if the store fails.
    pub async fn list(&self) -> Result<Vec<Shop>, ShopError> {
        Ok(self.store.list_shops().await?)
    }

    /// Create a shop. It starts unassigned.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Validation` if required fields are missing.
    pub async fn create(&self, req: CreateShopRequest) -> Result<Shop, ShopError> {
        let new = req.validate()?;
        let shop = self.store.insert_shop(&new).await?;
        tracing::info!(shop_id = %shop.id, "Shop created");
        Ok(shop)
    }

    /// Get one shop.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotFound` if the shop does not exist.
    pub async fn get(&self, id: ShopId) -> Result<Shop, ShopError> {
        self.store.find_shop(id).await?.ok_or(ShopError::NotFound)
    }

    /// Apply a general update; fields absent from `req` are kept.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotFound` if the shop does not exist and
    /// `ShopError::Validation` if a supplied field is invalid.
    pub async fn update(&self, id: ShopId, req: UpdateShopRequest) -> Result<Shop, ShopError> {
        let changes = req.validate()?;
        self.store
            .update_shop(id, &changes)
            .await
            .map_err(not_found)
    }

    /// Record a visit made at `now`.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotFound` if the shop does not exist.
    pub async fn visit(
        &self,
        id: ShopId,
        req: VisitRequest,
        now: DateTime<Utc>,
    ) -> Result<Shop, ShopError> {
        let shop = self
            .store
            .record_visit(id, &req.at(now))
            .await
            .map_err(not_found)?;
        tracing::info!(shop_id = %id, status = %shop.status, "Visit recorded");
        Ok(shop)
    }

    /// Delete a shop. Plans that reference it are left as they are.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotFound` if the shop does not exist.
    pub async fn delete(&self, id: ShopId) -> Result<(), ShopError> {
        if self.store.delete_shop(id).await? {
            tracing::info!(shop_id = %id, "Shop deleted");
            Ok(())
        } else {
            Err(ShopError::NotFound)
        }
    }
}

fn not_found(e: RepositoryError) -> ShopError {
    match e {
        RepositoryError::NotFound => ShopError::NotFound,
        other => ShopError::Repository(other),
    }
}
