//! In-process store.
//!
//! Every operation takes the lock once, so multi-record writes such as plan
//! creation are atomic. Ids are handed out in increasing order, which makes
//! id order the same as creation order.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use fieldops_core::{Email, PlanId, PlanStatus, ShopId, UserId};

use super::{PlanStore, RepositoryError, ShopStore, Store, UserStore};
use crate::models::{NewPlan, NewShop, NewUser, Plan, Shop, ShopChanges, ShopVisit, User};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, (User, String)>,
    shops: BTreeMap<ShopId, Shop>,
    plans: BTreeMap<PlanId, Plan>,
    last_user: i32,
    last_shop: i32,
    last_plan: i32,
}

/// Store kept entirely in memory. Data is lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write();
        if tables.users.values().any(|(u, _)| u.email == user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        tables.last_user += 1;
        let now = Utc::now();
        let created = User {
            id: UserId::new(tables.last_user),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        tables
            .users
            .insert(created.id, (created.clone(), user.password_hash.clone()));
        Ok(created)
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables.read().users.get(&id).map(|(u, _)| u.clone()))
    }

    async fn find_user_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        Ok(self
            .tables
            .read()
            .users
            .values()
            .find(|(u, _)| &u.email == email)
            .cloned())
    }

    async fn find_users(&self, ids: &[UserId]) -> Result<Vec<User>, RepositoryError> {
        let tables = self.tables.read();
        Ok(ids
            .iter()
            .filter_map(|id| tables.users.get(id).map(|(u, _)| u.clone()))
            .collect())
    }
}

#[async_trait]
impl ShopStore for MemoryStore {
    async fn list_shops(&self) -> Result<Vec<Shop>, RepositoryError> {
        Ok(self.tables.read().shops.values().cloned().collect())
    }

    async fn find_shop(&self, id: ShopId) -> Result<Option<Shop>, RepositoryError> {
        Ok(self.tables.read().shops.get(&id).cloned())
    }

    async fn find_shops(&self, ids: &[ShopId]) -> Result<Vec<Shop>, RepositoryError> {
        let tables = self.tables.read();
        Ok(ids
            .iter()
            .filter_map(|id| tables.shops.get(id).cloned())
            .collect())
    }

    async fn insert_shop(&self, shop: &NewShop) -> Result<Shop, RepositoryError> {
        let mut tables = self.tables.write();
        tables.last_shop += 1;
        let now = Utc::now();
        let created = Shop {
            id: ShopId::new(tables.last_shop),
            name: shop.name.clone(),
            contact: shop.contact.clone(),
            address: shop.address.clone(),
            location: shop.location,
            status: shop.status,
            remarks: shop.remarks.clone(),
            is_assigned: false,
            last_visited: None,
            visit_remarks: String::new(),
            created_at: now,
            updated_at: now,
        };
        tables.shops.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_shop(
        &self,
        id: ShopId,
        changes: &ShopChanges,
    ) -> Result<Shop, RepositoryError> {
        let mut tables = self.tables.write();
        let shop = tables.shops.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        changes.apply_to(shop);
        shop.updated_at = Utc::now();
        Ok(shop.clone())
    }

    async fn record_visit(&self, id: ShopId, visit: &ShopVisit) -> Result<Shop, RepositoryError> {
        let mut tables = self.tables.write();
        let shop = tables.shops.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        visit.apply_to(shop);
        shop.updated_at = Utc::now();
        Ok(shop.clone())
    }

    async fn delete_shop(&self, id: ShopId) -> Result<bool, RepositoryError> {
        Ok(self.tables.write().shops.remove(&id).is_some())
    }
}

#[async_trait]
impl PlanStore for MemoryStore {
    async fn insert_plan(&self, plan: &NewPlan) -> Result<Plan, RepositoryError> {
        let mut tables = self.tables.write();

        if !tables.users.contains_key(&plan.team_member) {
            return Err(RepositoryError::UnknownReference(format!(
                "team member {}",
                plan.team_member
            )));
        }
        if let Some(missing) = plan.shops.iter().find(|id| !tables.shops.contains_key(*id)) {
            return Err(RepositoryError::UnknownReference(format!("shop {missing}")));
        }

        tables.last_plan += 1;
        let now = Utc::now();
        let created = Plan {
            id: PlanId::new(tables.last_plan),
            team_member: plan.team_member,
            date: plan.date,
            shops: plan.shops.clone(),
            starting_point: plan.starting_point.clone(),
            final_destination: plan.final_destination.clone(),
            status: PlanStatus::Planned,
            created_at: now,
            updated_at: now,
        };
        tables.plans.insert(created.id, created.clone());

        for id in &plan.shops {
            if let Some(shop) = tables.shops.get_mut(id) {
                shop.is_assigned = true;
                shop.updated_at = now;
            }
        }

        Ok(created)
    }

    async fn list_plans(&self) -> Result<Vec<Plan>, RepositoryError> {
        Ok(self.tables.read().plans.values().cloned().collect())
    }

    async fn find_plan(&self, id: PlanId) -> Result<Option<Plan>, RepositoryError> {
        Ok(self.tables.read().plans.get(&id).cloned())
    }

    async fn find_plan_in_window(
        &self,
        team_member: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<Plan>, RepositoryError> {
        Ok(self
            .tables
            .read()
            .plans
            .values()
            .find(|p| p.team_member == team_member && start <= p.date && p.date < end)
            .cloned())
    }

    async fn set_plan_status(
        &self,
        id: PlanId,
        status: PlanStatus,
    ) -> Result<Plan, RepositoryError> {
        let mut tables = self.tables.write();
        let plan = tables.plans.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        plan.status = status;
        plan.updated_at = Utc::now();
        Ok(plan.clone())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
