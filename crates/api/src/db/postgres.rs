//! `PostgreSQL` store.
//!
//! Queries are checked at runtime (`query_as` + `FromRow`) so the crate builds
//! without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use fieldops_core::{Email, Location, PlanId, PlanStatus, Role, ShopId, ShopStatus, UserId};

use super::{PlanStore, RepositoryError, ShopStore, Store, UserStore};
use crate::models::{NewPlan, NewShop, NewUser, Plan, Shop, ShopChanges, ShopVisit, User};

const USER_COLUMNS: &str = "id, name, email, role, created_at, updated_at";

const SHOP_COLUMNS: &str = "id, name, contact, address, latitude, longitude, status, remarks, \
                            is_assigned, last_visited, visit_remarks, created_at, updated_at";

const PLAN_COLUMNS: &str = "id, team_member_id, plan_date, starting_point, final_destination, \
                            status, created_at, updated_at";

/// Store backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Load the ordered shop ids of each plan and assemble domain plans.
    async fn attach_shops(&self, rows: Vec<PlanRow>) -> Result<Vec<Plan>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<PlanId> = rows.iter().map(|r| r.id).collect();
        let links: Vec<PlanShopRow> = sqlx::query_as(
            r"
            SELECT plan_id, shop_id
            FROM plan_shops
            WHERE plan_id = ANY($1)
            ORDER BY plan_id, position
            ",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let shops = links
                    .iter()
                    .filter(|link| link.plan_id == row.id)
                    .map(|link| link.shop_id)
                    .collect();
                row.into_plan(shops)
            })
            .collect())
    }
}

#[derive(FromRow)]
struct UserRow {
    id: UserId,
    name: String,
    email: String,
    role: Role,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            email,
            role: row.role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct UserPasswordRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

#[derive(FromRow)]
struct ShopRow {
    id: ShopId,
    name: String,
    contact: String,
    address: String,
    latitude: f64,
    longitude: f64,
    status: ShopStatus,
    remarks: String,
    is_assigned: bool,
    last_visited: Option<DateTime<Utc>>,
    visit_remarks: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ShopRow> for Shop {
    type Error = RepositoryError;

    fn try_from(row: ShopRow) -> Result<Self, Self::Error> {
        let location = Location::new(row.latitude, row.longitude).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid location in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            contact: row.contact,
            address: row.address,
            location,
            status: row.status,
            remarks: row.remarks,
            is_assigned: row.is_assigned,
            last_visited: row.last_visited,
            visit_remarks: row.visit_remarks,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_shops(rows: Vec<ShopRow>) -> Result<Vec<Shop>, RepositoryError> {
    rows.into_iter().map(Shop::try_from).collect()
}

#[derive(FromRow)]
struct PlanRow {
    id: PlanId,
    team_member_id: UserId,
    plan_date: DateTime<Utc>,
    starting_point: String,
    final_destination: String,
    status: PlanStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PlanRow {
    fn into_plan(self, shops: Vec<ShopId>) -> Plan {
        Plan {
            id: self.id,
            team_member: self.team_member_id,
            date: self.plan_date,
            shops,
            starting_point: self.starting_point,
            final_destination: self.final_destination,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct PlanShopRow {
    plan_id: PlanId,
    shop_id: ShopId,
}

fn map_unique_violation(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let row: UserRow = sqlx::query_as(&format!(
            r"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(&user.name)
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "email"))?;

        row.try_into()
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_user_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row: Option<UserPasswordRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| Ok((User::try_from(r.user)?, r.password_hash)))
            .transpose()
    }

    async fn find_users(&self, ids: &[UserId]) -> Result<Vec<User>, RepositoryError> {
        let rows: Vec<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"))
                .bind(ids)
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(User::try_from).collect()
    }
}

#[async_trait]
impl ShopStore for PgStore {
    async fn list_shops(&self) -> Result<Vec<Shop>, RepositoryError> {
        let rows: Vec<ShopRow> = sqlx::query_as(&format!(
            "SELECT {SHOP_COLUMNS} FROM shops ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        into_shops(rows)
    }

    async fn find_shop(&self, id: ShopId) -> Result<Option<Shop>, RepositoryError> {
        let row: Option<ShopRow> =
            sqlx::query_as(&format!("SELECT {SHOP_COLUMNS} FROM shops WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Shop::try_from).transpose()
    }

    async fn find_shops(&self, ids: &[ShopId]) -> Result<Vec<Shop>, RepositoryError> {
        let rows: Vec<ShopRow> =
            sqlx::query_as(&format!("SELECT {SHOP_COLUMNS} FROM shops WHERE id = ANY($1)"))
                .bind(ids)
                .fetch_all(&self.pool)
                .await?;

        into_shops(rows)
    }

    async fn insert_shop(&self, shop: &NewShop) -> Result<Shop, RepositoryError> {
        let row: ShopRow = sqlx::query_as(&format!(
            r"
            INSERT INTO shops (name, contact, address, latitude, longitude, status, remarks)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {SHOP_COLUMNS}
            "
        ))
        .bind(&shop.name)
        .bind(&shop.contact)
        .bind(&shop.address)
        .bind(shop.location.latitude)
        .bind(shop.location.longitude)
        .bind(shop.status)
        .bind(&shop.remarks)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn update_shop(
        &self,
        id: ShopId,
        changes: &ShopChanges,
    ) -> Result<Shop, RepositoryError> {
        let row: Option<ShopRow> = sqlx::query_as(&format!(
            r"
            UPDATE shops
            SET name = COALESCE($2, name),
                contact = COALESCE($3, contact),
                address = COALESCE($4, address),
                latitude = COALESCE($5, latitude),
                longitude = COALESCE($6, longitude),
                status = COALESCE($7, status),
                remarks = COALESCE($8, remarks),
                is_assigned = COALESCE($9, is_assigned),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {SHOP_COLUMNS}
            "
        ))
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.contact.as_deref())
        .bind(changes.address.as_deref())
        .bind(changes.latitude)
        .bind(changes.longitude)
        .bind(changes.status)
        .bind(changes.remarks.as_deref())
        .bind(changes.is_assigned)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    async fn record_visit(&self, id: ShopId, visit: &ShopVisit) -> Result<Shop, RepositoryError> {
        let row: Option<ShopRow> = sqlx::query_as(&format!(
            r"
            UPDATE shops
            SET status = COALESCE($2, status),
                visit_remarks = COALESCE($3, visit_remarks),
                last_visited = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {SHOP_COLUMNS}
            "
        ))
        .bind(id)
        .bind(visit.status)
        .bind(visit.visit_remarks.as_deref())
        .bind(visit.visited_at)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    async fn delete_shop(&self, id: ShopId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shops WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Fail with `UnknownReference` unless the user and every shop exist.
///
/// Shop rows are locked so a concurrent delete cannot slip in before commit.
async fn check_references(
    tx: &mut Transaction<'_, Postgres>,
    plan: &NewPlan,
) -> Result<(), RepositoryError> {
    let user: Option<(UserId,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
        .bind(plan.team_member)
        .fetch_optional(&mut **tx)
        .await?;
    if user.is_none() {
        return Err(RepositoryError::UnknownReference(format!(
            "team member {}",
            plan.team_member
        )));
    }

    let found: Vec<(ShopId,)> =
        sqlx::query_as("SELECT id FROM shops WHERE id = ANY($1) FOR UPDATE")
            .bind(&plan.shops)
            .fetch_all(&mut **tx)
            .await?;
    if let Some(missing) = plan
        .shops
        .iter()
        .find(|id| !found.iter().any(|(f,)| f == *id))
    {
        return Err(RepositoryError::UnknownReference(format!("shop {missing}")));
    }

    Ok(())
}

#[async_trait]
impl PlanStore for PgStore {
    async fn insert_plan(&self, plan: &NewPlan) -> Result<Plan, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        check_references(&mut tx, plan).await?;

        let row: PlanRow = sqlx::query_as(&format!(
            r"
            INSERT INTO plans (team_member_id, plan_date, starting_point, final_destination)
            VALUES ($1, $2, $3, $4)
            RETURNING {PLAN_COLUMNS}
            "
        ))
        .bind(plan.team_member)
        .bind(plan.date)
        .bind(&plan.starting_point)
        .bind(&plan.final_destination)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r"
            INSERT INTO plan_shops (plan_id, position, shop_id)
            SELECT $1, ordinality::INTEGER, shop_id
            FROM UNNEST($2::INTEGER[]) WITH ORDINALITY AS t(shop_id, ordinality)
            ",
        )
        .bind(row.id)
        .bind(&plan.shops)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE shops SET is_assigned = TRUE, updated_at = NOW() WHERE id = ANY($1)")
            .bind(&plan.shops)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(row.into_plan(plan.shops.clone()))
    }

    async fn list_plans(&self) -> Result<Vec<Plan>, RepositoryError> {
        let rows: Vec<PlanRow> = sqlx::query_as(&format!(
            "SELECT {PLAN_COLUMNS} FROM plans ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        self.attach_shops(rows).await
    }

    async fn find_plan(&self, id: PlanId) -> Result<Option<Plan>, RepositoryError> {
        let row: Option<PlanRow> =
            sqlx::query_as(&format!("SELECT {PLAN_COLUMNS} FROM plans WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(self.attach_shops(row.into_iter().collect()).await?.pop())
    }

    async fn find_plan_in_window(
        &self,
        team_member: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<Plan>, RepositoryError> {
        let row: Option<PlanRow> = sqlx::query_as(&format!(
            r"
            SELECT {PLAN_COLUMNS}
            FROM plans
            WHERE team_member_id = $1 AND plan_date >= $2 AND plan_date < $3
            ORDER BY id
            LIMIT 1
            "
        ))
        .bind(team_member)
        .bind(start)
        .bind(end)
        .fetch_optional(&self.pool)
        .await?;

        Ok(self.attach_shops(row.into_iter().collect()).await?.pop())
    }

    async fn set_plan_status(
        &self,
        id: PlanId,
        status: PlanStatus,
    ) -> Result<Plan, RepositoryError> {
        let row: Option<PlanRow> = sqlx::query_as(&format!(
            r"
            UPDATE plans
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {PLAN_COLUMNS}
            "
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        let row = row.ok_or(RepositoryError::NotFound)?;
        self.attach_shops(vec![row])
            .await?
            .pop()
            .ok_or(RepositoryError::NotFound)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    //! Run with `cargo test -p fieldops-api -- --ignored` against a scratch
    //! database named by `FIELDOPS_DATABASE_URL` or `DATABASE_URL`.

    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    use super::*;

    async fn store() -> PgStore {
        let url = std::env::var("FIELDOPS_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .unwrap();
        let pool = PgPool::connect(&url).await.unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        PgStore::new(pool)
    }

    async fn user(store: &PgStore) -> User {
        store
            .insert_user(&NewUser {
                name: "Asha".to_owned(),
                email: Email::parse(&format!("{}@example.com", Uuid::new_v4())).unwrap(),
                password_hash: "$argon2id$stub".to_owned(),
                role: Role::TeamMember,
            })
            .await
            .unwrap()
    }

    async fn shop(store: &PgStore) -> Shop {
        store
            .insert_shop(&NewShop {
                name: format!("Shop {}", Uuid::new_v4()),
                contact: "555-0100".to_owned(),
                address: "1 Main St".to_owned(),
                location: Location::new(12.9, 77.5).unwrap(),
                status: ShopStatus::Open,
                remarks: String::new(),
            })
            .await
            .unwrap()
    }

    fn new_plan(team_member: UserId, shops: Vec<ShopId>, date: DateTime<Utc>) -> NewPlan {
        NewPlan {
            team_member,
            date,
            shops,
            starting_point: "Depot".to_owned(),
            final_destination: "Depot".to_owned(),
        }
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL"]
    async fn test_duplicate_email_conflicts() {
        let store = store().await;
        let first = user(&store).await;
        let err = store
            .insert_user(&NewUser {
                name: "Other".to_owned(),
                email: first.email.clone(),
                password_hash: "$argon2id$stub".to_owned(),
                role: Role::Admin,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL"]
    async fn test_insert_plan_keeps_order_and_flags_shops() {
        let store = store().await;
        let member = user(&store).await;
        let (a, b, c) = (shop(&store).await, shop(&store).await, shop(&store).await);

        let plan = store
            .insert_plan(&new_plan(member.id, vec![c.id, a.id, b.id], Utc::now()))
            .await
            .unwrap();
        assert_eq!(plan.status, PlanStatus::Planned);

        let stored = store.find_plan(plan.id).await.unwrap().unwrap();
        assert_eq!(stored.shops, vec![c.id, a.id, b.id]);
        for id in [a.id, b.id, c.id] {
            assert!(store.find_shop(id).await.unwrap().unwrap().is_assigned);
        }
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL"]
    async fn test_insert_plan_with_unknown_shop_rolls_back() {
        let store = store().await;
        let member = user(&store).await;
        let a = shop(&store).await;

        let err = store
            .insert_plan(&new_plan(member.id, vec![a.id, ShopId::new(i32::MAX)], Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::UnknownReference(_)));
        assert!(!store.find_shop(a.id).await.unwrap().unwrap().is_assigned);

        let far = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
        let none = store
            .find_plan_in_window(member.id, far, Utc::now() + Duration::days(1))
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL"]
    async fn test_window_is_half_open() {
        let store = store().await;
        let member = user(&store).await;
        let a = shop(&store).await;
        let start = Utc.with_ymd_and_hms(2026, 6, 10, 0, 0, 0).unwrap();
        let end = start + Duration::days(1);

        store
            .insert_plan(&new_plan(member.id, vec![a.id], end))
            .await
            .unwrap();
        assert!(
            store
                .find_plan_in_window(member.id, start, end)
                .await
                .unwrap()
                .is_none()
        );

        let today = store
            .insert_plan(&new_plan(member.id, vec![a.id], start))
            .await
            .unwrap();
        let found = store
            .find_plan_in_window(member.id, start, end)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, today.id);
        assert_eq!(found.shops, vec![a.id]);
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL"]
    async fn test_targeted_writes_leave_assignment_alone() {
        let store = store().await;
        let member = user(&store).await;
        let a = shop(&store).await;
        store
            .insert_plan(&new_plan(member.id, vec![a.id], Utc::now()))
            .await
            .unwrap();

        let at = Utc.with_ymd_and_hms(2026, 6, 10, 15, 0, 0).unwrap();
        let visited = store
            .record_visit(
                a.id,
                &ShopVisit {
                    status: Some(ShopStatus::Closed),
                    visit_remarks: Some(String::new()),
                    visited_at: at,
                },
            )
            .await
            .unwrap();
        assert!(visited.is_assigned);
        assert_eq!(visited.status, ShopStatus::Closed);
        assert_eq!(visited.visit_remarks, "");
        assert_eq!(visited.last_visited, Some(at));

        let updated = store
            .update_shop(
                a.id,
                &ShopChanges {
                    latitude: Some(0.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.is_assigned);
        assert!(updated.location.latitude.abs() < f64::EPSILON);
        assert!((updated.location.longitude - 77.5).abs() < f64::EPSILON);
        assert_eq!(updated.status, ShopStatus::Closed);

        store.delete_shop(a.id).await.unwrap();
        let err = store
            .record_visit(
                a.id,
                &ShopVisit {
                    status: None,
                    visit_remarks: None,
                    visited_at: at,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }
}
