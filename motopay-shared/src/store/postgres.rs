//! PostgreSQL storage adapter
//!
//! Thin delegation to the model methods; the only work done here is error
//! conversion into [`StoreError`](super::StoreError).

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    CompanyStore, RefreshTokenStore, StoreResult, TransactionStore, UserStore, VehicleStore,
};
use crate::models::company::{Company, CreateCompany};
use crate::models::refresh_token::{CreateRefreshToken, RefreshToken};
use crate::models::transaction::{CreateTransaction, Transaction, TransactionFilter};
use crate::models::user::{CreateUser, User};
use crate::models::vehicle::{CreateVehicle, Vehicle};

/// Storage adapter over a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create(&self, data: CreateUser) -> StoreResult<User> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn save(&self, user: &User) -> StoreResult<Option<User>> {
        Ok(User::save(&self.pool, user).await?)
    }

    async fn update_last_login(&self, id: Uuid) -> StoreResult<bool> {
        Ok(User::update_last_login(&self.pool, id).await?)
    }
}

#[async_trait]
impl RefreshTokenStore for PgStore {
    async fn create(&self, data: CreateRefreshToken) -> StoreResult<RefreshToken> {
        Ok(RefreshToken::create(&self.pool, data).await?)
    }

    async fn find_by_hash(&self, token_hash: &str) -> StoreResult<Option<RefreshToken>> {
        Ok(RefreshToken::find_by_hash(&self.pool, token_hash).await?)
    }

    async fn revoke(&self, id: Uuid) -> StoreResult<bool> {
        Ok(RefreshToken::revoke(&self.pool, id).await?)
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> StoreResult<u64> {
        Ok(RefreshToken::revoke_all_for_user(&self.pool, user_id).await?)
    }
}

#[async_trait]
impl CompanyStore for PgStore {
    async fn create(&self, data: CreateCompany) -> StoreResult<Company> {
        Ok(Company::create(&self.pool, data).await?)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Company>> {
        Ok(Company::find_by_id(&self.pool, id).await?)
    }

    async fn list_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Company>> {
        Ok(Company::list_for_user(&self.pool, user_id).await?)
    }

    async fn is_member(&self, company_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(Company::is_member(&self.pool, company_id, user_id).await?)
    }

    async fn save(&self, company: &Company) -> StoreResult<Option<Company>> {
        Ok(Company::save(&self.pool, company).await?)
    }

    async fn soft_delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Company::soft_delete(&self.pool, id).await?)
    }
}

#[async_trait]
impl VehicleStore for PgStore {
    async fn create(&self, data: CreateVehicle) -> StoreResult<Vehicle> {
        Ok(Vehicle::create(&self.pool, data).await?)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Vehicle>> {
        Ok(Vehicle::find_by_id(&self.pool, id).await?)
    }

    async fn list_by_user(&self, user_id: Uuid, include_deleted: bool) -> StoreResult<Vec<Vehicle>> {
        Ok(Vehicle::list_by_user(&self.pool, user_id, include_deleted).await?)
    }

    async fn save(&self, vehicle: &Vehicle) -> StoreResult<Option<Vehicle>> {
        Ok(Vehicle::save(&self.pool, vehicle).await?)
    }

    async fn soft_delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Vehicle::soft_delete(&self.pool, id).await?)
    }
}

#[async_trait]
impl TransactionStore for PgStore {
    async fn create(&self, data: CreateTransaction) -> StoreResult<Transaction> {
        Ok(Transaction::create(&self.pool, data).await?)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Transaction>> {
        Ok(Transaction::find_by_id(&self.pool, id).await?)
    }

    async fn list(&self, filter: &TransactionFilter) -> StoreResult<Vec<Transaction>> {
        Ok(Transaction::list(&self.pool, filter).await?)
    }

    async fn save(&self, transaction: &Transaction) -> StoreResult<Option<Transaction>> {
        Ok(Transaction::save(&self.pool, transaction).await?)
    }

    async fn soft_delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Transaction::soft_delete(&self.pool, id).await?)
    }
}
