//! Storage ports and adapters
//!
//! Services never talk to the database directly. They hold `Arc<dyn ...Store>`
//! handles, which are backed by one of two adapters:
//!
//! - [`postgres::PgStore`]: delegates to the SQL in [`crate::models`]
//! - [`memory::MemoryStore`]: maps behind a `tokio::sync::RwLock`, used by
//!   tests and local development
//!
//! # Example
//!
//! ```
//! use motopay_shared::store::Stores;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let stores = Stores::in_memory();
//! stores.ping().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::pool::health_check;
use crate::models::company::{Company, CreateCompany};
use crate::models::refresh_token::{CreateRefreshToken, RefreshToken};
use crate::models::transaction::{CreateTransaction, Transaction, TransactionFilter};
use crate::models::user::{CreateUser, User};
use crate::models::vehicle::{CreateVehicle, Vehicle};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// PostgreSQL error code for unique constraint violations
const UNIQUE_VIOLATION: &str = "23505";

/// Storage error types
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write (payload: constraint name)
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                let constraint = db_err.constraint().unwrap_or("unique").to_string();
                return StoreError::UniqueViolation(constraint);
            }
        }

        StoreError::Database(err)
    }
}

/// Storage result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// User accounts
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user; `UniqueViolation` if the email is taken (case-insensitive)
    async fn create(&self, data: CreateUser) -> StoreResult<User>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Case-insensitive lookup
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Persists the mutable fields, returning the stored row
    async fn save(&self, user: &User) -> StoreResult<Option<User>>;

    async fn update_last_login(&self, id: Uuid) -> StoreResult<bool>;
}

/// Hashed refresh tokens
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn create(&self, data: CreateRefreshToken) -> StoreResult<RefreshToken>;

    async fn find_by_hash(&self, token_hash: &str) -> StoreResult<Option<RefreshToken>>;

    /// Revokes one token; false if it was already revoked or is unknown
    async fn revoke(&self, id: Uuid) -> StoreResult<bool>;

    /// Revokes every active token of a user, returning how many were revoked
    async fn revoke_all_for_user(&self, user_id: Uuid) -> StoreResult<u64>;
}

/// Companies and memberships
#[async_trait]
pub trait CompanyStore: Send + Sync {
    /// Inserts the company and makes its creator a member
    async fn create(&self, data: CreateCompany) -> StoreResult<Company>;

    /// Includes soft-deleted companies
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Company>>;

    /// Non-deleted companies of a member, oldest membership first
    async fn list_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Company>>;

    async fn is_member(&self, company_id: Uuid, user_id: Uuid) -> StoreResult<bool>;

    async fn save(&self, company: &Company) -> StoreResult<Option<Company>>;

    async fn soft_delete(&self, id: Uuid) -> StoreResult<bool>;
}

/// Vehicles
#[async_trait]
pub trait VehicleStore: Send + Sync {
    async fn create(&self, data: CreateVehicle) -> StoreResult<Vehicle>;

    /// Includes soft-deleted vehicles
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Vehicle>>;

    /// Vehicles of a user ordered by name
    async fn list_by_user(&self, user_id: Uuid, include_deleted: bool) -> StoreResult<Vec<Vehicle>>;

    async fn save(&self, vehicle: &Vehicle) -> StoreResult<Option<Vehicle>>;

    async fn soft_delete(&self, id: Uuid) -> StoreResult<bool>;
}

/// Income and expense records
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn create(&self, data: CreateTransaction) -> StoreResult<Transaction>;

    /// Includes soft-deleted transactions
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Transaction>>;

    /// Non-deleted transactions matching the filter, newest first
    async fn list(&self, filter: &TransactionFilter) -> StoreResult<Vec<Transaction>>;

    async fn save(&self, transaction: &Transaction) -> StoreResult<Option<Transaction>>;

    async fn soft_delete(&self, id: Uuid) -> StoreResult<bool>;
}

/// Every storage port, wired to a single adapter
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub refresh_tokens: Arc<dyn RefreshTokenStore>,
    pub companies: Arc<dyn CompanyStore>,
    pub vehicles: Arc<dyn VehicleStore>,
    pub transactions: Arc<dyn TransactionStore>,
    pool: Option<PgPool>,
}

impl Stores {
    /// Ports backed by PostgreSQL
    pub fn postgres(pool: PgPool) -> Self {
        let store = Arc::new(PgStore::new(pool.clone()));

        Self {
            users: store.clone(),
            refresh_tokens: store.clone(),
            companies: store.clone(),
            vehicles: store.clone(),
            transactions: store,
            pool: Some(pool),
        }
    }

    /// Ports backed by a fresh, empty in-memory store
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());

        Self {
            users: store.clone(),
            refresh_tokens: store.clone(),
            companies: store.clone(),
            vehicles: store.clone(),
            transactions: store,
            pool: None,
        }
    }

    /// The PostgreSQL pool, if this set is database-backed
    pub fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    /// Checks that the backing storage is reachable
    pub async fn ping(&self) -> StoreResult<()> {
        match &self.pool {
            Some(pool) => health_check(pool).await.map_err(StoreError::from),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores")
            .field("postgres", &self.pool.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_are_not_unique_violations() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Database(sqlx::Error::RowNotFound)));
    }

    #[tokio::test]
    async fn test_in_memory_ping() {
        let stores = Stores::in_memory();
        assert!(stores.pool().is_none());
        assert!(stores.ping().await.is_ok());
    }
}
