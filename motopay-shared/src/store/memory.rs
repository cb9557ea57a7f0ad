//! In-memory storage adapter
//!
//! Mirrors the PostgreSQL semantics closely enough for service and HTTP tests:
//! case-insensitive unique emails, unique token digests, soft deletes and the
//! same list orderings. Rows are kept in insertion order so that ties on
//! timestamps resolve the same way every run.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    CompanyStore, RefreshTokenStore, StoreError, StoreResult, TransactionStore, UserStore,
    VehicleStore,
};
use crate::models::company::{Company, CreateCompany};
use crate::models::refresh_token::{CreateRefreshToken, RefreshToken};
use crate::models::transaction::{CreateTransaction, Transaction, TransactionFilter};
use crate::models::user::{CreateUser, User};
use crate::models::vehicle::{CreateVehicle, Vehicle};

#[derive(Debug, Default)]
struct State {
    users: Vec<User>,
    refresh_tokens: Vec<RefreshToken>,
    companies: Vec<Company>,
    /// (company_id, user_id), oldest first
    memberships: Vec<(Uuid, Uuid)>,
    vehicles: Vec<Vehicle>,
    transactions: Vec<Transaction>,
}

/// Storage adapter keeping every table in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Replaces the row with the same id, returning the stored copy
fn replace<T: Clone>(rows: &mut [T], id: Uuid, id_of: impl Fn(&T) -> Uuid, row: T) -> Option<T> {
    let slot = rows.iter_mut().find(|existing| id_of(existing) == id)?;
    *slot = row;
    Some(slot.clone())
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, data: CreateUser) -> StoreResult<User> {
        let mut state = self.state.write().await;

        if state
            .users
            .iter()
            .any(|u| u.email.to_lowercase() == data.email.to_lowercase())
        {
            return Err(StoreError::UniqueViolation("users_email_key".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: data.email,
            password_hash: data.password_hash,
            name: data.name,
            phone: None,
            is_active: true,
            deleted_at: None,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };
        state.users.push(user.clone());

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = email.to_lowercase();
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .find(|u| u.email.to_lowercase() == email)
            .cloned())
    }

    async fn save(&self, user: &User) -> StoreResult<Option<User>> {
        let mut state = self.state.write().await;

        let Some(mut stored) = state.users.iter().find(|u| u.id == user.id).cloned() else {
            return Ok(None);
        };
        stored.name = user.name.clone();
        stored.phone = user.phone.clone();
        stored.password_hash = user.password_hash.clone();
        stored.is_active = user.is_active;
        stored.deleted_at = user.deleted_at;
        stored.updated_at = Utc::now();

        Ok(replace(&mut state.users, user.id, |u| u.id, stored))
    }

    async fn update_last_login(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;

        match state.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.last_login_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryStore {
    async fn create(&self, data: CreateRefreshToken) -> StoreResult<RefreshToken> {
        let mut state = self.state.write().await;

        if state
            .refresh_tokens
            .iter()
            .any(|t| t.token_hash == data.token_hash)
        {
            return Err(StoreError::UniqueViolation(
                "refresh_tokens_token_hash_key".to_string(),
            ));
        }

        let token = RefreshToken {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            token_hash: data.token_hash,
            expires_at: data.expires_at,
            revoked: false,
            revoked_at: None,
            created_at: Utc::now(),
        };
        state.refresh_tokens.push(token.clone());

        Ok(token)
    }

    async fn find_by_hash(&self, token_hash: &str) -> StoreResult<Option<RefreshToken>> {
        let state = self.state.read().await;
        Ok(state
            .refresh_tokens
            .iter()
            .find(|t| t.token_hash == token_hash)
            .cloned())
    }

    async fn revoke(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;

        match state
            .refresh_tokens
            .iter_mut()
            .find(|t| t.id == id && !t.revoked)
        {
            Some(token) => {
                token.revoked = true;
                token.revoked_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> StoreResult<u64> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let mut revoked = 0;

        for token in state
            .refresh_tokens
            .iter_mut()
            .filter(|t| t.user_id == user_id && !t.revoked)
        {
            token.revoked = true;
            token.revoked_at = Some(now);
            revoked += 1;
        }

        Ok(revoked)
    }
}

#[async_trait]
impl CompanyStore for MemoryStore {
    async fn create(&self, data: CreateCompany) -> StoreResult<Company> {
        let mut state = self.state.write().await;

        let now = Utc::now();
        let company = Company {
            id: Uuid::new_v4(),
            name: data.name,
            description: data.description,
            created_by: data.created_by,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        state.companies.push(company.clone());
        state.memberships.push((company.id, data.created_by));

        Ok(company)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Company>> {
        let state = self.state.read().await;
        Ok(state.companies.iter().find(|c| c.id == id).cloned())
    }

    async fn list_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Company>> {
        let state = self.state.read().await;

        let companies = state
            .memberships
            .iter()
            .filter(|(_, member)| *member == user_id)
            .filter_map(|(company_id, _)| state.companies.iter().find(|c| c.id == *company_id))
            .filter(|c| !c.is_deleted())
            .cloned()
            .collect();

        Ok(companies)
    }

    async fn is_member(&self, company_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let state = self.state.read().await;
        Ok(state.memberships.contains(&(company_id, user_id)))
    }

    async fn save(&self, company: &Company) -> StoreResult<Option<Company>> {
        let mut state = self.state.write().await;

        let Some(mut stored) = state.companies.iter().find(|c| c.id == company.id).cloned() else {
            return Ok(None);
        };
        stored.name = company.name.clone();
        stored.description = company.description.clone();
        stored.updated_at = Utc::now();

        Ok(replace(&mut state.companies, company.id, |c| c.id, stored))
    }

    async fn soft_delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;

        match state
            .companies
            .iter_mut()
            .find(|c| c.id == id && c.deleted_at.is_none())
        {
            Some(company) => {
                let now = Utc::now();
                company.deleted_at = Some(now);
                company.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl VehicleStore for MemoryStore {
    async fn create(&self, data: CreateVehicle) -> StoreResult<Vehicle> {
        let mut state = self.state.write().await;

        let now = Utc::now();
        let vehicle = Vehicle {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            name: data.name,
            plate: data.plate,
            kind: data.kind,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        state.vehicles.push(vehicle.clone());

        Ok(vehicle)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Vehicle>> {
        let state = self.state.read().await;
        Ok(state.vehicles.iter().find(|v| v.id == id).cloned())
    }

    async fn list_by_user(&self, user_id: Uuid, include_deleted: bool) -> StoreResult<Vec<Vehicle>> {
        let state = self.state.read().await;

        let mut vehicles: Vec<Vehicle> = state
            .vehicles
            .iter()
            .filter(|v| v.user_id == user_id && (include_deleted || !v.is_deleted()))
            .cloned()
            .collect();
        vehicles.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(vehicles)
    }

    async fn save(&self, vehicle: &Vehicle) -> StoreResult<Option<Vehicle>> {
        let mut state = self.state.write().await;

        let Some(mut stored) = state.vehicles.iter().find(|v| v.id == vehicle.id).cloned() else {
            return Ok(None);
        };
        stored.name = vehicle.name.clone();
        stored.plate = vehicle.plate.clone();
        stored.kind = vehicle.kind;
        stored.updated_at = Utc::now();

        Ok(replace(&mut state.vehicles, vehicle.id, |v| v.id, stored))
    }

    async fn soft_delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;

        match state
            .vehicles
            .iter_mut()
            .find(|v| v.id == id && v.deleted_at.is_none())
        {
            Some(vehicle) => {
                let now = Utc::now();
                vehicle.deleted_at = Some(now);
                vehicle.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn create(&self, data: CreateTransaction) -> StoreResult<Transaction> {
        let mut state = self.state.write().await;

        let now = Utc::now();
        let transaction = Transaction {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            company_id: data.company_id,
            vehicle_id: data.vehicle_id,
            kind: data.kind,
            category: data.category,
            amount_cents: data.amount_cents,
            occurred_on: data.occurred_on,
            description: data.description,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        state.transactions.push(transaction.clone());

        Ok(transaction)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Transaction>> {
        let state = self.state.read().await;
        Ok(state.transactions.iter().find(|t| t.id == id).cloned())
    }

    async fn list(&self, filter: &TransactionFilter) -> StoreResult<Vec<Transaction>> {
        let state = self.state.read().await;

        // Newest inserted first, then a stable sort by business date
        let mut transactions: Vec<Transaction> = state
            .transactions
            .iter()
            .rev()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        transactions.sort_by(|a, b| b.occurred_on.cmp(&a.occurred_on));

        let offset = filter.offset.max(0) as usize;
        let limit = filter
            .limit
            .map(|limit| limit.max(0) as usize)
            .unwrap_or(usize::MAX);

        Ok(transactions.into_iter().skip(offset).take(limit).collect())
    }

    async fn save(&self, transaction: &Transaction) -> StoreResult<Option<Transaction>> {
        let mut state = self.state.write().await;

        let Some(mut stored) = state
            .transactions
            .iter()
            .find(|t| t.id == transaction.id)
            .cloned()
        else {
            return Ok(None);
        };
        stored.company_id = transaction.company_id;
        stored.vehicle_id = transaction.vehicle_id;
        stored.kind = transaction.kind;
        stored.category = transaction.category.clone();
        stored.amount_cents = transaction.amount_cents;
        stored.occurred_on = transaction.occurred_on;
        stored.description = transaction.description.clone();
        stored.updated_at = Utc::now();

        Ok(replace(&mut state.transactions, transaction.id, |t| t.id, stored))
    }

    async fn soft_delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;

        match state
            .transactions
            .iter_mut()
            .find(|t| t.id == id && t.deleted_at.is_none())
        {
            Some(transaction) => {
                let now = Utc::now();
                transaction.deleted_at = Some(now);
                transaction.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::transaction::TransactionKind;
    use crate::models::vehicle::VehicleKind;
    use chrono::{Datelike, Duration, NaiveDate};

    fn new_user(email: &str) -> CreateUser {
        CreateUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            name: "Ana".to_string(),
        }
    }

    #[tokio::test]
    async fn test_user_email_is_unique_case_insensitive() {
        let store = MemoryStore::new();
        UserStore::create(&store, new_user("a@x.com")).await.unwrap();

        let err = UserStore::create(&store, new_user("A@X.COM")).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));

        let found = store.find_by_email("A@x.Com").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_revoke_is_single_shot() {
        let store = MemoryStore::new();
        let token = RefreshTokenStore::create(
            &store,
            CreateRefreshToken {
                user_id: Uuid::new_v4(),
                token_hash: "a".repeat(64),
                expires_at: Utc::now() + Duration::days(1),
            },
        )
        .await
        .unwrap();

        assert!(RefreshTokenStore::revoke(&store, token.id).await.unwrap());
        assert!(!RefreshTokenStore::revoke(&store, token.id).await.unwrap());

        let stored = store.find_by_hash(&"a".repeat(64)).await.unwrap().unwrap();
        assert!(stored.revoked);
        assert!(stored.revoked_at.is_some());
    }

    #[tokio::test]
    async fn test_company_creator_is_member_and_deleted_companies_are_hidden() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();

        let first = CompanyStore::create(
            &store,
            CreateCompany {
                name: "iFood".to_string(),
                description: None,
                created_by: user_id,
            },
        )
        .await
        .unwrap();
        let second = CompanyStore::create(
            &store,
            CreateCompany {
                name: "Rappi".to_string(),
                description: None,
                created_by: user_id,
            },
        )
        .await
        .unwrap();

        assert!(store.is_member(first.id, user_id).await.unwrap());
        assert!(!store.is_member(first.id, Uuid::new_v4()).await.unwrap());

        let listed = store.list_for_user(user_id).await.unwrap();
        assert_eq!(listed.iter().map(|c| c.id).collect::<Vec<_>>(), vec![first.id, second.id]);

        assert!(CompanyStore::soft_delete(&store, first.id).await.unwrap());
        assert!(!CompanyStore::soft_delete(&store, first.id).await.unwrap());

        let listed = store.list_for_user(user_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, second.id);

        let still_there = CompanyStore::find_by_id(&store, first.id).await.unwrap().unwrap();
        assert!(still_there.is_deleted());
    }

    #[tokio::test]
    async fn test_vehicle_listing_respects_include_deleted() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();

        let vehicle = VehicleStore::create(
            &store,
            CreateVehicle {
                user_id,
                name: "CG 160".to_string(),
                plate: None,
                kind: VehicleKind::Motorcycle,
            },
        )
        .await
        .unwrap();
        VehicleStore::soft_delete(&store, vehicle.id).await.unwrap();

        assert!(store.list_by_user(user_id, false).await.unwrap().is_empty());
        assert_eq!(store.list_by_user(user_id, true).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_transactions_listed_newest_first_with_paging() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let company_id = Uuid::new_v4();

        for day in [3, 1, 2] {
            TransactionStore::create(
                &store,
                CreateTransaction {
                    user_id,
                    company_id,
                    vehicle_id: None,
                    kind: TransactionKind::Income,
                    category: "delivery".to_string(),
                    amount_cents: 100 * day as i64,
                    occurred_on: NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
                    description: None,
                },
            )
            .await
            .unwrap();
        }

        let all = store.list(&TransactionFilter::for_user(user_id)).await.unwrap();
        let days: Vec<u32> = all.iter().map(|t| t.occurred_on.day()).collect();
        assert_eq!(days, vec![3, 2, 1]);

        let page = store
            .list(&TransactionFilter {
                limit: Some(1),
                offset: 1,
                ..TransactionFilter::for_user(user_id)
            })
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].amount_cents, 200);
    }
}
