//! Financial record (transaction) model and database operations
//!
//! Amounts are integer cents and always positive; the `kind` decides whether
//! a record is income or expense.
//!
//! # Schema
//!
//! ```sql
//! CREATE TYPE transaction_kind AS ENUM ('income', 'expense');
//!
//! CREATE TABLE transactions (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     user_id UUID NOT NULL REFERENCES users(id),
//!     company_id UUID NOT NULL REFERENCES companies(id),
//!     vehicle_id UUID REFERENCES vehicles(id),
//!     kind transaction_kind NOT NULL,
//!     category VARCHAR(50) NOT NULL,
//!     amount_cents BIGINT NOT NULL CHECK (amount_cents > 0),
//!     occurred_on DATE NOT NULL,
//!     description VARCHAR(500),
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     deleted_at TIMESTAMPTZ
//! );
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const TRANSACTION_COLUMNS: &str = "id, user_id, company_id, vehicle_id, kind, category, \
                                   amount_cents, occurred_on, description, created_at, \
                                   updated_at, deleted_at";

/// Income or expense
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

/// A single income or expense record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Transaction {
    pub id: Uuid,

    /// Owner
    pub user_id: Uuid,

    pub company_id: Uuid,

    pub vehicle_id: Option<Uuid>,

    pub kind: TransactionKind,

    /// Lowercased category (e.g. "fuel", "delivery", "maintenance")
    pub category: String,

    /// Positive amount in cents
    pub amount_cents: i64,

    /// Business date of the record
    pub occurred_on: NaiveDate,

    pub description: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for creating a transaction
#[derive(Debug, Clone)]
pub struct CreateTransaction {
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub vehicle_id: Option<Uuid>,
    pub kind: TransactionKind,
    pub category: String,
    pub amount_cents: i64,
    pub occurred_on: NaiveDate,
    pub description: Option<String>,
}

/// Filter for listing a user's non-deleted transactions
///
/// All bounds are optional; dates are inclusive. `limit: None` returns every
/// matching row.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub user_id: Uuid,
    pub company_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub kind: Option<TransactionKind>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: i64,
}

impl TransactionFilter {
    /// Filter matching every non-deleted transaction of a user
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id,
            ..Default::default()
        }
    }

    /// Whether a transaction passes this filter
    pub fn matches(&self, transaction: &Transaction) -> bool {
        transaction.user_id == self.user_id
            && !transaction.is_deleted()
            && self.company_id.map_or(true, |id| transaction.company_id == id)
            && self
                .vehicle_id
                .map_or(true, |id| transaction.vehicle_id == Some(id))
            && self.kind.map_or(true, |kind| transaction.kind == kind)
            && self
                .start_date
                .map_or(true, |start| transaction.occurred_on >= start)
            && self
                .end_date
                .map_or(true, |end| transaction.occurred_on <= end)
    }
}

impl Transaction {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub async fn create(pool: &PgPool, data: CreateTransaction) -> Result<Self, sqlx::Error> {
        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            INSERT INTO transactions
                (user_id, company_id, vehicle_id, kind, category, amount_cents, occurred_on, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            TRANSACTION_COLUMNS
        ))
        .bind(data.user_id)
        .bind(data.company_id)
        .bind(data.vehicle_id)
        .bind(data.kind)
        .bind(data.category)
        .bind(data.amount_cents)
        .bind(data.occurred_on)
        .bind(data.description)
        .fetch_one(pool)
        .await?;

        Ok(transaction)
    }

    /// Finds a transaction by ID, including soft-deleted rows
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {} FROM transactions WHERE id = $1",
            TRANSACTION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(transaction)
    }

    /// Lists non-deleted transactions matching a filter, newest first
    pub async fn list(pool: &PgPool, filter: &TransactionFilter) -> Result<Vec<Self>, sqlx::Error> {
        let transactions = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            SELECT {}
            FROM transactions
            WHERE user_id = $1
              AND deleted_at IS NULL
              AND ($2::uuid IS NULL OR company_id = $2)
              AND ($3::uuid IS NULL OR vehicle_id = $3)
              AND ($4::transaction_kind IS NULL OR kind = $4)
              AND ($5::date IS NULL OR occurred_on >= $5)
              AND ($6::date IS NULL OR occurred_on <= $6)
            ORDER BY occurred_on DESC, created_at DESC
            LIMIT $7 OFFSET $8
            "#,
            TRANSACTION_COLUMNS
        ))
        .bind(filter.user_id)
        .bind(filter.company_id)
        .bind(filter.vehicle_id)
        .bind(filter.kind)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(pool)
        .await?;

        Ok(transactions)
    }

    /// Persists every mutable column
    pub async fn save(pool: &PgPool, transaction: &Transaction) -> Result<Option<Self>, sqlx::Error> {
        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            UPDATE transactions
            SET company_id = $2, vehicle_id = $3, kind = $4, category = $5,
                amount_cents = $6, occurred_on = $7, description = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            TRANSACTION_COLUMNS
        ))
        .bind(transaction.id)
        .bind(transaction.company_id)
        .bind(transaction.vehicle_id)
        .bind(transaction.kind)
        .bind(&transaction.category)
        .bind(transaction.amount_cents)
        .bind(transaction.occurred_on)
        .bind(&transaction.description)
        .fetch_optional(pool)
        .await?;

        Ok(transaction)
    }

    /// Stamps `deleted_at`; returns false if already deleted or missing
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE transactions SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transaction(user_id: Uuid, company_id: Uuid, day: u32) -> Transaction {
        let now = Utc::now();
        Transaction {
            id: Uuid::new_v4(),
            user_id,
            company_id,
            vehicle_id: None,
            kind: TransactionKind::Income,
            category: "delivery".to_string(),
            amount_cents: 1000,
            occurred_on: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            description: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn test_filter_matches_user_and_company() {
        let user_id = Uuid::new_v4();
        let company_id = Uuid::new_v4();
        let t = transaction(user_id, company_id, 10);

        assert!(TransactionFilter::for_user(user_id).matches(&t));
        assert!(!TransactionFilter::for_user(Uuid::new_v4()).matches(&t));

        let filter = TransactionFilter {
            company_id: Some(Uuid::new_v4()),
            ..TransactionFilter::for_user(user_id)
        };
        assert!(!filter.matches(&t));
    }

    #[test]
    fn test_filter_date_range_is_inclusive() {
        let user_id = Uuid::new_v4();
        let t = transaction(user_id, Uuid::new_v4(), 10);

        let filter = TransactionFilter {
            start_date: NaiveDate::from_ymd_opt(2025, 3, 10),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 10),
            ..TransactionFilter::for_user(user_id)
        };
        assert!(filter.matches(&t));

        let filter = TransactionFilter {
            start_date: NaiveDate::from_ymd_opt(2025, 3, 11),
            ..TransactionFilter::for_user(user_id)
        };
        assert!(!filter.matches(&t));
    }

    #[test]
    fn test_filter_excludes_deleted_and_other_kind() {
        let user_id = Uuid::new_v4();
        let mut t = transaction(user_id, Uuid::new_v4(), 1);

        let filter = TransactionFilter {
            kind: Some(TransactionKind::Expense),
            ..TransactionFilter::for_user(user_id)
        };
        assert!(!filter.matches(&t));

        t.deleted_at = Some(Utc::now());
        assert!(!TransactionFilter::for_user(user_id).matches(&t));
    }
}
