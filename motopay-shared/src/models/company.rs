//! Company model and membership operations
//!
//! A company is a delivery platform or employer a driver works for. Users are
//! linked to companies through `company_memberships`; the creator of a company
//! becomes its first member.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE companies (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     name VARCHAR(100) NOT NULL,
//!     description VARCHAR(500),
//!     created_by UUID NOT NULL REFERENCES users(id),
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     deleted_at TIMESTAMPTZ
//! );
//!
//! CREATE TABLE company_memberships (
//!     company_id UUID NOT NULL REFERENCES companies(id),
//!     user_id UUID NOT NULL REFERENCES users(id),
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     PRIMARY KEY (company_id, user_id)
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const COMPANY_COLUMNS: &str = "c.id, c.name, c.description, c.created_by, c.created_at, \
                               c.updated_at, c.deleted_at";

/// Company model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Company {
    pub id: Uuid,

    /// Display name (e.g. "iFood", "Uber Eats")
    pub name: String,

    pub description: Option<String>,

    /// User who registered the company
    pub created_by: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Soft-delete timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for creating a company
#[derive(Debug, Clone)]
pub struct CreateCompany {
    pub name: String,
    pub description: Option<String>,
    pub created_by: Uuid,
}

impl Company {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Creates a company and the creator's membership in one transaction
    pub async fn create(pool: &PgPool, data: CreateCompany) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let company = sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (name, description, created_by)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, created_by, created_at, updated_at, deleted_at
            "#,
        )
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.created_by)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO company_memberships (company_id, user_id) VALUES ($1, $2)")
            .bind(company.id)
            .bind(data.created_by)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(company)
    }

    /// Finds a company by ID, including soft-deleted companies
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let company = sqlx::query_as::<_, Company>(&format!(
            "SELECT {} FROM companies c WHERE c.id = $1",
            COMPANY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(company)
    }

    /// Lists non-deleted companies the user is a member of, oldest membership first
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let companies = sqlx::query_as::<_, Company>(&format!(
            r#"
            SELECT {}
            FROM companies c
            JOIN company_memberships m ON m.company_id = c.id
            WHERE m.user_id = $1 AND c.deleted_at IS NULL
            ORDER BY m.created_at ASC, c.name ASC
            "#,
            COMPANY_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(companies)
    }

    /// Checks whether a user is a member of a company
    pub async fn is_member(pool: &PgPool, company_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM company_memberships
                WHERE company_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(company_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Persists name and description
    pub async fn save(pool: &PgPool, company: &Company) -> Result<Option<Self>, sqlx::Error> {
        let company = sqlx::query_as::<_, Company>(
            r#"
            UPDATE companies
            SET name = $2, description = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, created_by, created_at, updated_at, deleted_at
            "#,
        )
        .bind(company.id)
        .bind(&company.name)
        .bind(&company.description)
        .fetch_optional(pool)
        .await?;

        Ok(company)
    }

    /// Stamps `deleted_at`; returns false if already deleted or missing
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE companies SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
