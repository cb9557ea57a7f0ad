//! Transaction (income/expense record) service
//!
//! Records reference a company the caller belongs to and optionally a vehicle
//! the caller owns. References are checked whenever they are set; a record
//! whose company or vehicle was deleted later stays readable and editable.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use super::{
    optional_text, required_text, ServiceError, ServiceResult, MAX_CATEGORY_LENGTH,
    MAX_DESCRIPTION_LENGTH,
};
use crate::auth::authorization::{require_live, require_membership, require_owned};
use crate::models::transaction::{
    CreateTransaction, Transaction, TransactionFilter, TransactionKind,
};
use crate::store::{CompanyStore, TransactionStore, VehicleStore};

/// Page size when the caller does not ask for one
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Largest page a caller may request
pub const MAX_PAGE_SIZE: i64 = 500;

/// Largest amount of a single record (one billion in currency units)
pub const MAX_AMOUNT_CENTS: i64 = 100_000_000_000;

/// Transaction creation input
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub company_id: Uuid,
    pub vehicle_id: Option<Uuid>,
    pub kind: TransactionKind,
    pub category: String,
    pub amount_cents: i64,
    pub occurred_on: NaiveDate,
    pub description: Option<String>,
}

/// Transaction changes
///
/// `None` leaves a field untouched. `vehicle_id: Some(None)` detaches the
/// vehicle; a blank description clears it.
#[derive(Debug, Clone, Default)]
pub struct TransactionUpdate {
    pub company_id: Option<Uuid>,
    pub vehicle_id: Option<Option<Uuid>>,
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
    pub amount_cents: Option<i64>,
    pub occurred_on: Option<NaiveDate>,
    pub description: Option<String>,
}

/// Listing query; every bound is optional and dates are inclusive
#[derive(Debug, Clone, Default)]
pub struct TransactionQuery {
    pub company_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub kind: Option<TransactionKind>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn normalize_category(category: &str) -> ServiceResult<String> {
    Ok(required_text("category", category, MAX_CATEGORY_LENGTH)?.to_lowercase())
}

fn check_amount(amount_cents: i64) -> ServiceResult<i64> {
    if amount_cents <= 0 {
        return Err(ServiceError::validation(
            "amount_cents",
            "must be greater than zero",
        ));
    }
    if amount_cents > MAX_AMOUNT_CENTS {
        return Err(ServiceError::validation(
            "amount_cents",
            format!("must be at most {}", MAX_AMOUNT_CENTS),
        ));
    }
    Ok(amount_cents)
}

/// Rejects a range whose start lies after its end
pub(crate) fn check_date_range(
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> ServiceResult<()> {
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start > end {
            return Err(ServiceError::validation(
                "start_date",
                "must not be after end_date",
            ));
        }
    }
    Ok(())
}

#[derive(Clone)]
pub struct TransactionService {
    transactions: Arc<dyn TransactionStore>,
    companies: Arc<dyn CompanyStore>,
    vehicles: Arc<dyn VehicleStore>,
}

impl TransactionService {
    pub fn new(
        transactions: Arc<dyn TransactionStore>,
        companies: Arc<dyn CompanyStore>,
        vehicles: Arc<dyn VehicleStore>,
    ) -> Self {
        Self {
            transactions,
            companies,
            vehicles,
        }
    }

    /// # Errors
    ///
    /// - `Validation` for a bad category, amount or description
    /// - `NotFound` / `Forbidden` if the company or vehicle is not usable
    pub async fn create(&self, user_id: Uuid, input: NewTransaction) -> ServiceResult<Transaction> {
        let category = normalize_category(&input.category)?;
        let amount_cents = check_amount(input.amount_cents)?;
        let description = optional_text(
            "description",
            input.description.as_deref(),
            MAX_DESCRIPTION_LENGTH,
        )?;

        self.check_company(user_id, input.company_id).await?;
        if let Some(vehicle_id) = input.vehicle_id {
            self.check_vehicle(user_id, vehicle_id).await?;
        }

        let transaction = self
            .transactions
            .create(CreateTransaction {
                user_id,
                company_id: input.company_id,
                vehicle_id: input.vehicle_id,
                kind: input.kind,
                category,
                amount_cents,
                occurred_on: input.occurred_on,
                description,
            })
            .await?;

        info!(
            user_id = %user_id,
            transaction_id = %transaction.id,
            company_id = %transaction.company_id,
            kind = transaction.kind.as_str(),
            "Transaction recorded"
        );
        Ok(transaction)
    }

    /// Lists the user's transactions, newest first
    pub async fn list(&self, user_id: Uuid, query: TransactionQuery) -> ServiceResult<Vec<Transaction>> {
        check_date_range(query.start_date, query.end_date)?;

        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if !(1..=MAX_PAGE_SIZE).contains(&limit) {
            return Err(ServiceError::validation(
                "limit",
                format!("must be between 1 and {}", MAX_PAGE_SIZE),
            ));
        }
        let offset = query.offset.unwrap_or(0);
        if offset < 0 {
            return Err(ServiceError::validation("offset", "must not be negative"));
        }

        let filter = TransactionFilter {
            user_id,
            company_id: query.company_id,
            vehicle_id: query.vehicle_id,
            kind: query.kind,
            start_date: query.start_date,
            end_date: query.end_date,
            limit: Some(limit),
            offset,
        };

        Ok(self.transactions.list(&filter).await?)
    }

    /// # Errors
    ///
    /// - `NotFound` if the record is missing or deleted
    /// - `Forbidden` if another user owns it
    pub async fn get(&self, user_id: Uuid, transaction_id: Uuid) -> ServiceResult<Transaction> {
        let transaction = self.transactions.find_by_id(transaction_id).await?;
        Ok(require_owned(transaction, user_id)?)
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        transaction_id: Uuid,
        update: TransactionUpdate,
    ) -> ServiceResult<Transaction> {
        let mut transaction = self.get(user_id, transaction_id).await?;

        if let Some(category) = update.category.as_deref() {
            transaction.category = normalize_category(category)?;
        }
        if let Some(amount_cents) = update.amount_cents {
            transaction.amount_cents = check_amount(amount_cents)?;
        }
        if let Some(description) = update.description.as_deref() {
            transaction.description =
                optional_text("description", Some(description), MAX_DESCRIPTION_LENGTH)?;
        }
        if let Some(kind) = update.kind {
            transaction.kind = kind;
        }
        if let Some(occurred_on) = update.occurred_on {
            transaction.occurred_on = occurred_on;
        }
        if let Some(company_id) = update.company_id {
            self.check_company(user_id, company_id).await?;
            transaction.company_id = company_id;
        }
        if let Some(vehicle_id) = update.vehicle_id {
            if let Some(id) = vehicle_id {
                self.check_vehicle(user_id, id).await?;
            }
            transaction.vehicle_id = vehicle_id;
        }

        let saved = self.transactions.save(&transaction).await?;
        Ok(require_live(saved)?)
    }

    /// Soft-deletes the record
    pub async fn delete(&self, user_id: Uuid, transaction_id: Uuid) -> ServiceResult<()> {
        let transaction = self.get(user_id, transaction_id).await?;

        if self.transactions.soft_delete(transaction.id).await? {
            info!(user_id = %user_id, transaction_id = %transaction.id, "Transaction deleted");
        }

        Ok(())
    }

    async fn check_company(&self, user_id: Uuid, company_id: Uuid) -> ServiceResult<()> {
        let company = require_live(self.companies.find_by_id(company_id).await?)?;
        let is_member = self.companies.is_member(company.id, user_id).await?;
        Ok(require_membership(company.id, is_member)?)
    }

    async fn check_vehicle(&self, user_id: Uuid, vehicle_id: Uuid) -> ServiceResult<()> {
        let vehicle = self.vehicles.find_by_id(vehicle_id).await?;
        require_owned(vehicle, user_id)?;
        Ok(())
    }
}
