//! Company service
//!
//! Any member of a company may read, rename or delete it.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use super::{optional_text, required_text, ServiceResult, MAX_DESCRIPTION_LENGTH, MAX_NAME_LENGTH};
use crate::auth::authorization::{require_live, require_membership};
use crate::models::company::{Company, CreateCompany};
use crate::store::CompanyStore;

/// Company creation input
#[derive(Debug, Clone)]
pub struct NewCompany {
    pub name: String,
    pub description: Option<String>,
}

/// Company changes; `None` leaves a field untouched, a blank description clears it
#[derive(Debug, Clone, Default)]
pub struct CompanyUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct CompanyService {
    companies: Arc<dyn CompanyStore>,
}

impl CompanyService {
    pub fn new(companies: Arc<dyn CompanyStore>) -> Self {
        Self { companies }
    }

    pub async fn create(&self, user_id: Uuid, input: NewCompany) -> ServiceResult<Company> {
        let company = self
            .companies
            .create(CreateCompany {
                name: required_text("name", &input.name, MAX_NAME_LENGTH)?,
                description: optional_text(
                    "description",
                    input.description.as_deref(),
                    MAX_DESCRIPTION_LENGTH,
                )?,
                created_by: user_id,
            })
            .await?;

        info!(user_id = %user_id, company_id = %company.id, "Company created");
        Ok(company)
    }

    /// Non-deleted companies the user belongs to, oldest membership first
    pub async fn list(&self, user_id: Uuid) -> ServiceResult<Vec<Company>> {
        Ok(self.companies.list_for_user(user_id).await?)
    }

    /// # Errors
    ///
    /// - `NotFound` if the company is missing or deleted
    /// - `Forbidden` if the user is not a member
    pub async fn get(&self, user_id: Uuid, company_id: Uuid) -> ServiceResult<Company> {
        let company = require_live(self.companies.find_by_id(company_id).await?)?;
        let is_member = self.companies.is_member(company.id, user_id).await?;
        require_membership(company.id, is_member)?;

        Ok(company)
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        update: CompanyUpdate,
    ) -> ServiceResult<Company> {
        let mut company = self.get(user_id, company_id).await?;

        if let Some(name) = update.name.as_deref() {
            company.name = required_text("name", name, MAX_NAME_LENGTH)?;
        }
        if let Some(description) = update.description.as_deref() {
            company.description =
                optional_text("description", Some(description), MAX_DESCRIPTION_LENGTH)?;
        }

        let saved = self.companies.save(&company).await?;
        Ok(require_live(saved)?)
    }

    /// Soft-deletes the company; its transactions are kept
    pub async fn delete(&self, user_id: Uuid, company_id: Uuid) -> ServiceResult<()> {
        let company = self.get(user_id, company_id).await?;

        if self.companies.soft_delete(company.id).await? {
            info!(user_id = %user_id, company_id = %company.id, "Company deleted");
        }

        Ok(())
    }
}
