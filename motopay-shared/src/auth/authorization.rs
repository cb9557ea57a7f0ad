//! Record-level authorization
//!
//! Every stored record is either visible to a caller or not. The checks here
//! run in a fixed order:
//!
//! 1. **Existence**: a missing or soft-deleted record is reported as not found
//! 2. **Ownership**: a vehicle or transaction must belong to the caller
//! 3. **Membership**: a company must count the caller among its members
//!
//! # Example
//!
//! ```
//! use motopay_shared::auth::authorization::{require_owned, AuthzError};
//! use motopay_shared::models::vehicle::Vehicle;
//! use uuid::Uuid;
//!
//! fn check(vehicle: Option<Vehicle>, caller: Uuid) -> Result<Vehicle, AuthzError> {
//!     require_owned(vehicle, caller)
//! }
//! ```

use uuid::Uuid;

use crate::models::company::Company;
use crate::models::transaction::Transaction;
use crate::models::vehicle::Vehicle;

/// Error type for record access checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Record does not exist or has been soft-deleted
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Record exists but belongs to another user
    #[error("Not authorized to access this {0}")]
    NotOwner(&'static str),

    /// Caller is not a member of the company
    #[error("Not a member of company {0}")]
    NotMember(Uuid),
}

/// A record that can be soft-deleted
pub trait SoftDeletable {
    /// Human readable record kind used in error messages
    const KIND: &'static str;

    fn is_deleted(&self) -> bool;
}

/// A record owned by exactly one user
pub trait Owned: SoftDeletable {
    fn owner_id(&self) -> Uuid;
}

impl SoftDeletable for Company {
    const KIND: &'static str = "Company";

    fn is_deleted(&self) -> bool {
        Company::is_deleted(self)
    }
}

impl SoftDeletable for Vehicle {
    const KIND: &'static str = "Vehicle";

    fn is_deleted(&self) -> bool {
        Vehicle::is_deleted(self)
    }
}

impl Owned for Vehicle {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

impl SoftDeletable for Transaction {
    const KIND: &'static str = "Transaction";

    fn is_deleted(&self) -> bool {
        Transaction::is_deleted(self)
    }
}

impl Owned for Transaction {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

/// Unwraps a lookup result, rejecting missing and soft-deleted records
pub fn require_live<T: SoftDeletable>(record: Option<T>) -> Result<T, AuthzError> {
    match record {
        Some(record) if !record.is_deleted() => Ok(record),
        _ => Err(AuthzError::NotFound(T::KIND)),
    }
}

/// Like [`require_live`], and additionally requires the caller to own the record
pub fn require_owned<T: Owned>(record: Option<T>, user_id: Uuid) -> Result<T, AuthzError> {
    let record = require_live(record)?;

    if record.owner_id() != user_id {
        return Err(AuthzError::NotOwner(T::KIND));
    }

    Ok(record)
}

/// Rejects callers outside a company
pub fn require_membership(company_id: Uuid, is_member: bool) -> Result<(), AuthzError> {
    if !is_member {
        return Err(AuthzError::NotMember(company_id));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::vehicle::VehicleKind;
    use chrono::Utc;

    fn vehicle(owner: Uuid) -> Vehicle {
        let now = Utc::now();
        Vehicle {
            id: Uuid::new_v4(),
            user_id: owner,
            name: "CG 160".to_string(),
            plate: None,
            kind: VehicleKind::Motorcycle,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn test_require_owned_accepts_owner() {
        let owner = Uuid::new_v4();
        let found = require_owned(Some(vehicle(owner)), owner).unwrap();
        assert_eq!(found.user_id, owner);
    }

    #[test]
    fn test_require_owned_rejects_other_user() {
        let result = require_owned(Some(vehicle(Uuid::new_v4())), Uuid::new_v4());
        assert_eq!(result.unwrap_err(), AuthzError::NotOwner("Vehicle"));
    }

    #[test]
    fn test_missing_and_deleted_are_not_found() {
        let owner = Uuid::new_v4();
        assert_eq!(
            require_owned::<Vehicle>(None, owner).unwrap_err(),
            AuthzError::NotFound("Vehicle")
        );

        let mut deleted = vehicle(owner);
        deleted.deleted_at = Some(Utc::now());
        assert_eq!(
            require_owned(Some(deleted), owner).unwrap_err(),
            AuthzError::NotFound("Vehicle")
        );
    }

    #[test]
    fn test_not_found_takes_precedence_over_ownership() {
        let mut deleted = vehicle(Uuid::new_v4());
        deleted.deleted_at = Some(Utc::now());

        assert_eq!(
            require_owned(Some(deleted), Uuid::new_v4()).unwrap_err(),
            AuthzError::NotFound("Vehicle")
        );
    }

    #[test]
    fn test_require_membership() {
        let company_id = Uuid::new_v4();
        assert!(require_membership(company_id, true).is_ok());
        assert_eq!(
            require_membership(company_id, false).unwrap_err(),
            AuthzError::NotMember(company_id)
        );
    }
}
