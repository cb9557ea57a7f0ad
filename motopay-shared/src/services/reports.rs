//! Reports over a user's transactions
//!
//! Every report first resolves the company it is about: the requested company
//! if the user is a member and it is not deleted, otherwise the user's oldest
//! membership. A user without companies gets an empty report. The resolved id
//! is echoed back in every response.
//!
//! Aggregation is done in memory with integer cents, by the pure reducers at
//! the bottom of this module.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::transactions::check_date_range;
use super::{ServiceError, ServiceResult};
use crate::models::transaction::{Transaction, TransactionFilter, TransactionKind};
use crate::store::{CompanyStore, TransactionStore, VehicleStore};

/// Label for transactions without a vehicle
pub const UNASSIGNED_VEHICLE: &str = "Unassigned";

/// Report inputs; dates are inclusive
#[derive(Debug, Clone, Default)]
pub struct ReportQuery {
    pub company_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub company_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub total_income_cents: i64,
    pub total_expense_cents: i64,
    pub net_cents: i64,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub income_cents: i64,
    pub expense_cents: i64,
    pub net_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyReport {
    pub company_id: Option<Uuid>,
    pub days: Vec<DailyTotal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub kind: TransactionKind,
    pub category: String,
    pub total_cents: i64,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryReport {
    pub company_id: Option<Uuid>,
    pub categories: Vec<CategoryTotal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleTotal {
    /// `None` for transactions without a vehicle
    pub vehicle_id: Option<Uuid>,
    pub name: String,
    pub income_cents: i64,
    pub expense_cents: i64,
    pub net_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleReport {
    pub company_id: Option<Uuid>,
    pub vehicles: Vec<VehicleTotal>,
}

#[derive(Clone)]
pub struct ReportService {
    transactions: Arc<dyn TransactionStore>,
    companies: Arc<dyn CompanyStore>,
    vehicles: Arc<dyn VehicleStore>,
}

impl ReportService {
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

    pub async fn summary(&self, user_id: Uuid, query: ReportQuery) -> ServiceResult<Summary> {
        let (company_id, transactions) = self.load(user_id, &query).await?;
        summarize(company_id, &query, &transactions)
    }

    pub async fn daily(&self, user_id: Uuid, query: ReportQuery) -> ServiceResult<DailyReport> {
        let (company_id, transactions) = self.load(user_id, &query).await?;
        Ok(DailyReport {
            company_id,
            days: daily_totals(&transactions)?,
        })
    }

    pub async fn categories(&self, user_id: Uuid, query: ReportQuery) -> ServiceResult<CategoryReport> {
        let (company_id, transactions) = self.load(user_id, &query).await?;
        Ok(CategoryReport {
            company_id,
            categories: category_totals(&transactions)?,
        })
    }

    pub async fn vehicles(&self, user_id: Uuid, query: ReportQuery) -> ServiceResult<VehicleReport> {
        let (company_id, transactions) = self.load(user_id, &query).await?;

        // Deleted vehicles keep their names in reports
        let names: HashMap<Uuid, String> = self
            .vehicles
            .list_by_user(user_id, true)
            .await?
            .into_iter()
            .map(|v| (v.id, v.name))
            .collect();

        Ok(VehicleReport {
            company_id,
            vehicles: vehicle_totals(&transactions, &names)?,
        })
    }

    /// Picks the company a report is about
    pub async fn resolve_company(
        &self,
        user_id: Uuid,
        requested: Option<Uuid>,
    ) -> ServiceResult<Option<Uuid>> {
        if let Some(company_id) = requested {
            let usable = match self.companies.find_by_id(company_id).await? {
                Some(company) if !company.is_deleted() => {
                    self.companies.is_member(company.id, user_id).await?
                }
                _ => false,
            };
            if usable {
                return Ok(Some(company_id));
            }
            debug!(user_id = %user_id, requested = %company_id, "Falling back to first company");
        }

        let companies = self.companies.list_for_user(user_id).await?;
        Ok(companies.first().map(|c| c.id))
    }

    async fn load(
        &self,
        user_id: Uuid,
        query: &ReportQuery,
    ) -> ServiceResult<(Option<Uuid>, Vec<Transaction>)> {
        check_date_range(query.start_date, query.end_date)?;

        let Some(company_id) = self.resolve_company(user_id, query.company_id).await? else {
            return Ok((None, Vec::new()));
        };

        let filter = TransactionFilter {
            company_id: Some(company_id),
            start_date: query.start_date,
            end_date: query.end_date,
            ..TransactionFilter::for_user(user_id)
        };
        let transactions = self.transactions.list(&filter).await?;

        Ok((Some(company_id), transactions))
    }
}

/// Adds cents, failing instead of wrapping
fn add_cents(total: i64, cents: i64) -> ServiceResult<i64> {
    total
        .checked_add(cents)
        .ok_or_else(|| ServiceError::Internal("report total overflows i64 cents".to_string()))
}

fn split(transaction: &Transaction) -> (i64, i64) {
    match transaction.kind {
        TransactionKind::Income => (transaction.amount_cents, 0),
        TransactionKind::Expense => (0, transaction.amount_cents),
    }
}

/// Totals over all transactions
pub fn summarize(
    company_id: Option<Uuid>,
    query: &ReportQuery,
    transactions: &[Transaction],
) -> ServiceResult<Summary> {
    let (mut income, mut expense) = (0, 0);
    for (i, e) in transactions.iter().map(split) {
        income = add_cents(income, i)?;
        expense = add_cents(expense, e)?;
    }

    Ok(Summary {
        company_id,
        start_date: query.start_date,
        end_date: query.end_date,
        total_income_cents: income,
        total_expense_cents: expense,
        net_cents: income - expense,
        transaction_count: transactions.len(),
    })
}

/// Per-day totals, oldest day first
pub fn daily_totals(transactions: &[Transaction]) -> ServiceResult<Vec<DailyTotal>> {
    let mut days: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();

    for transaction in transactions {
        let (income, expense) = split(transaction);
        let day = days.entry(transaction.occurred_on).or_default();
        day.0 = add_cents(day.0, income)?;
        day.1 = add_cents(day.1, expense)?;
    }

    Ok(days
        .into_iter()
        .map(|(date, (income, expense))| DailyTotal {
            date,
            income_cents: income,
            expense_cents: expense,
            net_cents: income - expense,
        })
        .collect())
}

/// Per (kind, category) totals, largest first, ties by category name
pub fn category_totals(transactions: &[Transaction]) -> ServiceResult<Vec<CategoryTotal>> {
    let mut groups: HashMap<(TransactionKind, &str), (i64, usize)> = HashMap::new();

    for transaction in transactions {
        let group = groups
            .entry((transaction.kind, transaction.category.as_str()))
            .or_default();
        group.0 = add_cents(group.0, transaction.amount_cents)?;
        group.1 += 1;
    }

    let mut totals: Vec<CategoryTotal> = groups
        .into_iter()
        .map(|((kind, category), (total, count))| CategoryTotal {
            kind,
            category: category.to_string(),
            total_cents: total,
            transaction_count: count,
        })
        .collect();

    totals.sort_by(|a, b| {
        b.total_cents
            .cmp(&a.total_cents)
            .then_with(|| a.category.cmp(&b.category))
            .then_with(|| a.kind.cmp(&b.kind))
    });

    Ok(totals)
}

/// Per-vehicle totals, largest turnover first, ties by name
pub fn vehicle_totals(
    transactions: &[Transaction],
    names: &HashMap<Uuid, String>,
) -> ServiceResult<Vec<VehicleTotal>> {
    let mut groups: HashMap<Option<Uuid>, (i64, i64)> = HashMap::new();

    for transaction in transactions {
        let (income, expense) = split(transaction);
        let group = groups.entry(transaction.vehicle_id).or_default();
        group.0 = add_cents(group.0, income)?;
        group.1 = add_cents(group.1, expense)?;
    }

    let mut totals: Vec<VehicleTotal> = groups
        .into_iter()
        .map(|(vehicle_id, (income, expense))| VehicleTotal {
            vehicle_id,
            name: match vehicle_id {
                Some(id) => names
                    .get(&id)
                    .cloned()
                    .unwrap_or_else(|| "Unknown vehicle".to_string()),
                None => UNASSIGNED_VEHICLE.to_string(),
            },
            income_cents: income,
            expense_cents: expense,
            net_cents: income - expense,
        })
        .collect();

    // Turnover of two non-negative i64 totals fits in i128
    let turnover = |t: &VehicleTotal| i128::from(t.income_cents) + i128::from(t.expense_cents);
    totals.sort_by(|a, b| {
        turnover(b)
            .cmp(&turnover(a))
            .then_with(|| a.name.cmp(&b.name))
    });

    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::company::CreateCompany;
    use crate::models::transaction::CreateTransaction;
    use crate::models::vehicle::{CreateVehicle, VehicleKind};
    use crate::store::Stores;
    use chrono::Utc;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, day).unwrap()
    }

    fn tx(kind: TransactionKind, category: &str, cents: i64, day: u32, vehicle_id: Option<Uuid>) -> Transaction {
        let now = Utc::now();
        Transaction {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            company_id: Uuid::nil(),
            vehicle_id,
            kind,
            category: category.to_string(),
            amount_cents: cents,
            occurred_on: date(day),
            description: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn test_summarize() {
        let transactions = vec![
            tx(TransactionKind::Income, "delivery", 10_000, 1, None),
            tx(TransactionKind::Income, "tip", 1_500, 1, None),
            tx(TransactionKind::Expense, "fuel", 3_000, 2, None),
        ];

        let summary = summarize(None, &ReportQuery::default(), &transactions).unwrap();
        assert_eq!(summary.total_income_cents, 11_500);
        assert_eq!(summary.total_expense_cents, 3_000);
        assert_eq!(summary.net_cents, 8_500);
        assert_eq!(summary.transaction_count, 3);
    }

    #[test]
    fn test_daily_totals_sorted_ascending() {
        let transactions = vec![
            tx(TransactionKind::Income, "delivery", 500, 3, None),
            tx(TransactionKind::Expense, "fuel", 200, 1, None),
            tx(TransactionKind::Income, "delivery", 700, 1, None),
        ];

        let days = daily_totals(&transactions).unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, date(1));
        assert_eq!(days[0].income_cents, 700);
        assert_eq!(days[0].expense_cents, 200);
        assert_eq!(days[0].net_cents, 500);
        assert_eq!(days[1].date, date(3));
    }

    #[test]
    fn test_category_totals_sorted_by_magnitude_then_name() {
        let transactions = vec![
            tx(TransactionKind::Expense, "fuel", 300, 1, None),
            tx(TransactionKind::Expense, "fuel", 300, 2, None),
            tx(TransactionKind::Income, "tip", 600, 1, None),
            tx(TransactionKind::Income, "delivery", 900, 1, None),
        ];

        let totals = category_totals(&transactions).unwrap();
        let order: Vec<&str> = totals.iter().map(|t| t.category.as_str()).collect();
        assert_eq!(order, vec!["delivery", "fuel", "tip"]);
        assert_eq!(totals[1].transaction_count, 2);
        assert_eq!(totals[1].kind, TransactionKind::Expense);
    }

    #[test]
    fn test_vehicle_totals_group_unassigned() {
        let bike = Uuid::new_v4();
        let names = HashMap::from([(bike, "CG 160".to_string())]);
        let transactions = vec![
            tx(TransactionKind::Income, "delivery", 1_000, 1, Some(bike)),
            tx(TransactionKind::Expense, "fuel", 400, 1, Some(bike)),
            tx(TransactionKind::Income, "delivery", 200, 1, None),
        ];

        let totals = vehicle_totals(&transactions, &names).unwrap();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].name, "CG 160");
        assert_eq!(totals[0].net_cents, 600);
        assert_eq!(totals[1].vehicle_id, None);
        assert_eq!(totals[1].name, UNASSIGNED_VEHICLE);
    }

    #[test]
    fn test_reducers_reject_overflowing_totals() {
        let big = i64::MAX / 2 + 1;
        let bike = Uuid::new_v4();
        let transactions = vec![
            tx(TransactionKind::Income, "delivery", big, 1, Some(bike)),
            tx(TransactionKind::Income, "delivery", big, 1, Some(bike)),
        ];

        assert!(matches!(
            summarize(None, &ReportQuery::default(), &transactions),
            Err(ServiceError::Internal(_))
        ));
        assert!(matches!(daily_totals(&transactions), Err(ServiceError::Internal(_))));
        assert!(matches!(category_totals(&transactions), Err(ServiceError::Internal(_))));
        assert!(matches!(
            vehicle_totals(&transactions, &HashMap::new()),
            Err(ServiceError::Internal(_))
        ));
    }

    #[test]
    fn test_vehicle_order_with_large_turnover() {
        let (car, bike) = (Uuid::new_v4(), Uuid::new_v4());
        let transactions = vec![
            tx(TransactionKind::Income, "delivery", i64::MAX, 1, Some(car)),
            tx(TransactionKind::Expense, "fuel", i64::MAX, 1, Some(car)),
            tx(TransactionKind::Income, "delivery", 100, 1, Some(bike)),
        ];

        let totals = vehicle_totals(&transactions, &HashMap::new()).unwrap();
        assert_eq!(totals[0].vehicle_id, Some(car));
        assert_eq!(totals[0].net_cents, 0);
    }

    struct Fixture {
        stores: Stores,
        reports: ReportService,
        user_id: Uuid,
    }

    fn fixture() -> Fixture {
        let stores = Stores::in_memory();
        let reports = ReportService::new(
            stores.transactions.clone(),
            stores.companies.clone(),
            stores.vehicles.clone(),
        );
        Fixture {
            stores,
            reports,
            user_id: Uuid::new_v4(),
        }
    }

    impl Fixture {
        async fn company(&self, name: &str, created_by: Uuid) -> Uuid {
            self.stores
                .companies
                .create(CreateCompany {
                    name: name.to_string(),
                    description: None,
                    created_by,
                })
                .await
                .unwrap()
                .id
        }

        async fn record(&self, company_id: Uuid, vehicle_id: Option<Uuid>, cents: i64, day: u32) {
            self.stores
                .transactions
                .create(CreateTransaction {
                    user_id: self.user_id,
                    company_id,
                    vehicle_id,
                    kind: TransactionKind::Income,
                    category: "delivery".to_string(),
                    amount_cents: cents,
                    occurred_on: date(day),
                    description: None,
                })
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_user_without_company_gets_empty_report() {
        let f = fixture();

        let summary = f.reports.summary(f.user_id, ReportQuery::default()).await.unwrap();
        assert_eq!(summary.company_id, None);
        assert_eq!(summary.transaction_count, 0);
    }

    #[tokio::test]
    async fn test_foreign_company_falls_back_to_first_membership() {
        let f = fixture();
        let first = f.company("iFood", f.user_id).await;
        let second = f.company("Rappi", f.user_id).await;
        let foreign = f.company("Other", Uuid::new_v4()).await;
        f.record(first, None, 1_000, 1).await;
        f.record(second, None, 5_000, 1).await;

        let summary = f
            .reports
            .summary(
                f.user_id,
                ReportQuery {
                    company_id: Some(foreign),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(summary.company_id, Some(first));
        assert_eq!(summary.total_income_cents, 1_000);

        let summary = f
            .reports
            .summary(
                f.user_id,
                ReportQuery {
                    company_id: Some(second),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(summary.company_id, Some(second));
        assert_eq!(summary.total_income_cents, 5_000);
    }

    #[tokio::test]
    async fn test_deleted_company_falls_back() {
        let f = fixture();
        let first = f.company("iFood", f.user_id).await;
        let second = f.company("Rappi", f.user_id).await;
        f.stores.companies.soft_delete(first).await.unwrap();

        let resolved = f.reports.resolve_company(f.user_id, Some(first)).await.unwrap();
        assert_eq!(resolved, Some(second));
    }

    #[tokio::test]
    async fn test_summary_of_huge_amounts_fails_without_panicking() {
        let f = fixture();
        let company = f.company("iFood", f.user_id).await;
        f.record(company, None, i64::MAX / 2 + 1, 1).await;
        f.record(company, None, i64::MAX / 2 + 1, 2).await;

        let result = f.reports.summary(f.user_id, ReportQuery::default()).await;
        assert!(matches!(result, Err(ServiceError::Internal(_))));
    }

    #[tokio::test]
    async fn test_date_range_is_inclusive() {
        let f = fixture();
        let company = f.company("iFood", f.user_id).await;
        for day in [1, 2, 3, 4] {
            f.record(company, None, 100, day).await;
        }

        let daily = f
            .reports
            .daily(
                f.user_id,
                ReportQuery {
                    company_id: Some(company),
                    start_date: Some(date(2)),
                    end_date: Some(date(3)),
                },
            )
            .await
            .unwrap();
        let dates: Vec<NaiveDate> = daily.days.iter().map(|d| d.date).collect();
        assert_eq!(dates, vec![date(2), date(3)]);
    }

    #[tokio::test]
    async fn test_vehicle_report_names_deleted_vehicles() {
        let f = fixture();
        let company = f.company("iFood", f.user_id).await;
        let vehicle = f
            .stores
            .vehicles
            .create(CreateVehicle {
                user_id: f.user_id,
                name: "CG 160".to_string(),
                plate: None,
                kind: VehicleKind::Motorcycle,
            })
            .await
            .unwrap();
        f.record(company, Some(vehicle.id), 2_000, 1).await;
        f.stores.vehicles.soft_delete(vehicle.id).await.unwrap();

        let report = f
            .reports
            .vehicles(f.user_id, ReportQuery::default())
            .await
            .unwrap();
        assert_eq!(report.company_id, Some(company));
        assert_eq!(report.vehicles.len(), 1);
        assert_eq!(report.vehicles[0].name, "CG 160");
    }
}
