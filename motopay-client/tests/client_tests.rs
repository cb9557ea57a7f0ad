//! Client tests against a live in-memory server

use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use axum::{
    extract::Request,
    middleware::{self, Next},
};
use chrono::NaiveDate;
use motopay_api::{
    app::{build_router, AppState},
    config::Config,
};
use motopay_client::{
    types::{
        CompanyChanges, CompanyInput, ReportFilters, TransactionChanges, TransactionFilters,
        TransactionInput, TransactionKind, VehicleInput,
    },
    ClientError, MotoPayClient, Tokens,
};
use motopay_shared::store::Stores;
use reqwest::StatusCode;

const PASSWORD: &str = "pw12345678";

struct TestServer {
    url: String,
    refreshes: Arc<AtomicUsize>,
}

impl TestServer {
    async fn start() -> Self {
        let vars = HashMap::from([
            ("DATABASE_URL", "postgresql://localhost/motopay_test"),
            ("JWT_SECRET", "test-secret-key-at-least-32-bytes-long"),
        ]);
        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
            .expect("test config should load");

        let refreshes = Arc::new(AtomicUsize::new(0));
        let counter = refreshes.clone();
        let app = build_router(AppState::new(Stores::in_memory(), config)).layer(
            middleware::from_fn(move |req: Request, next: Next| {
                let counter = counter.clone();
                async move {
                    if req.uri().path() == "/auth/refresh" {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }
                    next.run(req).await
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{addr}"),
            refreshes,
        }
    }

    fn client(&self) -> MotoPayClient {
        MotoPayClient::new(&self.url).unwrap()
    }

    fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
}

#[tokio::test]
async fn test_signup_login_logout() {
    let server = TestServer::start().await;
    let client = server.client();

    let session = client
        .signup("Rider@Example.com", PASSWORD, "Rider")
        .await
        .unwrap();
    assert_eq!(session.user.email, "rider@example.com");
    assert_eq!(session.tokens.expires_in, 900);
    assert!(client.session().await.is_some());

    let me = client.me().await.unwrap();
    assert_eq!(me.id, session.user.id);

    client.logout().await.unwrap();
    assert!(client.session().await.is_none());
    assert!(matches!(client.me().await, Err(ClientError::NotAuthenticated)));

    // The revoked refresh token no longer works
    client
        .set_session(Tokens {
            access_token: "stale".to_string(),
            refresh_token: session.tokens.refresh_token.clone(),
        })
        .await;
    assert!(matches!(client.refresh().await, Err(ClientError::SessionExpired)));

    let again = client.login("rider@example.com", PASSWORD).await.unwrap();
    assert_eq!(again.user.id, session.user.id);
}

#[tokio::test]
async fn test_api_errors_carry_status_and_details() {
    let server = TestServer::start().await;
    let client = server.client();

    client.signup("a@example.com", PASSWORD, "A").await.unwrap();

    let duplicate = server
        .client()
        .signup("A@example.com", PASSWORD, "Other")
        .await
        .unwrap_err();
    assert_eq!(duplicate.status(), Some(StatusCode::CONFLICT));

    let weak = server
        .client()
        .signup("b@example.com", "short", "B")
        .await
        .unwrap_err();
    match weak {
        ClientError::Api {
            status, details, ..
        } => {
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            assert!(details.iter().any(|d| d.field == "password"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let wrong = server
        .client()
        .login("a@example.com", "wrong-password1")
        .await
        .unwrap_err();
    assert_eq!(wrong.status(), Some(StatusCode::UNAUTHORIZED));

    let missing = client.get_company(uuid::Uuid::new_v4()).await.unwrap_err();
    assert!(missing.is_not_found());
}

#[tokio::test]
async fn test_resources_and_reports() {
    let server = TestServer::start().await;
    let client = server.client();
    client.signup("rider@example.com", PASSWORD, "Rider").await.unwrap();

    let company = client
        .create_company(&CompanyInput::named("iFood"))
        .await
        .unwrap();
    let renamed = client
        .update_company(
            company.id,
            &CompanyChanges {
                name: Some("iFood Entregas".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "iFood Entregas");
    assert_eq!(client.list_companies().await.unwrap().len(), 1);

    let bike = client
        .create_vehicle(&VehicleInput::named("CG 160"))
        .await
        .unwrap();

    let income = client
        .create_transaction(&TransactionInput {
            company_id: company.id,
            vehicle_id: Some(bike.id),
            kind: TransactionKind::Income,
            category: "Delivery".to_string(),
            amount_cents: 10_000,
            occurred_on: date(1),
            description: None,
        })
        .await
        .unwrap();
    let fuel = client
        .create_transaction(&TransactionInput {
            company_id: company.id,
            vehicle_id: Some(bike.id),
            kind: TransactionKind::Expense,
            category: "fuel".to_string(),
            amount_cents: 2_500,
            occurred_on: date(2),
            description: Some("Full tank".to_string()),
        })
        .await
        .unwrap();

    let detached = client
        .update_transaction(
            fuel.id,
            &TransactionChanges {
                vehicle_id: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(detached.vehicle_id, None);

    let expenses = client
        .list_transactions(&TransactionFilters {
            kind: Some(TransactionKind::Expense),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(expenses.len(), 1);
    assert_eq!(expenses[0].id, fuel.id);

    let filters = ReportFilters {
        company_id: Some(company.id),
        ..Default::default()
    };
    let summary = client.summary(&filters).await.unwrap();
    assert_eq!(summary.total_income_cents, 10_000);
    assert_eq!(summary.total_expense_cents, 2_500);
    assert_eq!(summary.net_cents, 7_500);
    assert_eq!(summary.transaction_count, 2);

    let daily = client.daily_report(&filters).await.unwrap();
    assert_eq!(daily.days.len(), 2);

    let categories = client.category_report(&filters).await.unwrap();
    assert_eq!(categories.categories.len(), 2);

    let vehicles = client.vehicle_report(&filters).await.unwrap();
    assert!(vehicles
        .vehicles
        .iter()
        .any(|v| v.vehicle_id == Some(bike.id) && v.income_cents == 10_000));
    assert!(vehicles
        .vehicles
        .iter()
        .any(|v| v.vehicle_id.is_none() && v.expense_cents == 2_500));

    client.delete_transaction(income.id).await.unwrap();
    assert!(client.get_transaction(income.id).await.unwrap_err().is_not_found());

    client.delete_vehicle(bike.id).await.unwrap();
    assert!(client.list_vehicles().await.unwrap().is_empty());

    client.delete_company(company.id).await.unwrap();
    assert!(client.get_company(company.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_expired_access_token_is_refreshed_once() {
    let server = TestServer::start().await;
    let client = server.client();
    let session = client
        .signup("rider@example.com", PASSWORD, "Rider")
        .await
        .unwrap();

    client
        .set_session(Tokens {
            access_token: "not-a-jwt".to_string(),
            refresh_token: session.tokens.refresh_token.clone(),
        })
        .await;

    let results = futures::future::join_all((0..5).map(|_| client.me())).await;

    for result in results {
        assert_eq!(result.unwrap().id, session.user.id);
    }
    assert_eq!(server.refresh_count(), 1);

    let tokens = client.session().await.unwrap();
    assert_ne!(tokens.access_token, "not-a-jwt");
    assert_eq!(tokens.refresh_token, session.tokens.refresh_token);
}

#[tokio::test]
async fn test_rejected_refresh_clears_session() {
    let server = TestServer::start().await;
    let client = server.client();

    client
        .set_session(Tokens {
            access_token: "not-a-jwt".to_string(),
            refresh_token: "mpr_unknown".to_string(),
        })
        .await;

    let err = client.list_companies().await.unwrap_err();

    assert!(matches!(err, ClientError::SessionExpired));
    assert!(err.is_auth_error());
    assert!(client.session().await.is_none());
    assert_eq!(server.refresh_count(), 1);
}

#[tokio::test]
async fn test_password_change_ends_session() {
    let server = TestServer::start().await;
    let client = server.client();
    client.signup("rider@example.com", PASSWORD, "Rider").await.unwrap();

    client
        .change_password(PASSWORD, "newpass9876")
        .await
        .unwrap();
    assert!(client.session().await.is_none());

    assert!(client.login("rider@example.com", PASSWORD).await.is_err());
    client.login("rider@example.com", "newpass9876").await.unwrap();

    client.deactivate().await.unwrap();
    assert!(client.session().await.is_none());
    assert_eq!(
        client
            .login("rider@example.com", "newpass9876")
            .await
            .unwrap_err()
            .status(),
        Some(StatusCode::UNAUTHORIZED)
    );
}
