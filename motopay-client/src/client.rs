//! MotoPay REST client

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{ClientError, ClientResult};
use crate::session::{SessionStore, Tokens};
use crate::types::*;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Async client for the MotoPay API
///
/// Cloning is cheap; clones share the HTTP connection pool and the session.
#[derive(Debug, Clone)]
pub struct MotoPayClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl MotoPayClient {
    /// Creates a client for `base_url` (e.g. `https://api.motopay.app`)
    pub fn new(base_url: impl Into<String>) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(concat!("motopay-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::with_http_client(base_url, http))
    }

    pub fn with_http_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        let base_url: String = base_url.into();

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session: Arc::new(SessionStore::new()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Tokens of the stored session, if any
    pub async fn session(&self) -> Option<Tokens> {
        self.session.tokens().await
    }

    /// Restores a session saved by the app
    pub async fn set_session(&self, tokens: Tokens) {
        self.session.replace(tokens).await;
    }

    pub async fn clear_session(&self) {
        self.session.clear().await;
    }

    // Session lifecycle

    pub async fn signup(&self, email: &str, password: &str, name: &str) -> ClientResult<Session> {
        let body = Credentials {
            email,
            password,
            name: Some(name),
        };
        self.open_session("/auth/signup", &body).await
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<Session> {
        let body = Credentials {
            email,
            password,
            name: None,
        };
        self.open_session("/auth/login", &body).await
    }

    /// Exchanges the stored refresh token for a new access token
    ///
    /// # Errors
    ///
    /// - `NotAuthenticated` without a stored session
    /// - `SessionExpired` if the server rejects the refresh token; the
    ///   session is cleared
    pub async fn refresh(&self) -> ClientResult<RefreshedAccess> {
        let _gate = self.session.lock_refresh().await;
        let tokens = self
            .session
            .tokens()
            .await
            .ok_or(ClientError::NotAuthenticated)?;

        self.exchange(&tokens).await
    }

    /// Revokes the refresh token and forgets the session
    ///
    /// The local session is cleared even when the server cannot be reached.
    pub async fn logout(&self) -> ClientResult<()> {
        let Some(tokens) = self.session.tokens().await else {
            return Ok(());
        };
        self.session.clear().await;

        let response = self
            .http
            .post(self.url("/auth/logout"))
            .json(&RefreshTokenBody {
                refresh_token: &tokens.refresh_token,
            })
            .send()
            .await?;
        decode::<Ack>(response).await?;

        Ok(())
    }

    pub async fn me(&self) -> ClientResult<UserProfile> {
        self.authed(Method::GET, "/auth/me", |r| r).await
    }

    pub async fn update_profile(&self, changes: &ProfileChanges) -> ClientResult<UserProfile> {
        self.authed(Method::PATCH, "/users/me", |r| r.json(changes))
            .await
    }

    /// Changes the password; the server ends every session of the user, so
    /// the stored session is cleared as well
    pub async fn change_password(&self, current: &str, new: &str) -> ClientResult<()> {
        let body = PasswordChange {
            current_password: current,
            new_password: new,
        };
        self.authed::<Ack, _>(Method::POST, "/users/me/password", |r| r.json(&body))
            .await?;
        self.session.clear().await;

        Ok(())
    }

    pub async fn deactivate(&self) -> ClientResult<()> {
        self.authed::<Ack, _>(Method::DELETE, "/users/me", |r| r)
            .await?;
        self.session.clear().await;

        Ok(())
    }

    // Companies

    pub async fn create_company(&self, input: &CompanyInput) -> ClientResult<Company> {
        self.authed(Method::POST, "/companies", |r| r.json(input)).await
    }

    pub async fn list_companies(&self) -> ClientResult<Vec<Company>> {
        self.authed(Method::GET, "/companies", |r| r).await
    }

    pub async fn get_company(&self, id: Uuid) -> ClientResult<Company> {
        self.authed(Method::GET, &format!("/companies/{id}"), |r| r)
            .await
    }

    pub async fn update_company(&self, id: Uuid, changes: &CompanyChanges) -> ClientResult<Company> {
        self.authed(Method::PUT, &format!("/companies/{id}"), |r| r.json(changes))
            .await
    }

    pub async fn delete_company(&self, id: Uuid) -> ClientResult<()> {
        self.delete(&format!("/companies/{id}")).await
    }

    // Vehicles

    pub async fn create_vehicle(&self, input: &VehicleInput) -> ClientResult<Vehicle> {
        self.authed(Method::POST, "/vehicles", |r| r.json(input)).await
    }

    pub async fn list_vehicles(&self) -> ClientResult<Vec<Vehicle>> {
        self.authed(Method::GET, "/vehicles", |r| r).await
    }

    pub async fn get_vehicle(&self, id: Uuid) -> ClientResult<Vehicle> {
        self.authed(Method::GET, &format!("/vehicles/{id}"), |r| r)
            .await
    }

    pub async fn update_vehicle(&self, id: Uuid, changes: &VehicleChanges) -> ClientResult<Vehicle> {
        self.authed(Method::PUT, &format!("/vehicles/{id}"), |r| r.json(changes))
            .await
    }

    pub async fn delete_vehicle(&self, id: Uuid) -> ClientResult<()> {
        self.delete(&format!("/vehicles/{id}")).await
    }

    // Transactions

    pub async fn create_transaction(&self, input: &TransactionInput) -> ClientResult<Transaction> {
        self.authed(Method::POST, "/transactions", |r| r.json(input))
            .await
    }

    pub async fn list_transactions(
        &self,
        filters: &TransactionFilters,
    ) -> ClientResult<Vec<Transaction>> {
        self.authed(Method::GET, "/transactions", |r| r.query(filters))
            .await
    }

    pub async fn get_transaction(&self, id: Uuid) -> ClientResult<Transaction> {
        self.authed(Method::GET, &format!("/transactions/{id}"), |r| r)
            .await
    }

    pub async fn update_transaction(
        &self,
        id: Uuid,
        changes: &TransactionChanges,
    ) -> ClientResult<Transaction> {
        self.authed(Method::PUT, &format!("/transactions/{id}"), |r| {
            r.json(changes)
        })
        .await
    }

    pub async fn delete_transaction(&self, id: Uuid) -> ClientResult<()> {
        self.delete(&format!("/transactions/{id}")).await
    }

    // Reports

    pub async fn summary(&self, filters: &ReportFilters) -> ClientResult<Summary> {
        self.report("summary", filters).await
    }

    pub async fn daily_report(&self, filters: &ReportFilters) -> ClientResult<DailyReport> {
        self.report("daily", filters).await
    }

    pub async fn category_report(&self, filters: &ReportFilters) -> ClientResult<CategoryReport> {
        self.report("categories", filters).await
    }

    pub async fn vehicle_report(&self, filters: &ReportFilters) -> ClientResult<VehicleReport> {
        self.report("vehicles", filters).await
    }

    async fn report<T: DeserializeOwned>(
        &self,
        name: &str,
        filters: &ReportFilters,
    ) -> ClientResult<T> {
        self.authed(Method::GET, &format!("/reports/{name}"), |r| {
            r.query(filters)
        })
        .await
    }

    async fn delete(&self, path: &str) -> ClientResult<()> {
        self.authed::<Ack, _>(Method::DELETE, path, |r| r).await?;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn open_session<B: Serialize>(&self, path: &str, body: &B) -> ClientResult<Session> {
        let response = self.http.post(self.url(path)).json(body).send().await?;
        let session: Session = decode(response).await?;

        self.session
            .replace(Tokens {
                access_token: session.tokens.access_token.clone(),
                refresh_token: session.tokens.refresh_token.clone(),
            })
            .await;
        debug!(user_id = %session.user.id, "Session opened");

        Ok(session)
    }

    /// Sends an authenticated request, refreshing once on 401
    ///
    /// `customize` is applied to each attempt, so it must be repeatable.
    async fn authed<T, F>(&self, method: Method, path: &str, customize: F) -> ClientResult<T>
    where
        T: DeserializeOwned,
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let (tokens, generation) = self.session.snapshot().await;
        let tokens = tokens.ok_or(ClientError::NotAuthenticated)?;

        let response = self
            .send_as(&method, path, &tokens.access_token, &customize)
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return decode(response).await;
        }

        debug!(path, "Access token rejected, refreshing");
        self.refresh_after(generation).await?;

        let tokens = self
            .session
            .tokens()
            .await
            .ok_or(ClientError::SessionExpired)?;
        let response = self
            .send_as(&method, path, &tokens.access_token, &customize)
            .await?;

        decode(response).await
    }

    async fn send_as<F>(
        &self,
        method: &Method,
        path: &str,
        access_token: &str,
        customize: &F,
    ) -> ClientResult<Response>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let request = self
            .http
            .request(method.clone(), self.url(path))
            .bearer_auth(access_token);

        Ok(customize(request).send().await?)
    }

    /// Refreshes unless the session moved past `seen` while we waited
    async fn refresh_after(&self, seen: u64) -> ClientResult<()> {
        let _gate = self.session.lock_refresh().await;

        let (tokens, generation) = self.session.snapshot().await;
        let tokens = tokens.ok_or(ClientError::SessionExpired)?;
        if generation != seen {
            debug!("Session already refreshed by another request");
            return Ok(());
        }

        self.exchange(&tokens).await.map(|_| ())
    }

    /// Calls `/auth/refresh`; the caller holds the refresh gate
    async fn exchange(&self, tokens: &Tokens) -> ClientResult<RefreshedAccess> {
        let response = self
            .http
            .post(self.url("/auth/refresh"))
            .json(&RefreshTokenBody {
                refresh_token: &tokens.refresh_token,
            })
            .send()
            .await?;

        match decode::<RefreshedAccess>(response).await {
            Ok(access) => {
                let refresh_token = access
                    .refresh_token
                    .clone()
                    .unwrap_or_else(|| tokens.refresh_token.clone());
                self.session
                    .replace(Tokens {
                        access_token: access.access_token.clone(),
                        refresh_token,
                    })
                    .await;
                Ok(access)
            }
            Err(ClientError::Api { status, .. }) if status.is_client_error() => {
                warn!(%status, "Refresh token rejected, clearing session");
                self.session.clear().await;
                Err(ClientError::SessionExpired)
            }
            Err(e) => Err(e),
        }
    }
}

/// Unwraps `{ "data": ... }` or turns an error body into `ClientError::Api`
async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status();

    if status.is_success() {
        let envelope: Envelope<T> = response.json().await?;
        return Ok(envelope.data);
    }

    let bytes = response.bytes().await?;
    let error = match serde_json::from_slice::<ErrorBody>(&bytes) {
        Ok(body) => ClientError::Api {
            status,
            code: body.error,
            message: body.message,
            details: body.details,
        },
        Err(_) => ClientError::Api {
            status,
            code: "unknown".to_string(),
            message: String::from_utf8_lossy(&bytes).into_owned(),
            details: Vec::new(),
        },
    };

    Err(error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = MotoPayClient::new("http://localhost:8080/").unwrap();

        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(client.url("/auth/me"), "http://localhost:8080/auth/me");
    }

    #[tokio::test]
    async fn test_authenticated_call_without_session() {
        let client = MotoPayClient::new("http://localhost:9").unwrap();

        assert!(matches!(
            client.me().await,
            Err(ClientError::NotAuthenticated)
        ));
        assert!(matches!(
            client.refresh().await,
            Err(ClientError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_logout_without_session_is_noop() {
        let client = MotoPayClient::new("http://localhost:9").unwrap();

        assert!(client.logout().await.is_ok());
    }
}
