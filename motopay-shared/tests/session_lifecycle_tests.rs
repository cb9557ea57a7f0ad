//! End-to-end session lifecycle over the in-memory store

use motopay_shared::services::auth::{Signup, INVALID_REFRESH_TOKEN};
use motopay_shared::services::{AuthService, AuthSettings, ServiceError};
use motopay_shared::store::Stores;

const SECRET: &str = "integration-secret-at-least-32-characters";

fn auth() -> AuthService {
    let stores = Stores::in_memory();
    AuthService::new(stores.users, stores.refresh_tokens, AuthSettings::new(SECRET))
}

#[tokio::test]
async fn test_signup_login_refresh_logout() {
    let auth = auth();

    auth.signup(Signup {
        email: "a@x.com".to_string(),
        password: "pw12345678".to_string(),
        name: "Ana".to_string(),
    })
    .await
    .unwrap();

    let session = auth.login("a@x.com", "pw12345678").await.unwrap();
    assert!(!session.tokens.access_token.is_empty());
    let refresh_token = session.tokens.refresh_token;

    // No rotation: the same refresh token keeps working
    auth.refresh(&refresh_token).await.unwrap();
    auth.refresh(&refresh_token).await.unwrap();

    auth.logout(&refresh_token).await.unwrap();

    match auth.refresh(&refresh_token).await {
        Err(ServiceError::Unauthorized(message)) => assert_eq!(message, INVALID_REFRESH_TOKEN),
        other => panic!("expected unauthorized, got {:?}", other),
    }

    // Second logout is a no-op
    auth.logout(&refresh_token).await.unwrap();
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let auth = auth();

    let signup = auth
        .signup(Signup {
            email: "b@x.com".to_string(),
            password: "pw12345678".to_string(),
            name: "Bia".to_string(),
        })
        .await
        .unwrap();
    let login = auth.login("b@x.com", "pw12345678").await.unwrap();

    assert_ne!(signup.tokens.refresh_token, login.tokens.refresh_token);

    auth.logout(&signup.tokens.refresh_token).await.unwrap();
    assert!(auth.refresh(&login.tokens.refresh_token).await.is_ok());
}
