//! End-to-end HTTP flows over the router and a migrated SQLite store.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sea_orm_migration::MigratorTrait;
use tower::ServiceExt;

use account_service::application::{AccountService, IdentitySettings};
use account_service::domain::{DomainResult, NotificationSender, PasswordHasher, RepositoryProvider};
use account_service::infrastructure::crypto::password::MIN_COST;
use account_service::infrastructure::crypto::{BcryptHasher, JwtConfig, TokenCodec};
use account_service::infrastructure::database::migrator::Migrator;
use account_service::shared::{Clock, SystemClock};
use account_service::{
    create_api_router, init_database, AppState, DatabaseConfig, SeaOrmRepositoryProvider,
};

const SECRET: &str = "integration-secret-integration-secret";
const PASSWORD: &str = "Abc12345!";
const ADMIN_EMAIL: &str = "admin@x.com";

/// Keeps the last token mailed to each address.
#[derive(Default)]
struct Outbox(Mutex<Vec<(String, String)>>);

impl Outbox {
    fn last_for(&self, email: &str) -> String {
        self.0
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, token)| token.clone())
            .expect("no mail for address")
    }
}

#[async_trait]
impl NotificationSender for Outbox {
    async fn send_verification(&self, email: &str, token: &str) -> DomainResult<()> {
        self.0.lock().unwrap().push((email.into(), token.into()));
        Ok(())
    }

    async fn send_password_reset(&self, email: &str, token: &str) -> DomainResult<()> {
        self.0.lock().unwrap().push((email.into(), token.into()));
        Ok(())
    }
}

struct TestApp {
    router: Router,
    outbox: Arc<Outbox>,
    repos: Arc<dyn RepositoryProvider>,
}

async fn app() -> TestApp {
    let db = init_database(&DatabaseConfig::sqlite_in_memory())
        .await
        .unwrap();
    Migrator::up(&db, None).await.unwrap();
    let repos: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositoryProvider::new(db));

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let codec = Arc::new(TokenCodec::new(&JwtConfig::new(SECRET, 15), clock.clone()).unwrap());
    let hasher: Arc<dyn PasswordHasher> = Arc::new(BcryptHasher::new(MIN_COST));
    let outbox = Arc::new(Outbox::default());

    let service = Arc::new(AccountService::new(
        repos.clone(),
        hasher,
        codec,
        outbox.clone(),
        clock,
        IdentitySettings::default(),
    ));
    service
        .ensure_default_admin(ADMIN_EMAIL, PASSWORD)
        .await
        .unwrap();

    TestApp {
        router: create_api_router(AppState::new(service, repos.clone())),
        outbox,
        repos,
    }
}

impl TestApp {
    async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {}", t));
        }
        let req = match body {
            Some(b) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();

        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn register(&self, email: &str) -> Value {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/v1/auth/register",
                None,
                Some(json!({
                    "email": email,
                    "password": PASSWORD,
                    "first_name": "Ada",
                    "last_name": "Lovelace"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"].clone()
    }

    async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.call(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    async fn access_token(&self, email: &str) -> String {
        let (status, body) = self.login(email, PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["data"]["access_token"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app().await;
    let (status, body) = app.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"]["status"], "ok");
}

#[tokio::test]
async fn register_verify_login_refresh_logout() {
    let app = app().await;

    let account = app.register("a@x.com").await;
    assert_eq!(account["role"], "USER");
    assert_eq!(account["is_email_verified"], false);
    assert!(account.get("password_hash").is_none());

    let token = app.outbox.last_for("a@x.com");
    let uri = format!("/api/v1/auth/verify-email?token={}", token);
    let (status, body) = app.call(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_email_verified"], true);

    // the link works once
    let (status, _) = app.call(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, login) = app.login("a@x.com", PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["data"]["token_type"], "Bearer");
    assert_eq!(login["data"]["expires_in"], 900);
    let access = login["data"]["access_token"].as_str().unwrap().to_string();
    let refresh = login["data"]["refresh_token"].as_str().unwrap().to_string();

    let (status, me) = app
        .call(Method::GET, "/api/v1/auth/me", Some(&access), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["data"]["email"], "a@x.com");

    let (status, refreshed) = app
        .call(
            Method::POST,
            "/api/v1/auth/refresh-token",
            None,
            Some(json!({ "refresh_token": refresh })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(refreshed["data"]["access_token"].is_string());

    let (status, _) = app
        .call(
            Method::POST,
            "/api/v1/auth/logout",
            None,
            Some(json!({ "refresh_token": refresh })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .call(
            Method::POST,
            "/api/v1/auth/refresh-token",
            None,
            Some(json!({ "refresh_token": refresh })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn error_statuses() {
    let app = app().await;
    app.register("a@x.com").await;

    // duplicate email
    let (status, _) = app
        .call(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({
                "email": "a@x.com",
                "password": PASSWORD,
                "first_name": "Ada",
                "last_name": "Lovelace"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // body-level validation
    let (status, _) = app
        .call(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({
                "email": "nope",
                "password": PASSWORD,
                "first_name": "",
                "last_name": "L"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // password policy is a domain rule
    let (status, body) = app
        .call(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({
                "email": "b@x.com",
                "password": "abcdefgh",
                "first_name": "Ada",
                "last_name": "Lovelace"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("special character"));

    // unknown email and wrong password read the same
    let (s1, b1) = app.login("nobody@x.com", PASSWORD).await;
    let (s2, b2) = app.login("a@x.com", "Wrong123!").await;
    assert_eq!(s1, StatusCode::UNAUTHORIZED);
    assert_eq!(s2, StatusCode::UNAUTHORIZED);
    assert_eq!(b1["error"], b2["error"]);

    // blank credentials are a failed login, and audited as one
    let (status, _) = app.login("", "").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let audit = app.repos.login_attempts().list_for_email("", 10).await.unwrap();
    assert_eq!(audit.len(), 1);
    assert!(!audit[0].successful);

    // oversized emails never reach the audit table
    let long_email = format!("{}@x.com", "a".repeat(300));
    let (status, _) = app.login(&long_email, PASSWORD).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let audit = app
        .repos
        .login_attempts()
        .list_for_email(&long_email, 10)
        .await
        .unwrap();
    assert!(audit.is_empty());

    // protected route without a token
    let (status, _) = app.call(Method::GET, "/api/v1/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn password_reset_over_http() {
    let app = app().await;
    app.register("a@x.com").await;

    let (status, _) = app
        .call(
            Method::POST,
            "/api/v1/auth/forgot-password",
            None,
            Some(json!({ "email": "a@x.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = app.outbox.last_for("a@x.com");

    let reset = json!({ "token": token, "new_password": "Xyz98765#" });
    let (status, _) = app
        .call(
            Method::POST,
            "/api/v1/auth/reset-password",
            None,
            Some(reset.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .call(Method::POST, "/api/v1/auth/reset-password", None, Some(reset))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    assert_eq!(app.login("a@x.com", PASSWORD).await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(app.login("a@x.com", "Xyz98765#").await.0, StatusCode::OK);
}

#[tokio::test]
async fn users_endpoints_are_gated() {
    let app = app().await;
    let alice = app.register("alice@x.com").await;
    let bob = app.register("bob@x.com").await;
    let alice_id = alice["id"].as_str().unwrap();
    let bob_id = bob["id"].as_str().unwrap();

    let alice_token = app.access_token("alice@x.com").await;
    let admin_token = app.access_token(ADMIN_EMAIL).await;

    // self access
    let (status, _) = app
        .call(
            Method::GET,
            &format!("/api/v1/users/{}", alice_id),
            Some(&alice_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // someone else's profile
    let (status, _) = app
        .call(
            Method::GET,
            &format!("/api/v1/users/{}", bob_id),
            Some(&alice_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // admin-only listing
    let (status, _) = app
        .call(Method::GET, "/api/v1/users", Some(&alice_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, page) = app
        .call(Method::GET, "/api/v1/users?search=x.com", Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["data"]["total"], 3);

    // role assignment
    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/api/v1/users/{}/role", bob_id),
            Some(&admin_token),
            Some(json!({ "role": "ORGANIZER" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role_display_name"], "Event Organizer");

    let (status, _) = app
        .call(
            Method::PUT,
            &format!("/api/v1/users/{}/role", bob_id),
            Some(&admin_token),
            Some(json!({ "role": "ROOT" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // deactivation blocks login
    let (status, _) = app
        .call(
            Method::POST,
            &format!("/api/v1/users/{}/deactivate", bob_id),
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.login("bob@x.com", PASSWORD).await.0, StatusCode::FORBIDDEN);

    // login history, self only
    let (status, history) = app
        .call(
            Method::GET,
            &format!("/api/v1/users/{}/login-attempts", alice_id),
            Some(&alice_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["data"][0]["successful"], true);

    // maintenance is admin-only
    let (status, _) = app
        .call(
            Method::POST,
            "/api/v1/admin/maintenance/purge-tokens",
            Some(&alice_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, report) = app
        .call(
            Method::POST,
            "/api/v1/admin/maintenance/purge-unverified",
            Some(&admin_token),
            Some(json!({ "older_than_hours": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["data"]["accounts_removed"], 2);
}
