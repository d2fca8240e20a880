//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::FromRef,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::application::AccountService;
use crate::domain::RepositoryProvider;
use crate::interfaces::http::common::{ApiResponse, MessageResponse, PaginatedResponse};
use crate::interfaces::http::middleware::{auth_middleware, AuthState};
use crate::interfaces::http::modules::health::HealthState;
use crate::interfaces::http::modules::request_id::request_id_middleware;
use crate::interfaces::http::modules::{admin, auth, health, users};

/// Router state. Handlers pick the part they need through `FromRef`.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub repos: Arc<dyn RepositoryProvider>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(accounts: Arc<AccountService>, repos: Arc<dyn RepositoryProvider>) -> Self {
        Self {
            accounts,
            repos,
            started_at: Instant::now(),
        }
    }
}

impl FromRef<AppState> for Arc<AccountService> {
    fn from_ref(s: &AppState) -> Self {
        Arc::clone(&s.accounts)
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(s: &AppState) -> Self {
        AuthState {
            codec: Arc::clone(s.accounts.codec()),
        }
    }
}

impl FromRef<AppState> for HealthState {
    fn from_ref(s: &AppState) -> Self {
        HealthState {
            repos: Arc::clone(&s.repos),
            started_at: s.started_at,
        }
    }
}

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Access token from /api/v1/auth/login"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health_check,
        // Auth
        auth::register,
        auth::login,
        auth::refresh_token,
        auth::logout,
        auth::verify_email,
        auth::resend_verification,
        auth::forgot_password,
        auth::reset_password,
        auth::me,
        auth::change_password,
        // Users
        users::list_accounts,
        users::get_account,
        users::update_profile,
        users::delete_account,
        users::assign_role,
        users::deactivate,
        users::reactivate,
        users::login_history,
        // Maintenance
        admin::purge_unverified,
        admin::purge_tokens,
    ),
    components(
        schemas(
            ApiResponse<String>,
            MessageResponse,
            PaginatedResponse<users::AccountDto>,
            health::HealthResponse,
            health::ComponentHealth,
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::AuthResponse,
            auth::RefreshTokenRequest,
            auth::AccessTokenResponse,
            auth::EmailRequest,
            auth::ResetPasswordRequest,
            auth::ChangePasswordRequest,
            users::AccountDto,
            users::UpdateProfileRequest,
            users::AssignRoleRequest,
            users::LoginAttemptDto,
            admin::PurgeUnverifiedRequest,
            admin::MaintenanceReportDto,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Authentication", description = "Registration, login, token refresh, email verification and password flows"),
        (name = "Users", description = "Profiles, roles, activation and login history"),
        (name = "Maintenance", description = "Admin-triggered cleanup of stale accounts and expired tokens"),
    ),
    info(
        title = "Account Service API",
        version = "1.0.0",
        description = "User accounts, authentication and token lifecycle",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes
pub fn create_api_router(state: AppState) -> Router {
    let auth_state = AuthState::from_ref(&state);
    let require_auth = || middleware::from_fn_with_state(auth_state.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh-token", post(auth::refresh_token))
        .route("/logout", post(auth::logout))
        .route("/verify-email", get(auth::verify_email))
        .route("/resend-verification", post(auth::resend_verification))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
        .merge(
            Router::new()
                .route("/me", get(auth::me))
                .route("/change-password", post(auth::change_password))
                .route_layer(require_auth()),
        );

    let user_routes = Router::new()
        .route("/", get(users::list_accounts))
        .route(
            "/{id}",
            get(users::get_account)
                .put(users::update_profile)
                .delete(users::delete_account),
        )
        .route("/{id}/role", put(users::assign_role))
        .route("/{id}/deactivate", post(users::deactivate))
        .route("/{id}/reactivate", post(users::reactivate))
        .route("/{id}/login-attempts", get(users::login_history))
        .route_layer(require_auth());

    let admin_routes = Router::new()
        .route("/purge-unverified", post(admin::purge_unverified))
        .route("/purge-tokens", post(admin::purge_tokens))
        .route_layer(require_auth());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/v1/auth", auth_routes)
        .nest("/api/v1/users", user_routes)
        .nest("/api/v1/admin/maintenance", admin_routes)
        .with_state(state)
        .merge(swagger_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
