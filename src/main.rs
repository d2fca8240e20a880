//! Account Service
//!
//! REST API for registration, login and token lifecycle.
//! Reads configuration from TOML (~/.config/account-service/config.toml).

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use account_service::application::AccountService;
use account_service::config::{config_path_from_env, LogFormat, LoggingConfig};
use account_service::domain::{NotificationSender, PasswordHasher, RepositoryProvider};
use account_service::infrastructure::crypto::{BcryptHasher, TokenCodec};
use account_service::infrastructure::database::migrator::Migrator;
use account_service::infrastructure::{LogNotificationSender, MessageRenderer};
use account_service::shared::shutdown::ShutdownCoordinator;
use account_service::shared::{Clock, SystemClock};
use account_service::{
    create_api_router, init_database, AppConfig, AppState, InMemoryRepositoryProvider,
    SeaOrmRepositoryProvider,
};

fn init_tracing(cfg: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match cfg.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Load configuration ─────────────────────────────────────
    let config_path = config_path_from_env();
    let loaded = AppConfig::load(&config_path);
    init_tracing(
        &loaded
            .as_ref()
            .map(|cfg| cfg.logging.clone())
            .unwrap_or_default(),
    );

    let app_cfg = match loaded {
        Ok(cfg) => {
            info!("Configuration loaded from {}", config_path.display());
            cfg.with_env_overrides()
        }
        Err(e) => {
            error!("Failed to load config {}: {}", config_path.display(), e);
            return Err(e.into());
        }
    };

    if let Err(e) = app_cfg.ensure_no_insecure_defaults() {
        error!("{}", e);
        return Err(e.into());
    }
    for field in app_cfg.insecure_defaults() {
        error!(field, "Built-in default in use; never run like this in production");
    }

    info!("Starting Account Service...");

    // ── Credential store ───────────────────────────────────────
    let db_config = app_cfg.database_config();
    let mut db: Option<DatabaseConnection> = None;
    let repos: Arc<dyn RepositoryProvider> = if db_config.is_memory_store() {
        warn!("Using the in-memory store; all data is lost on shutdown");
        Arc::new(InMemoryRepositoryProvider::new())
    } else {
        let conn = init_database(&db_config).await.map_err(|e| {
            error!("Failed to connect to database: {}", e);
            e
        })?;

        info!("Running database migrations...");
        Migrator::up(&conn, None).await.map_err(|e| {
            error!("Failed to run migrations: {}", e);
            e
        })?;
        info!("Migrations completed");

        db = Some(conn.clone());
        Arc::new(SeaOrmRepositoryProvider::new(conn))
    };

    // ── Identity services ──────────────────────────────────────
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let codec = Arc::new(TokenCodec::new(&app_cfg.jwt_config(), clock.clone())?);
    info!(
        access_ttl_minutes = app_cfg.security.access_token_ttl_minutes,
        "Token codec configured"
    );

    let hasher: Arc<dyn PasswordHasher> = Arc::new(BcryptHasher::new(app_cfg.security.bcrypt_cost));
    let notifier: Arc<dyn NotificationSender> = Arc::new(LogNotificationSender::new(
        MessageRenderer::new(
            &app_cfg.server.public_base_url,
            app_cfg.security.email_verification_ttl_hours,
            app_cfg.security.password_reset_ttl_minutes,
        ),
    ));

    let accounts = Arc::new(AccountService::new(
        repos.clone(),
        hasher,
        codec,
        notifier,
        clock,
        app_cfg.identity_settings()?,
    ));

    // Create default admin if the store is empty
    match accounts
        .ensure_default_admin(&app_cfg.admin.email, &app_cfg.admin.password)
        .await
    {
        Ok(Some(_)) => warn!("Default admin created; change its password immediately"),
        Ok(None) => {}
        Err(e) => error!("Failed to create default admin: {}", e),
    }

    // ── Shutdown ───────────────────────────────────────────────
    let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
    let shutdown_signal = shutdown.signal();
    shutdown.start_signal_listener();

    // ── REST API ───────────────────────────────────────────────
    let router = create_api_router(AppState::new(accounts, repos));

    let api_addr = app_cfg.server.address();
    let listener = tokio::net::TcpListener::bind(&api_addr).await?;
    info!("REST API server listening on http://{}", api_addr);
    info!("Swagger UI available at http://{}/docs/", api_addr);

    let api_shutdown = shutdown_signal.clone();
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        api_shutdown.wait().await;
        info!("REST API server received shutdown signal");
    });

    if let Err(e) = server.await {
        error!("REST API server error: {}", e);
    }

    // ── Cleanup ────────────────────────────────────────────────
    if let Some(db) = db {
        let closed = shutdown
            .cleanup_with_timeout(async move {
                match db.close().await {
                    Ok(()) => info!("Database connection closed"),
                    Err(e) => warn!("Error closing database connection: {}", e),
                }
            })
            .await;
        if !closed {
            warn!("Database did not close in time");
        }
    }

    info!("Account Service shutdown complete");
    Ok(())
}
