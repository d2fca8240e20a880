//! Application configuration
//!
//! Loaded from a TOML file, `~/.config/account-service/config.toml` by
//! default (override with `ACCOUNT_SERVICE_CONFIG`). Every section has
//! defaults, so a missing file or a partial one is fine. A file that exists
//! but does not parse, or holds out-of-range values, is an error.
//!
//! The built-in JWT secret and admin password are placeholders. Startup
//! refuses them unless `security.allow_insecure_defaults` is set.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::IdentitySettings;
use crate::infrastructure::crypto::JwtConfig;
use crate::infrastructure::database::DatabaseConfig;

pub const CONFIG_PATH_ENV: &str = "ACCOUNT_SERVICE_CONFIG";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const ADMIN_PASSWORD_ENV: &str = "ADMIN_PASSWORD";

pub const DEFAULT_JWT_SECRET: &str = "change-me-in-production-change-me-in-production";
pub const DEFAULT_ADMIN_PASSWORD: &str = "Admin123!";

/// Upper bounds for the configurable token lifetimes.
pub const MAX_ACCESS_TOKEN_TTL_MINUTES: i64 = 24 * 60;
pub const MAX_REFRESH_TOKEN_TTL_DAYS: i64 = 365;
pub const MAX_EMAIL_VERIFICATION_TTL_HOURS: i64 = 30 * 24;
pub const MAX_PASSWORD_RESET_TTL_MINUTES: i64 = 24 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid config value {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("built-in default still in use for {0}; set it or enable security.allow_insecure_defaults")]
    InsecureDefaults(String),
}

/// Default config location: `<config dir>/account-service/config.toml`.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("account-service")
        .join("config.toml")
}

/// Config path from `ACCOUNT_SERVICE_CONFIG`, falling back to the default.
pub fn config_path_from_env() -> PathBuf {
    std::env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_config_path())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSection,
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub api_host: String,
    pub api_port: u16,
    /// Seconds to wait for in-flight requests on shutdown.
    pub shutdown_timeout: u64,
    /// Base of the links embedded in verification / reset emails.
    pub public_base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_host: "0.0.0.0".to_string(),
            api_port: 8080,
            shutdown_timeout: 30,
            public_base_url: "http://localhost:8080".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    /// `sqlite://...`, `postgres://...` or `memory://`.
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        let db = DatabaseConfig::default();
        Self {
            url: db.url,
            max_connections: db.max_connections,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
    pub email_verification_ttl_hours: i64,
    pub password_reset_ttl_minutes: i64,
    pub bcrypt_cost: u32,
    pub require_verified_email: bool,
    /// Start even with the built-in JWT secret / admin password. Development only.
    pub allow_insecure_defaults: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            access_token_ttl_minutes: 60,
            refresh_token_ttl_days: 7,
            email_verification_ttl_hours: 24,
            password_reset_ttl_minutes: 15,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            require_verified_email: false,
            allow_insecure_defaults: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` wins when set.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Administrator created on first start when the store is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub email: String,
    pub password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            email: "admin@localhost".to_string(),
            password: DEFAULT_ADMIN_PASSWORD.to_string(),
        }
    }
}

impl AppConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(raw) => Self::from_toml(&raw),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Range-check the token lifetimes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.security;
        check_range(
            "security.access_token_ttl_minutes",
            s.access_token_ttl_minutes,
            MAX_ACCESS_TOKEN_TTL_MINUTES,
        )?;
        check_range(
            "security.refresh_token_ttl_days",
            s.refresh_token_ttl_days,
            MAX_REFRESH_TOKEN_TTL_DAYS,
        )?;
        check_range(
            "security.email_verification_ttl_hours",
            s.email_verification_ttl_hours,
            MAX_EMAIL_VERIFICATION_TTL_HOURS,
        )?;
        check_range(
            "security.password_reset_ttl_minutes",
            s.password_reset_ttl_minutes,
            MAX_PASSWORD_RESET_TTL_MINUTES,
        )
    }

    /// Settings still at their built-in placeholder values.
    pub fn insecure_defaults(&self) -> Vec<&'static str> {
        let mut found = Vec::new();
        if self.security.jwt_secret == DEFAULT_JWT_SECRET {
            found.push("security.jwt_secret");
        }
        if self.admin.password == DEFAULT_ADMIN_PASSWORD {
            found.push("admin.password");
        }
        found
    }

    /// Fail on placeholder secrets unless explicitly allowed.
    pub fn ensure_no_insecure_defaults(&self) -> Result<(), ConfigError> {
        let found = self.insecure_defaults();
        if found.is_empty() || self.security.allow_insecure_defaults {
            Ok(())
        } else {
            Err(ConfigError::InsecureDefaults(found.join(", ")))
        }
    }

    /// Write the config as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let raw = toml::to_string_pretty(self)?;
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(path, raw).map_err(write_err)
    }

    /// Apply `JWT_SECRET` / `DATABASE_URL` / `ADMIN_PASSWORD` when present.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var(JWT_SECRET_ENV).ok(),
            std::env::var(DATABASE_URL_ENV).ok(),
            std::env::var(ADMIN_PASSWORD_ENV).ok(),
        )
    }

    fn with_overrides(
        mut self,
        jwt_secret: Option<String>,
        database_url: Option<String>,
        admin_password: Option<String>,
    ) -> Self {
        if let Some(secret) = jwt_secret.filter(|s| !s.is_empty()) {
            self.security.jwt_secret = secret;
        }
        if let Some(url) = database_url.filter(|s| !s.is_empty()) {
            self.database.url = url;
        }
        if let Some(password) = admin_password.filter(|s| !s.is_empty()) {
            self.admin.password = password;
        }
        self
    }

    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.database.url.clone(),
            max_connections: self.database.max_connections,
        }
    }

    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig::new(
            self.security.jwt_secret.clone(),
            self.security.access_token_ttl_minutes,
        )
    }

    pub fn identity_settings(&self) -> Result<IdentitySettings, ConfigError> {
        self.validate()?;
        let s = &self.security;
        Ok(IdentitySettings {
            refresh_token_ttl: Duration::days(s.refresh_token_ttl_days),
            email_verification_ttl: Duration::hours(s.email_verification_ttl_hours),
            password_reset_ttl: Duration::minutes(s.password_reset_ttl_minutes),
            require_verified_email: s.require_verified_email,
            ..IdentitySettings::default()
        })
    }
}

fn check_range(field: &'static str, value: i64, max: i64) -> Result<(), ConfigError> {
    if (1..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{} is outside 1..={}", value, max),
        })
    }
}
