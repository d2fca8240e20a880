//! Shared fixtures for identity tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use super::{AccountService, IdentitySettings, RegisterAccount, SessionManager, TokenLifecycleManager};
use crate::domain::{
    Account, CreateAccountDto, DomainError, DomainResult, NotificationSender, PasswordHasher,
    RepositoryProvider,
};
use crate::infrastructure::crypto::password::MIN_COST;
use crate::infrastructure::crypto::{BcryptHasher, JwtConfig, TokenCodec};
use crate::infrastructure::storage::InMemoryRepositoryProvider;
use crate::shared::{Clock, ManualClock};

pub const PASSWORD: &str = "Abc12345!";
pub const SECRET: &str = "test-secret-test-secret-test-secret!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Verification { email: String, token: String },
    PasswordReset { email: String, token: String },
}

/// Notifier that records every message; can be told to fail.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Sent>>,
    fail: Mutex<bool>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_deliveries(&self) {
        *self.fail.lock().unwrap() = true;
    }

    pub fn last_verification_token(&self) -> Option<String> {
        self.sent().into_iter().rev().find_map(|s| match s {
            Sent::Verification { token, .. } => Some(token),
            _ => None,
        })
    }

    pub fn last_reset_token(&self) -> Option<String> {
        self.sent().into_iter().rev().find_map(|s| match s {
            Sent::PasswordReset { token, .. } => Some(token),
            _ => None,
        })
    }

    fn record(&self, sent: Sent) -> DomainResult<()> {
        if *self.fail.lock().unwrap() {
            return Err(DomainError::Internal("smtp unavailable".into()));
        }
        self.sent.lock().unwrap().push(sent);
        Ok(())
    }
}

#[async_trait]
impl NotificationSender for RecordingNotifier {
    async fn send_verification(&self, email: &str, token: &str) -> DomainResult<()> {
        self.record(Sent::Verification {
            email: email.into(),
            token: token.into(),
        })
    }

    async fn send_password_reset(&self, email: &str, token: &str) -> DomainResult<()> {
        self.record(Sent::PasswordReset {
            email: email.into(),
            token: token.into(),
        })
    }
}

/// Fully wired identity services over the in-memory store and a manual clock.
pub struct TestContext {
    pub repos: Arc<InMemoryRepositoryProvider>,
    pub clock: Arc<ManualClock>,
    pub notifier: Arc<RecordingNotifier>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub codec: Arc<TokenCodec>,
    pub tokens: Arc<TokenLifecycleManager>,
    pub sessions: Arc<SessionManager>,
    pub service: AccountService,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_settings(IdentitySettings::default())
    }

    pub fn with_settings(settings: IdentitySettings) -> Self {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let clock = Arc::new(ManualClock::new(start));
        let notifier = Arc::new(RecordingNotifier::default());
        let hasher: Arc<dyn PasswordHasher> = Arc::new(BcryptHasher::new(MIN_COST));
        let codec = Arc::new(TokenCodec::new(&JwtConfig::new(SECRET, 60), clock.clone()).unwrap());

        let service = AccountService::new(
            repos.clone(),
            hasher.clone(),
            codec.clone(),
            notifier.clone(),
            clock.clone(),
            settings,
        );

        Self {
            tokens: service.tokens().clone(),
            sessions: service.sessions().clone(),
            repos,
            clock,
            notifier,
            hasher,
            codec,
            service,
        }
    }

    /// Insert an active, unverified USER account with [`PASSWORD`].
    pub async fn account(&self, email: &str) -> Account {
        let hash = self.hasher.hash(PASSWORD).unwrap();
        let account = Account::new(
            CreateAccountDto::new(email, hash, "Ada", "Lovelace", None),
            self.clock.now(),
        )
        .unwrap();
        self.repos.accounts().insert(account).await.unwrap()
    }

    pub async fn reload(&self, id: &str) -> Account {
        self.repos.accounts().find_by_id(id).await.unwrap().unwrap()
    }

    pub fn registration(email: &str) -> RegisterAccount {
        RegisterAccount {
            email: email.into(),
            password: PASSWORD.into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            phone: None,
        }
    }
}
