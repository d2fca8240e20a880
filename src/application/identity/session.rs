//! Login / logout orchestration.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{error, info, warn};

use super::{hash_password, verify_password, IdentitySettings, TokenLifecycleManager};
use crate::domain::{
    Account, DomainError, DomainResult, PasswordHasher, RefreshToken, RepositoryProvider,
};
use crate::infrastructure::crypto::{IssuedToken, TokenCodec};
use crate::shared::Clock;

/// Authentication result returned after a successful login
#[derive(Debug, Clone)]
pub struct AuthenticationResult {
    pub access_token: IssuedToken,
    pub refresh_token: RefreshToken,
    pub account: Account,
}

pub struct SessionManager {
    repos: Arc<dyn RepositoryProvider>,
    hasher: Arc<dyn PasswordHasher>,
    codec: Arc<TokenCodec>,
    tokens: Arc<TokenLifecycleManager>,
    clock: Arc<dyn Clock>,
    require_verified_email: bool,
    /// Hash checked against when the email is unknown, so both failure paths
    /// pay for one verify.
    decoy_hash: OnceCell<String>,
}

const DECOY_PASSWORD: &str = "decoy-password-never-matches";

impl SessionManager {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        hasher: Arc<dyn PasswordHasher>,
        codec: Arc<TokenCodec>,
        tokens: Arc<TokenLifecycleManager>,
        clock: Arc<dyn Clock>,
        settings: &IdentitySettings,
    ) -> Self {
        Self {
            repos,
            hasher,
            codec,
            tokens,
            clock,
            require_verified_email: settings.require_verified_email,
            decoy_hash: OnceCell::new(),
        }
    }

    /// Check an email / password pair.
    ///
    /// Unknown email and wrong password both fail `BadCredentials`, and both
    /// run one password verify. A correct password on an inactive account
    /// fails `AccountDisabled`.
    pub async fn authenticate(&self, email: &str, password: &str) -> DomainResult<Account> {
        let Some(account) = self.repos.accounts().find_by_email(email).await? else {
            let decoy = self
                .decoy_hash
                .get_or_try_init(|| hash_password(&self.hasher, DECOY_PASSWORD))
                .await?;
            verify_password(&self.hasher, password, decoy).await?;
            return Err(DomainError::BadCredentials);
        };

        if !verify_password(&self.hasher, password, &account.password_hash).await? {
            return Err(DomainError::BadCredentials);
        }

        if !account.is_active {
            return Err(DomainError::AccountDisabled);
        }

        if self.require_verified_email && !account.is_email_verified {
            return Err(DomainError::EmailNotVerified);
        }

        Ok(account)
    }

    /// Authenticate and open a session. Exactly one login attempt is recorded
    /// per call, successful or not.
    ///
    /// A failed audit write is logged and does not change the outcome: the
    /// session is already open by then, and a failed login stays failed.
    pub async fn login(&self, email: &str, password: &str) -> DomainResult<AuthenticationResult> {
        let result = self.try_login(email, password).await;

        let successful = result.is_ok();
        if let Err(e) = self
            .repos
            .login_attempts()
            .append(email, successful, self.clock.now())
            .await
        {
            error!(email = %email, successful, error = %e, "Failed to record login attempt");
        }

        match &result {
            Ok(auth) => info!(account_id = %auth.account.id, "Login succeeded"),
            Err(e) => warn!(email = %email, error = %e, "Login failed"),
        }
        result
    }

    async fn try_login(&self, email: &str, password: &str) -> DomainResult<AuthenticationResult> {
        let mut account = self.authenticate(email, password).await?;

        let now = self.clock.now();
        self.repos.accounts().stamp_last_login(&account.id, now).await?;
        account.last_login_at = Some(now);

        let access_token = self.codec.issue_for_account(&account)?;
        let refresh_token = self.tokens.issue_or_replace_refresh(&account).await?;

        Ok(AuthenticationResult {
            access_token,
            refresh_token,
            account,
        })
    }

    /// Revoke the refresh token. Access tokens already handed out stay valid
    /// until they expire.
    pub async fn logout(&self, refresh_token: &str) -> DomainResult<()> {
        self.tokens.revoke_refresh(refresh_token).await
    }

    /// Exchange a refresh token for a new access token.
    pub async fn refresh(&self, refresh_token: &str) -> DomainResult<(IssuedToken, Account)> {
        self.tokens.rotate_access_token(refresh_token).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};

    use super::*;
    use crate::application::identity::testing::{TestContext, PASSWORD};
    use crate::domain::{
        AccountRepository, LoginAttempt, LoginAttemptRepository, OneShotTokenRepository,
        RefreshTokenRepository, TokenFailure, TokenKind,
    };
    use crate::infrastructure::crypto::password::MIN_COST;
    use crate::infrastructure::crypto::BcryptHasher;
    use crate::infrastructure::storage::InMemoryRepositoryProvider;

    /// bcrypt that counts its calls.
    #[derive(Default)]
    struct CountingHasher {
        hashes: AtomicUsize,
        verifies: AtomicUsize,
    }

    impl PasswordHasher for CountingHasher {
        fn hash(&self, plain: &str) -> DomainResult<String> {
            self.hashes.fetch_add(1, Ordering::SeqCst);
            BcryptHasher::new(MIN_COST).hash(plain)
        }

        fn verify(&self, plain: &str, hash: &str) -> bool {
            self.verifies.fetch_add(1, Ordering::SeqCst);
            BcryptHasher::new(MIN_COST).verify(plain, hash)
        }
    }

    /// In-memory store whose audit table is unavailable.
    struct AuditDown {
        inner: Arc<InMemoryRepositoryProvider>,
        attempts: FailingAttempts,
    }

    struct FailingAttempts;

    #[async_trait]
    impl LoginAttemptRepository for FailingAttempts {
        async fn append(
            &self,
            _email: &str,
            _successful: bool,
            _at: DateTime<Utc>,
        ) -> DomainResult<LoginAttempt> {
            Err(DomainError::Internal("audit table unavailable".into()))
        }

        async fn list_for_email(&self, _email: &str, _limit: u64) -> DomainResult<Vec<LoginAttempt>> {
            Ok(Vec::new())
        }
    }

    impl RepositoryProvider for AuditDown {
        fn accounts(&self) -> &dyn AccountRepository {
            self.inner.accounts()
        }
        fn refresh_tokens(&self) -> &dyn RefreshTokenRepository {
            self.inner.refresh_tokens()
        }
        fn one_shot_tokens(&self) -> &dyn OneShotTokenRepository {
            self.inner.one_shot_tokens()
        }
        fn login_attempts(&self) -> &dyn LoginAttemptRepository {
            &self.attempts
        }
    }

    fn sessions_over(
        ctx: &TestContext,
        repos: Arc<dyn RepositoryProvider>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> SessionManager {
        let settings = IdentitySettings::default();
        let tokens = Arc::new(TokenLifecycleManager::new(
            repos.clone(),
            ctx.codec.clone(),
            ctx.clock.clone(),
            settings.clone(),
        ));
        SessionManager::new(repos, hasher, ctx.codec.clone(), tokens, ctx.clock.clone(), &settings)
    }

    async fn attempts(ctx: &TestContext, email: &str) -> Vec<bool> {
        ctx.repos
            .login_attempts()
            .list_for_email(email, 100)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.successful)
            .collect()
    }

    #[tokio::test]
    async fn login_issues_tokens_and_stamps_last_login() {
        let ctx = TestContext::new();
        let account = ctx.account("a@x.com").await;

        let auth = ctx.sessions.login("a@x.com", PASSWORD).await.unwrap();

        assert_eq!(auth.account.id, account.id);
        assert_eq!(auth.account.last_login_at, Some(ctx.clock.now()));
        assert!(ctx.codec.is_valid_for(&auth.access_token.token, "a@x.com"));
        assert_eq!(auth.refresh_token.account_id, account.id);
        assert_eq!(
            auth.refresh_token.expires_at - auth.refresh_token.created_at,
            Duration::days(7)
        );
        assert_eq!(ctx.reload(&account.id).await.last_login_at, Some(ctx.clock.now()));
        assert_eq!(attempts(&ctx, "a@x.com").await, vec![true]);
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_look_the_same() {
        let ctx = TestContext::new();
        ctx.account("a@x.com").await;

        let unknown = ctx.sessions.login("nobody@x.com", PASSWORD).await.unwrap_err();
        let wrong = ctx.sessions.login("a@x.com", "Wrong123!").await.unwrap_err();

        assert!(matches!(unknown, DomainError::BadCredentials));
        assert!(matches!(wrong, DomainError::BadCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
        assert_eq!(attempts(&ctx, "nobody@x.com").await, vec![false]);
        assert_eq!(attempts(&ctx, "a@x.com").await, vec![false]);
    }

    #[tokio::test]
    async fn disabled_account_is_distinct_from_bad_credentials() {
        let ctx = TestContext::new();
        let account = ctx.account("a@x.com").await;
        ctx.repos.accounts().set_active(&account.id, false, ctx.clock.now()).await.unwrap();

        let err = ctx.sessions.login("a@x.com", PASSWORD).await.unwrap_err();
        assert!(matches!(err, DomainError::AccountDisabled));

        // wrong password still reads as bad credentials
        let err = ctx.sessions.login("a@x.com", "Wrong123!").await.unwrap_err();
        assert!(matches!(err, DomainError::BadCredentials));
        assert_eq!(attempts(&ctx, "a@x.com").await, vec![false, false]);
    }

    #[tokio::test]
    async fn email_lookup_is_case_sensitive() {
        let ctx = TestContext::new();
        ctx.account("a@x.com").await;

        let err = ctx.sessions.login("A@X.COM", PASSWORD).await.unwrap_err();
        assert!(matches!(err, DomainError::BadCredentials));
    }

    #[tokio::test]
    async fn unverified_accounts_may_log_in_by_default() {
        let ctx = TestContext::new();
        let account = ctx.account("a@x.com").await;
        assert!(!account.is_email_verified);

        assert!(ctx.sessions.login("a@x.com", PASSWORD).await.is_ok());
    }

    #[tokio::test]
    async fn verified_email_can_be_required() {
        let ctx = TestContext::with_settings(IdentitySettings {
            require_verified_email: true,
            ..IdentitySettings::default()
        });
        let account = ctx.account("a@x.com").await;

        let err = ctx.sessions.login("a@x.com", PASSWORD).await.unwrap_err();
        assert!(matches!(err, DomainError::EmailNotVerified));

        ctx.repos.accounts().mark_email_verified(&account.id, ctx.clock.now()).await.unwrap();
        assert!(ctx.sessions.login("a@x.com", PASSWORD).await.is_ok());
        assert_eq!(attempts(&ctx, "a@x.com").await, vec![true, false]);
    }

    #[tokio::test]
    async fn second_login_replaces_the_refresh_token() {
        let ctx = TestContext::new();
        ctx.account("a@x.com").await;

        let first = ctx.sessions.login("a@x.com", PASSWORD).await.unwrap();
        let second = ctx.sessions.login("a@x.com", PASSWORD).await.unwrap();

        let err = ctx
            .sessions
            .refresh(&first.refresh_token.token)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::TokenInvalid {
                token: TokenKind::Refresh,
                reason: TokenFailure::NotFound
            }
        ));
        assert!(ctx.sessions.refresh(&second.refresh_token.token).await.is_ok());
    }

    #[tokio::test]
    async fn logout_revokes_refresh_but_not_access() {
        let ctx = TestContext::new();
        ctx.account("a@x.com").await;
        let auth = ctx.sessions.login("a@x.com", PASSWORD).await.unwrap();

        ctx.sessions.logout(&auth.refresh_token.token).await.unwrap();
        ctx.sessions.logout(&auth.refresh_token.token).await.unwrap();

        assert!(ctx.sessions.refresh(&auth.refresh_token.token).await.is_err());
        assert!(ctx.codec.is_valid_for(&auth.access_token.token, "a@x.com"));
    }

    #[tokio::test]
    async fn unknown_email_costs_one_verify_like_a_wrong_password() {
        let ctx = TestContext::new();
        ctx.account("a@x.com").await;
        let hasher = Arc::new(CountingHasher::default());
        let sessions = sessions_over(&ctx, ctx.repos.clone(), hasher.clone());

        let err = sessions.authenticate("nobody@x.com", PASSWORD).await.unwrap_err();
        assert!(matches!(err, DomainError::BadCredentials));
        assert_eq!(hasher.verifies.load(Ordering::SeqCst), 1);

        let err = sessions.authenticate("a@x.com", "Wrong123!").await.unwrap_err();
        assert!(matches!(err, DomainError::BadCredentials));
        assert_eq!(hasher.verifies.load(Ordering::SeqCst), 2);

        // the decoy hash is computed once and reused
        sessions.authenticate("ghost@x.com", PASSWORD).await.unwrap_err();
        assert_eq!(hasher.verifies.load(Ordering::SeqCst), 3);
        assert_eq!(hasher.hashes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn audit_failure_does_not_undo_a_login() {
        let ctx = TestContext::new();
        let account = ctx.account("a@x.com").await;
        let repos = Arc::new(AuditDown {
            inner: ctx.repos.clone(),
            attempts: FailingAttempts,
        });
        let sessions = sessions_over(&ctx, repos, ctx.hasher.clone());

        let auth = sessions.login("a@x.com", PASSWORD).await.unwrap();
        assert_eq!(auth.account.id, account.id);
        assert!(sessions.refresh(&auth.refresh_token.token).await.is_ok());

        let err = sessions.login("a@x.com", "Wrong123!").await.unwrap_err();
        assert!(matches!(err, DomainError::BadCredentials));
    }
}
