//! Refresh and one-shot token lifecycle.
//!
//! One-shot tokens move `ISSUED -> CONSUMED | EXPIRED`; consumption is a
//! conditional delete so concurrent presenters see at most one winner.
//! Refresh tokens are replaced, never accumulated: issuance is serialized per
//! account on top of the store's transactional replace.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::IdentitySettings;
use crate::domain::{
    Account, DomainError, DomainResult, OneShotKind, OneShotToken, RefreshToken,
    RepositoryProvider, TokenFailure, TokenKind,
};
use crate::infrastructure::crypto::{generate_opaque_token, IssuedToken, TokenCodec};
use crate::shared::Clock;

/// Row counts removed by [`TokenLifecycleManager::purge_expired`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgedTokens {
    pub refresh_tokens: u64,
    pub one_shot_tokens: u64,
}

pub struct TokenLifecycleManager {
    repos: Arc<dyn RepositoryProvider>,
    codec: Arc<TokenCodec>,
    clock: Arc<dyn Clock>,
    settings: IdentitySettings,
    refresh_locks: DashMap<String, Arc<Mutex<()>>>,
}

/// `now + ttl`, refusing lifetimes that overflow or do not lie in the future.
fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> DomainResult<DateTime<Utc>> {
    now.checked_add_signed(ttl)
        .filter(|at| *at > now)
        .ok_or_else(|| DomainError::Internal(format!("token lifetime out of range: {}", ttl)))
}

impl TokenLifecycleManager {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        codec: Arc<TokenCodec>,
        clock: Arc<dyn Clock>,
        settings: IdentitySettings,
    ) -> Self {
        Self {
            repos,
            codec,
            clock,
            settings,
            refresh_locks: DashMap::new(),
        }
    }

    fn one_shot_ttl(&self, kind: OneShotKind) -> Duration {
        match kind {
            OneShotKind::EmailVerification => self.settings.email_verification_ttl,
            OneShotKind::PasswordReset => self.settings.password_reset_ttl,
        }
    }

    // ── One-shot tokens ─────────────────────────────────────────

    /// Issue a one-shot token with the configured lifetime for `kind`.
    /// Earlier tokens of the same kind stay valid until used or expired.
    pub async fn issue_one_shot(
        &self,
        account: &Account,
        kind: OneShotKind,
    ) -> DomainResult<OneShotToken> {
        self.issue_one_shot_with_ttl(account, kind, self.one_shot_ttl(kind))
            .await
    }

    pub async fn issue_one_shot_with_ttl(
        &self,
        account: &Account,
        kind: OneShotKind,
        ttl: Duration,
    ) -> DomainResult<OneShotToken> {
        let now = self.clock.now();
        let expires_at = expiry_after(now, ttl)?;
        let token = OneShotToken::new(generate_opaque_token(), kind, &account.id, expires_at, now);
        self.repos.one_shot_tokens().insert(token.clone()).await?;

        debug!(account_id = %account.id, kind = %kind, expires_at = %token.expires_at, "One-shot token issued");
        Ok(token)
    }

    /// Redeem a one-shot token and return its owner.
    ///
    /// Absent fails `NotFound`. Expired is deleted and fails `Expired`. A token
    /// of another kind fails `KindMismatch` and is left in place for its real
    /// purpose. Otherwise the token is deleted before the owner is returned.
    pub async fn consume_one_shot(
        &self,
        token: &str,
        expected: OneShotKind,
    ) -> DomainResult<Account> {
        let fail = |reason| DomainError::token(expected.token_kind(), reason);
        let store = self.repos.one_shot_tokens();

        let Some(found) = store.find_by_token(token).await? else {
            return Err(fail(TokenFailure::NotFound));
        };

        if found.is_expired_at(self.clock.now()) {
            store.delete_by_token(token).await?;
            debug!(account_id = %found.account_id, kind = %found.kind, "Expired one-shot token discarded");
            return Err(fail(TokenFailure::Expired));
        }

        if found.kind != expected {
            return Err(fail(TokenFailure::KindMismatch));
        }

        // Conditional delete: a concurrent consumer that got here first wins.
        if !store.delete_by_token(token).await? {
            return Err(fail(TokenFailure::NotFound));
        }

        self.repos
            .accounts()
            .find_by_id(&found.account_id)
            .await?
            .ok_or_else(|| fail(TokenFailure::NotFound))
    }

    // ── Refresh tokens ──────────────────────────────────────────

    fn refresh_lock(&self, account_id: &str) -> Arc<Mutex<()>> {
        self.refresh_locks
            .entry(account_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Delete the account's refresh token (if any) and store a fresh one.
    pub async fn issue_or_replace_refresh(&self, account: &Account) -> DomainResult<RefreshToken> {
        let lock = self.refresh_lock(&account.id);
        let result = {
            let _guard = lock.lock().await;
            let now = self.clock.now();
            match expiry_after(now, self.settings.refresh_token_ttl) {
                Ok(expires_at) => {
                    let token =
                        RefreshToken::new(generate_opaque_token(), &account.id, expires_at, now);
                    self.repos
                        .refresh_tokens()
                        .replace_for_account(token.clone())
                        .await
                        .map(|()| token)
                }
                Err(e) => Err(e),
            }
        };
        drop(lock);
        self.refresh_locks
            .remove_if(&account.id, |_, l| Arc::strong_count(l) == 1);

        if result.is_ok() {
            debug!(account_id = %account.id, "Refresh token issued");
        }
        result
    }

    /// Look up a refresh token without consuming it. Expired tokens are
    /// deleted on sight.
    pub async fn verify_refresh(&self, token: &str) -> DomainResult<RefreshToken> {
        let store = self.repos.refresh_tokens();
        let Some(found) = store.find_by_token(token).await? else {
            return Err(DomainError::token(TokenKind::Refresh, TokenFailure::NotFound));
        };

        if found.is_expired_at(self.clock.now()) {
            store.delete_by_token(token).await?;
            debug!(account_id = %found.account_id, "Expired refresh token discarded");
            return Err(DomainError::token(TokenKind::Refresh, TokenFailure::Expired));
        }
        Ok(found)
    }

    /// New access token for the refresh token's owner. The refresh token
    /// itself stays valid.
    pub async fn rotate_access_token(&self, token: &str) -> DomainResult<(IssuedToken, Account)> {
        let refresh = self.verify_refresh(token).await?;
        let account = self
            .repos
            .accounts()
            .find_by_id(&refresh.account_id)
            .await?
            .ok_or_else(|| DomainError::token(TokenKind::Refresh, TokenFailure::NotFound))?;

        let access = self.codec.issue_for_account(&account)?;
        Ok((access, account))
    }

    /// Idempotent.
    pub async fn revoke_refresh(&self, token: &str) -> DomainResult<()> {
        if self.repos.refresh_tokens().delete_by_token(token).await? {
            debug!("Refresh token revoked");
        }
        Ok(())
    }

    /// Idempotent.
    pub async fn revoke_all_for_account(&self, account_id: &str) -> DomainResult<()> {
        let removed = self
            .repos
            .refresh_tokens()
            .delete_for_account(account_id)
            .await?;
        if removed > 0 {
            debug!(account_id = %account_id, "Refresh tokens revoked");
        }
        Ok(())
    }

    /// Remove every expired refresh and one-shot token.
    pub async fn purge_expired(&self) -> DomainResult<PurgedTokens> {
        let now = self.clock.now();
        let purged = PurgedTokens {
            refresh_tokens: self.repos.refresh_tokens().delete_expired(now).await?,
            one_shot_tokens: self.repos.one_shot_tokens().delete_expired(now).await?,
        };
        info!(
            refresh_tokens = purged.refresh_tokens,
            one_shot_tokens = purged.one_shot_tokens,
            "Expired tokens purged"
        );
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::identity::testing::TestContext;
    use crate::domain::OneShotTokenRepository;

    fn reason(err: DomainError) -> (TokenKind, TokenFailure) {
        match err {
            DomainError::TokenInvalid { token, reason } => (token, reason),
            other => panic!("expected a token error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn one_shot_token_is_single_use() {
        let ctx = TestContext::new();
        let account = ctx.account("a@x.com").await;
        let issued = ctx
            .tokens
            .issue_one_shot(&account, OneShotKind::EmailVerification)
            .await
            .unwrap();

        let owner = ctx
            .tokens
            .consume_one_shot(&issued.token, OneShotKind::EmailVerification)
            .await
            .unwrap();
        assert_eq!(owner.id, account.id);

        let second = ctx
            .tokens
            .consume_one_shot(&issued.token, OneShotKind::EmailVerification)
            .await
            .unwrap_err();
        assert_eq!(
            reason(second),
            (TokenKind::EmailVerification, TokenFailure::NotFound)
        );
    }

    #[tokio::test]
    async fn expired_one_shot_is_deleted_on_access() {
        let ctx = TestContext::new();
        let account = ctx.account("a@x.com").await;
        let issued = ctx
            .tokens
            .issue_one_shot(&account, OneShotKind::PasswordReset)
            .await
            .unwrap();
        assert_eq!(issued.expires_at - issued.created_at, Duration::minutes(15));

        ctx.clock.advance(Duration::minutes(16));
        let err = ctx
            .tokens
            .consume_one_shot(&issued.token, OneShotKind::PasswordReset)
            .await
            .unwrap_err();
        assert_eq!(reason(err), (TokenKind::PasswordReset, TokenFailure::Expired));

        let store: &dyn OneShotTokenRepository = ctx.repos.one_shot_tokens();
        assert!(store.find_by_token(&issued.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn kind_mismatch_keeps_the_token() {
        let ctx = TestContext::new();
        let account = ctx.account("a@x.com").await;
        let reset = ctx
            .tokens
            .issue_one_shot(&account, OneShotKind::PasswordReset)
            .await
            .unwrap();

        let err = ctx
            .tokens
            .consume_one_shot(&reset.token, OneShotKind::EmailVerification)
            .await
            .unwrap_err();
        assert_eq!(
            reason(err),
            (TokenKind::EmailVerification, TokenFailure::KindMismatch)
        );

        // still good for its real purpose
        assert!(ctx
            .tokens
            .consume_one_shot(&reset.token, OneShotKind::PasswordReset)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn concurrent_consumers_have_one_winner() {
        let ctx = TestContext::new();
        let account = ctx.account("a@x.com").await;
        let issued = ctx
            .tokens
            .issue_one_shot(&account, OneShotKind::EmailVerification)
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let tokens = ctx.tokens.clone();
            let token = issued.token.clone();
            handles.push(tokio::spawn(async move {
                tokens
                    .consume_one_shot(&token, OneShotKind::EmailVerification)
                    .await
                    .is_ok()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn refresh_replacement_invalidates_the_previous_token() {
        let ctx = TestContext::new();
        let account = ctx.account("a@x.com").await;

        let first = ctx.tokens.issue_or_replace_refresh(&account).await.unwrap();
        let second = ctx.tokens.issue_or_replace_refresh(&account).await.unwrap();
        assert_ne!(first.token, second.token);

        let err = ctx.tokens.verify_refresh(&first.token).await.unwrap_err();
        assert_eq!(reason(err), (TokenKind::Refresh, TokenFailure::NotFound));
        assert!(ctx.tokens.verify_refresh(&second.token).await.is_ok());

        let live = ctx
            .repos
            .refresh_tokens()
            .find_for_account(&account.id)
            .await
            .unwrap();
        assert_eq!(live.map(|t| t.token), Some(second.token));
    }

    #[tokio::test]
    async fn concurrent_refresh_issuance_leaves_one_live_token() {
        let ctx = TestContext::new();
        let account = ctx.account("a@x.com").await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let tokens = ctx.tokens.clone();
            let account = account.clone();
            handles.push(tokio::spawn(async move {
                tokens.issue_or_replace_refresh(&account).await.unwrap()
            }));
        }
        let mut issued = Vec::new();
        for handle in handles {
            issued.push(handle.await.unwrap());
        }

        let mut live = 0;
        for token in &issued {
            if ctx.tokens.verify_refresh(&token.token).await.is_ok() {
                live += 1;
            }
        }
        assert_eq!(live, 1);
        assert!(ctx.tokens.refresh_locks.is_empty());
    }

    #[tokio::test]
    async fn expired_refresh_is_deleted() {
        let ctx = TestContext::new();
        let account = ctx.account("a@x.com").await;
        let refresh = ctx.tokens.issue_or_replace_refresh(&account).await.unwrap();

        ctx.clock.advance(Duration::days(7));
        assert!(ctx.tokens.verify_refresh(&refresh.token).await.is_ok());

        ctx.clock.advance(Duration::seconds(1));
        let err = ctx.tokens.verify_refresh(&refresh.token).await.unwrap_err();
        assert_eq!(reason(err), (TokenKind::Refresh, TokenFailure::Expired));

        let err = ctx.tokens.verify_refresh(&refresh.token).await.unwrap_err();
        assert_eq!(reason(err), (TokenKind::Refresh, TokenFailure::NotFound));
    }

    #[tokio::test]
    async fn rotation_keeps_the_refresh_token() {
        let ctx = TestContext::new();
        let account = ctx.account("a@x.com").await;
        let refresh = ctx.tokens.issue_or_replace_refresh(&account).await.unwrap();

        let (access, owner) = ctx.tokens.rotate_access_token(&refresh.token).await.unwrap();
        assert_eq!(owner.id, account.id);
        assert!(ctx.codec.is_valid_for(&access.token, "a@x.com"));

        assert!(ctx.tokens.rotate_access_token(&refresh.token).await.is_ok());
    }

    #[tokio::test]
    async fn revocation_is_idempotent() {
        let ctx = TestContext::new();
        let account = ctx.account("a@x.com").await;
        let refresh = ctx.tokens.issue_or_replace_refresh(&account).await.unwrap();

        ctx.tokens.revoke_refresh(&refresh.token).await.unwrap();
        ctx.tokens.revoke_refresh(&refresh.token).await.unwrap();
        ctx.tokens.revoke_refresh("never-issued").await.unwrap();
        ctx.tokens.revoke_all_for_account(&account.id).await.unwrap();

        assert!(ctx.tokens.verify_refresh(&refresh.token).await.is_err());
    }

    #[tokio::test]
    async fn purge_removes_only_expired_tokens() {
        let ctx = TestContext::new();
        let account = ctx.account("a@x.com").await;
        ctx.tokens
            .issue_one_shot(&account, OneShotKind::PasswordReset)
            .await
            .unwrap();
        ctx.tokens
            .issue_one_shot(&account, OneShotKind::EmailVerification)
            .await
            .unwrap();
        ctx.tokens.issue_or_replace_refresh(&account).await.unwrap();

        ctx.clock.advance(Duration::hours(1));
        let purged = ctx.tokens.purge_expired().await.unwrap();
        assert_eq!(
            purged,
            PurgedTokens {
                refresh_tokens: 0,
                one_shot_tokens: 1
            }
        );
    }

    #[tokio::test]
    async fn out_of_range_lifetimes_fail_without_storing() {
        let ctx = TestContext::with_settings(IdentitySettings {
            refresh_token_ttl: Duration::days(1_000_000_000),
            password_reset_ttl: Duration::minutes(-1),
            ..IdentitySettings::default()
        });
        let account = ctx.account("a@x.com").await;

        let err = ctx.tokens.issue_or_replace_refresh(&account).await.unwrap_err();
        assert!(matches!(err, DomainError::Internal(_)));
        assert!(ctx
            .repos
            .refresh_tokens()
            .find_for_account(&account.id)
            .await
            .unwrap()
            .is_none());
        assert!(ctx.tokens.refresh_locks.is_empty());

        let err = ctx
            .tokens
            .issue_one_shot(&account, OneShotKind::PasswordReset)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Internal(_)));
    }
}
