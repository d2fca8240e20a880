//! In-memory storage implementation

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::domain::{
    Account, AccountRepository, DomainError, DomainResult, GetAccountsDto, LoginAttempt,
    LoginAttemptRepository, OneShotToken, OneShotTokenRepository, RefreshToken,
    RefreshTokenRepository, RepositoryProvider, Role, UpdateProfileDto,
};
use crate::shared::{validate_pagination, PaginatedResult};

/// Shared tables. Account deletion cascades into the token tables, like the
/// foreign keys of the SQL schema.
#[derive(Default)]
struct MemoryState {
    accounts: DashMap<String, Account>,
    /// email -> account id; the unique index
    emails: DashMap<String, String>,
    /// account id -> its single refresh token
    refresh_tokens: DashMap<String, RefreshToken>,
    /// token string -> token
    one_shot_tokens: DashMap<String, OneShotToken>,
    login_attempts: DashMap<i64, LoginAttempt>,
    attempt_counter: AtomicI64,
}

impl MemoryState {
    fn cascade_account(&self, account_id: &str) {
        self.refresh_tokens.remove(account_id);
        self.one_shot_tokens.retain(|_, t| t.account_id != account_id);
    }
}

/// In-memory storage for development and testing
pub struct InMemoryRepositoryProvider {
    accounts: MemoryAccounts,
    refresh_tokens: MemoryRefreshTokens,
    one_shot_tokens: MemoryOneShotTokens,
    login_attempts: MemoryLoginAttempts,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        let state = Arc::new(MemoryState {
            attempt_counter: AtomicI64::new(1),
            ..MemoryState::default()
        });

        Self {
            accounts: MemoryAccounts(state.clone()),
            refresh_tokens: MemoryRefreshTokens(state.clone()),
            one_shot_tokens: MemoryOneShotTokens(state.clone()),
            login_attempts: MemoryLoginAttempts(state),
        }
    }
}

impl Default for InMemoryRepositoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryProvider for InMemoryRepositoryProvider {
    fn accounts(&self) -> &dyn AccountRepository {
        &self.accounts
    }

    fn refresh_tokens(&self) -> &dyn RefreshTokenRepository {
        &self.refresh_tokens
    }

    fn one_shot_tokens(&self) -> &dyn OneShotTokenRepository {
        &self.one_shot_tokens
    }

    fn login_attempts(&self) -> &dyn LoginAttemptRepository {
        &self.login_attempts
    }
}

// ── Accounts ────────────────────────────────────────────────────

struct MemoryAccounts(Arc<MemoryState>);

impl MemoryAccounts {
    fn mutate(
        &self,
        id: &str,
        at: DateTime<Utc>,
        f: impl FnOnce(&mut Account),
    ) -> DomainResult<()> {
        let mut account = self
            .0
            .accounts
            .get_mut(id)
            .ok_or_else(|| DomainError::account_not_found(id))?;
        f(&mut account);
        account.updated_at = at;
        Ok(())
    }
}

fn matches_filter(account: &Account, dto: &GetAccountsDto) -> bool {
    if let Some(search) = dto.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let hit = account.first_name.contains(search)
            || account.last_name.contains(search)
            || account.email.contains(search);
        if !hit {
            return false;
        }
    }
    if dto.role.is_some_and(|role| account.role != role) {
        return false;
    }
    if dto.is_active.is_some_and(|active| account.is_active != active) {
        return false;
    }
    true
}

#[async_trait]
impl AccountRepository for MemoryAccounts {
    async fn insert(&self, account: Account) -> DomainResult<Account> {
        match self.0.emails.entry(account.email.clone()) {
            Entry::Occupied(_) => Err(DomainError::EmailAlreadyExists(account.email)),
            Entry::Vacant(slot) => {
                slot.insert(account.id.clone());
                self.0.accounts.insert(account.id.clone(), account.clone());
                Ok(account)
            }
        }
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Account>> {
        Ok(self.0.accounts.get(id).map(|a| a.clone()))
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<Account>> {
        let Some(id) = self.0.emails.get(email).map(|id| id.clone()) else {
            return Ok(None);
        };
        self.find_by_id(&id).await
    }

    async fn exists_by_email(&self, email: &str) -> DomainResult<bool> {
        Ok(self.0.emails.contains_key(email))
    }

    async fn count(&self) -> DomainResult<u64> {
        Ok(self.0.accounts.len() as u64)
    }

    async fn list(&self, dto: GetAccountsDto) -> DomainResult<PaginatedResult<Account>> {
        let (page, page_size) = validate_pagination(dto.page, dto.page_size);

        let mut matched: Vec<Account> = self
            .0
            .accounts
            .iter()
            .filter(|a| matches_filter(a.value(), &dto))
            .map(|a| a.value().clone())
            .collect();
        matched.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.email.cmp(&b.email))
        });

        let total = matched.len() as u64;
        let offset = ((page - 1) * page_size) as usize;
        let items = matched
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .collect();

        Ok(PaginatedResult::new(items, total, page, page_size))
    }

    async fn update_profile(
        &self,
        id: &str,
        dto: UpdateProfileDto,
        at: DateTime<Utc>,
    ) -> DomainResult<Option<Account>> {
        if dto.is_empty() {
            return self.find_by_id(id).await;
        }
        let result = self.mutate(id, at, |account| {
            if let Some(first_name) = dto.first_name {
                account.first_name = first_name;
            }
            if let Some(last_name) = dto.last_name {
                account.last_name = last_name;
            }
            if let Some(phone) = dto.phone {
                account.phone = Some(phone).filter(|p| !p.trim().is_empty());
            }
        });

        match result {
            Ok(()) => self.find_by_id(id).await,
            Err(DomainError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn update_password_hash(
        &self,
        id: &str,
        password_hash: &str,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.mutate(id, at, |a| a.password_hash = password_hash.to_string())
    }

    async fn set_role(&self, id: &str, role: Role, at: DateTime<Utc>) -> DomainResult<()> {
        self.mutate(id, at, |a| a.role = role)
    }

    async fn set_active(&self, id: &str, active: bool, at: DateTime<Utc>) -> DomainResult<()> {
        self.mutate(id, at, |a| a.is_active = active)
    }

    async fn mark_email_verified(&self, id: &str, at: DateTime<Utc>) -> DomainResult<()> {
        self.mutate(id, at, |a| a.is_email_verified = true)
    }

    async fn stamp_last_login(&self, id: &str, at: DateTime<Utc>) -> DomainResult<()> {
        self.mutate(id, at, |a| a.last_login_at = Some(at))
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        let (_, account) = self
            .0
            .accounts
            .remove(id)
            .ok_or_else(|| DomainError::account_not_found(id))?;
        self.0.emails.remove(&account.email);
        self.0.cascade_account(id);
        Ok(())
    }

    async fn delete_unverified_before(&self, cutoff: DateTime<Utc>) -> DomainResult<Vec<String>> {
        let ids: Vec<String> = self
            .0
            .accounts
            .iter()
            .filter(|a| !a.is_email_verified && a.created_at < cutoff)
            .map(|a| a.id.clone())
            .collect();

        let mut removed = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some((_, account)) = self
                .0
                .accounts
                .remove_if(&id, |_, a| !a.is_email_verified)
            {
                self.0.emails.remove(&account.email);
                self.0.cascade_account(&id);
                removed.push(id);
            }
        }
        Ok(removed)
    }
}

// ── Refresh tokens ──────────────────────────────────────────────

struct MemoryRefreshTokens(Arc<MemoryState>);

impl MemoryRefreshTokens {
    fn owner_of(&self, token: &str) -> Option<String> {
        self.0
            .refresh_tokens
            .iter()
            .find(|t| t.token == token)
            .map(|t| t.key().clone())
    }
}

#[async_trait]
impl RefreshTokenRepository for MemoryRefreshTokens {
    async fn replace_for_account(&self, token: RefreshToken) -> DomainResult<()> {
        // keyed by account: insert overwrites the previous token in one step
        self.0.refresh_tokens.insert(token.account_id.clone(), token);
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> DomainResult<Option<RefreshToken>> {
        Ok(self
            .0
            .refresh_tokens
            .iter()
            .find(|t| t.token == token)
            .map(|t| t.value().clone()))
    }

    async fn find_for_account(&self, account_id: &str) -> DomainResult<Option<RefreshToken>> {
        Ok(self.0.refresh_tokens.get(account_id).map(|t| t.clone()))
    }

    async fn delete_by_token(&self, token: &str) -> DomainResult<bool> {
        let Some(owner) = self.owner_of(token) else {
            return Ok(false);
        };
        Ok(self
            .0
            .refresh_tokens
            .remove_if(&owner, |_, t| t.token == token)
            .is_some())
    }

    async fn delete_for_account(&self, account_id: &str) -> DomainResult<u64> {
        Ok(self.0.refresh_tokens.remove(account_id).map_or(0, |_| 1))
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> DomainResult<u64> {
        let before = self.0.refresh_tokens.len();
        self.0.refresh_tokens.retain(|_, t| !t.is_expired_at(now));
        Ok(before.saturating_sub(self.0.refresh_tokens.len()) as u64)
    }
}

// ── One-shot tokens ─────────────────────────────────────────────

struct MemoryOneShotTokens(Arc<MemoryState>);

#[async_trait]
impl OneShotTokenRepository for MemoryOneShotTokens {
    async fn insert(&self, token: OneShotToken) -> DomainResult<()> {
        if !self.0.accounts.contains_key(&token.account_id) {
            return Err(DomainError::account_not_found(token.account_id));
        }
        match self.0.one_shot_tokens.entry(token.token.clone()) {
            Entry::Occupied(_) => Err(DomainError::Internal(
                "one-shot token collision".to_string(),
            )),
            Entry::Vacant(slot) => {
                slot.insert(token);
                Ok(())
            }
        }
    }

    async fn find_by_token(&self, token: &str) -> DomainResult<Option<OneShotToken>> {
        Ok(self.0.one_shot_tokens.get(token).map(|t| t.clone()))
    }

    async fn list_for_account(&self, account_id: &str) -> DomainResult<Vec<OneShotToken>> {
        let mut tokens: Vec<OneShotToken> = self
            .0
            .one_shot_tokens
            .iter()
            .filter(|t| t.account_id == account_id)
            .map(|t| t.value().clone())
            .collect();
        tokens.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tokens)
    }

    async fn delete_by_token(&self, token: &str) -> DomainResult<bool> {
        Ok(self.0.one_shot_tokens.remove(token).is_some())
    }

    async fn delete_for_account(&self, account_id: &str) -> DomainResult<u64> {
        let before = self.0.one_shot_tokens.len();
        self.0
            .one_shot_tokens
            .retain(|_, t| t.account_id != account_id);
        Ok(before.saturating_sub(self.0.one_shot_tokens.len()) as u64)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> DomainResult<u64> {
        let before = self.0.one_shot_tokens.len();
        self.0.one_shot_tokens.retain(|_, t| t.expires_at >= now);
        Ok(before.saturating_sub(self.0.one_shot_tokens.len()) as u64)
    }
}

// ── Login attempts ──────────────────────────────────────────────

struct MemoryLoginAttempts(Arc<MemoryState>);

#[async_trait]
impl LoginAttemptRepository for MemoryLoginAttempts {
    async fn append(
        &self,
        email: &str,
        successful: bool,
        at: DateTime<Utc>,
    ) -> DomainResult<LoginAttempt> {
        let id = self.0.attempt_counter.fetch_add(1, Ordering::SeqCst);
        let attempt = LoginAttempt {
            id,
            email: email.to_string(),
            successful,
            timestamp: at,
        };
        self.0.login_attempts.insert(id, attempt.clone());
        Ok(attempt)
    }

    async fn list_for_email(&self, email: &str, limit: u64) -> DomainResult<Vec<LoginAttempt>> {
        let mut attempts: Vec<LoginAttempt> = self
            .0
            .login_attempts
            .iter()
            .filter(|a| a.email == email)
            .map(|a| a.value().clone())
            .collect();
        attempts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        attempts.truncate(limit as usize);
        Ok(attempts)
    }
}
