//! Account service: application-layer orchestration
//!
//! All account-related business logic lives here.
//! HTTP handlers are thin wrappers that derive an [`Actor`] from the bearer
//! token and delegate to this service, which consults the
//! [`AuthorizationGate`] before touching anything it does not own.

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info, warn};
use validator::ValidateEmail;

use super::{
    hash_password, verify_password, AuthenticationResult, IdentitySettings, PurgedTokens,
    SessionManager, TokenLifecycleManager,
};
use crate::domain::{
    Account, Actor, AuthorizationGate, CreateAccountDto, DomainError, DomainResult,
    GetAccountsDto, LoginAttempt, NotificationSender, OneShotKind, PasswordHasher,
    RepositoryProvider, Role, UpdateProfileDto,
};
use crate::infrastructure::crypto::{IssuedToken, TokenCodec};
use crate::shared::{
    check_password, Clock, PaginatedResult, Violations, EMAIL_MAX_LEN,
    NAME_MAX_LEN, PHONE_MAX_LEN,
};

/// Self-registration request. The password is plain text here and never
/// leaves this layer unhashed.
#[derive(Debug, Clone)]
pub struct RegisterAccount {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

impl RegisterAccount {
    fn validate(&self) -> DomainResult<()> {
        let mut v = Violations::new();
        v.check(self.email.validate_email(), "email", "invalid email format")
            .max_len("email", &self.email, EMAIL_MAX_LEN)
            .not_blank("first_name", &self.first_name)
            .max_len("first_name", &self.first_name, NAME_MAX_LEN)
            .not_blank("last_name", &self.last_name)
            .max_len("last_name", &self.last_name, NAME_MAX_LEN);
        if let Some(phone) = &self.phone {
            v.max_len("phone", phone, PHONE_MAX_LEN);
        }
        v.into_result()?;
        check_password("password", &self.password)
    }
}

/// Outcome of an admin maintenance run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub accounts_removed: u64,
    pub tokens: PurgedTokens,
}

/// Orchestrates registration, verification, password
/// flows, profile management and role administration.
pub struct AccountService {
    repos: Arc<dyn RepositoryProvider>,
    hasher: Arc<dyn PasswordHasher>,
    codec: Arc<TokenCodec>,
    tokens: Arc<TokenLifecycleManager>,
    sessions: Arc<SessionManager>,
    notifier: Arc<dyn NotificationSender>,
    clock: Arc<dyn Clock>,
    settings: IdentitySettings,
}

impl AccountService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        hasher: Arc<dyn PasswordHasher>,
        codec: Arc<TokenCodec>,
        notifier: Arc<dyn NotificationSender>,
        clock: Arc<dyn Clock>,
        settings: IdentitySettings,
    ) -> Self {
        let tokens = Arc::new(TokenLifecycleManager::new(
            repos.clone(),
            codec.clone(),
            clock.clone(),
            settings.clone(),
        ));
        let sessions = Arc::new(SessionManager::new(
            repos.clone(),
            hasher.clone(),
            codec.clone(),
            tokens.clone(),
            clock.clone(),
            &settings,
        ));

        Self {
            repos,
            hasher,
            codec,
            tokens,
            sessions,
            notifier,
            clock,
            settings,
        }
    }

    pub fn codec(&self) -> &Arc<TokenCodec> {
        &self.codec
    }

    pub fn tokens(&self) -> &Arc<TokenLifecycleManager> {
        &self.tokens
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    async fn load(&self, id: &str) -> DomainResult<Account> {
        self.repos
            .accounts()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::account_not_found(id))
    }

    // ── Registration & verification ─────────────────────────────

    /// Create an unverified USER account and send its verification link.
    pub async fn register(&self, request: RegisterAccount) -> DomainResult<Account> {
        request.validate()?;

        if self.repos.accounts().exists_by_email(&request.email).await? {
            return Err(DomainError::EmailAlreadyExists(request.email));
        }

        let password_hash = hash_password(&self.hasher, &request.password).await?;
        let phone = request.phone.filter(|p| !p.trim().is_empty());
        let dto = CreateAccountDto::new(
            request.email,
            password_hash,
            request.first_name.trim(),
            request.last_name.trim(),
            phone,
        );

        // The unique index settles a race with a concurrent registration.
        let account = self
            .repos
            .accounts()
            .insert(Account::new(dto, self.clock.now())?)
            .await?;
        info!(account_id = %account.id, "Account registered");

        self.send_verification(&account).await?;
        Ok(account)
    }

    async fn send_verification(&self, account: &Account) -> DomainResult<()> {
        let token = self
            .tokens
            .issue_one_shot(account, OneShotKind::EmailVerification)
            .await?;
        if let Err(e) = self
            .notifier
            .send_verification(&account.email, &token.token)
            .await
        {
            warn!(account_id = %account.id, error = %e, "Failed to send verification email");
        }
        Ok(())
    }

    /// Redeem an email verification token.
    pub async fn verify_email(&self, token: &str) -> DomainResult<Account> {
        let account = self
            .tokens
            .consume_one_shot(token, OneShotKind::EmailVerification)
            .await?;

        self.repos.accounts().mark_email_verified(&account.id, self.clock.now()).await?;
        info!(account_id = %account.id, "Email verified");
        self.load(&account.id).await
    }

    /// Send a fresh verification link. Silent for unknown or already
    /// verified addresses.
    pub async fn resend_verification(&self, email: &str) -> DomainResult<()> {
        match self.repos.accounts().find_by_email(email).await? {
            Some(account) if !account.is_email_verified && account.is_active => {
                self.send_verification(&account).await
            }
            _ => {
                debug!("Verification resend skipped");
                Ok(())
            }
        }
    }

    // ── Password flows ──────────────────────────────────────────

    /// Start a password reset. Always succeeds so callers cannot probe
    /// which addresses are registered.
    pub async fn initiate_password_reset(&self, email: &str) -> DomainResult<()> {
        let Some(account) = self.repos.accounts().find_by_email(email).await? else {
            debug!("Password reset requested for unknown address");
            return Ok(());
        };

        let token = self
            .tokens
            .issue_one_shot(&account, OneShotKind::PasswordReset)
            .await?;
        if let Err(e) = self
            .notifier
            .send_password_reset(&account.email, &token.token)
            .await
        {
            warn!(account_id = %account.id, error = %e, "Failed to send password reset email");
        }
        Ok(())
    }

    /// Redeem a password reset token. Open sessions are closed.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> DomainResult<()> {
        // Check the policy first so a weak password does not burn the token.
        check_password("new_password", new_password)?;

        let account = self
            .tokens
            .consume_one_shot(token, OneShotKind::PasswordReset)
            .await?;

        let password_hash = hash_password(&self.hasher, new_password).await?;
        self.repos
            .accounts()
            .update_password_hash(&account.id, &password_hash, self.clock.now())
            .await?;
        self.tokens.revoke_all_for_account(&account.id).await?;

        info!(account_id = %account.id, "Password reset");
        Ok(())
    }

    /// Change the actor's own password after re-checking the current one.
    pub async fn change_password(
        &self,
        actor: &Actor,
        current_password: &str,
        new_password: &str,
    ) -> DomainResult<()> {
        let account = self.load(&actor.user_id).await?;

        if !verify_password(&self.hasher, current_password, &account.password_hash).await? {
            return Err(DomainError::InvalidCredentials);
        }
        check_password("new_password", new_password)?;

        let password_hash = hash_password(&self.hasher, new_password).await?;
        self.repos
            .accounts()
            .update_password_hash(&account.id, &password_hash, self.clock.now())
            .await?;

        info!(account_id = %account.id, "Password changed");
        Ok(())
    }

    // ── Sessions ────────────────────────────────────────────────

    pub async fn login(&self, email: &str, password: &str) -> DomainResult<AuthenticationResult> {
        self.sessions.login(email, password).await
    }

    pub async fn refresh(&self, refresh_token: &str) -> DomainResult<(IssuedToken, Account)> {
        self.sessions.refresh(refresh_token).await
    }

    pub async fn logout(&self, refresh_token: &str) -> DomainResult<()> {
        self.sessions.logout(refresh_token).await
    }

    // ── Profiles ────────────────────────────────────────────────

    pub async fn current_account(&self, actor: &Actor) -> DomainResult<Account> {
        self.load(&actor.user_id).await
    }

    pub async fn get_account(&self, actor: &Actor, id: &str) -> DomainResult<Account> {
        AuthorizationGate::ensure_self_or_admin(actor, id)?;
        self.load(id).await
    }

    pub async fn list_accounts(
        &self,
        actor: &Actor,
        query: GetAccountsDto,
    ) -> DomainResult<PaginatedResult<Account>> {
        AuthorizationGate::ensure_admin(actor)?;
        self.repos.accounts().list(query).await
    }

    pub async fn update_profile(
        &self,
        actor: &Actor,
        id: &str,
        dto: UpdateProfileDto,
    ) -> DomainResult<Account> {
        AuthorizationGate::ensure_self_or_admin(actor, id)?;

        let mut v = Violations::new();
        if let Some(first_name) = &dto.first_name {
            v.not_blank("first_name", first_name)
                .max_len("first_name", first_name, NAME_MAX_LEN);
        }
        if let Some(last_name) = &dto.last_name {
            v.not_blank("last_name", last_name)
                .max_len("last_name", last_name, NAME_MAX_LEN);
        }
        if let Some(phone) = &dto.phone {
            v.max_len("phone", phone, PHONE_MAX_LEN);
        }
        v.into_result()?;

        let dto = UpdateProfileDto {
            first_name: dto.first_name.map(|s| s.trim().to_string()),
            last_name: dto.last_name.map(|s| s.trim().to_string()),
            phone: dto.phone.map(|s| s.trim().to_string()),
        };

        let account = self
            .repos
            .accounts()
            .update_profile(id, dto, self.clock.now())
            .await?
            .ok_or_else(|| DomainError::account_not_found(id))?;
        debug!(account_id = %id, "Profile updated");
        Ok(account)
    }

    /// Delete an account together with its tokens.
    pub async fn delete_account(&self, actor: &Actor, id: &str) -> DomainResult<()> {
        AuthorizationGate::ensure_self_or_admin(actor, id)?;

        self.tokens.revoke_all_for_account(id).await?;
        self.repos.one_shot_tokens().delete_for_account(id).await?;
        self.repos.accounts().delete(id).await?;

        info!(account_id = %id, deleted_by = %actor.user_id, "Account deleted");
        Ok(())
    }

    pub async fn login_history(&self, actor: &Actor, id: &str) -> DomainResult<Vec<LoginAttempt>> {
        AuthorizationGate::ensure_self_or_admin(actor, id)?;
        let account = self.load(id).await?;
        self.repos
            .login_attempts()
            .list_for_email(&account.email, self.settings.login_history_limit)
            .await
    }

    // ── Administration ──────────────────────────────────────────

    pub async fn assign_role(&self, actor: &Actor, id: &str, role: Role) -> DomainResult<Account> {
        AuthorizationGate::ensure_admin(actor)?;
        self.repos.accounts().set_role(id, role, self.clock.now()).await?;
        info!(account_id = %id, role = %role, "Role assigned");
        self.load(id).await
    }

    /// Block the account and close its sessions.
    pub async fn deactivate(&self, actor: &Actor, id: &str) -> DomainResult<Account> {
        AuthorizationGate::ensure_admin(actor)?;
        self.repos.accounts().set_active(id, false, self.clock.now()).await?;
        self.tokens.revoke_all_for_account(id).await?;
        info!(account_id = %id, "Account deactivated");
        self.load(id).await
    }

    pub async fn reactivate(&self, actor: &Actor, id: &str) -> DomainResult<Account> {
        AuthorizationGate::ensure_admin(actor)?;
        self.repos.accounts().set_active(id, true, self.clock.now()).await?;
        info!(account_id = %id, "Account reactivated");
        self.load(id).await
    }

    /// Remove accounts that stayed unverified for longer than `older_than`.
    pub async fn purge_unverified(
        &self,
        actor: &Actor,
        older_than: Duration,
    ) -> DomainResult<MaintenanceReport> {
        AuthorizationGate::ensure_admin(actor)?;
        if older_than < Duration::zero() {
            return Err(DomainError::validation("older_than_hours", "must not be negative"));
        }

        let cutoff = self.clock.now() - older_than;
        let removed = self.repos.accounts().delete_unverified_before(cutoff).await?;
        info!(count = removed.len(), cutoff = %cutoff, "Unverified accounts purged");

        Ok(MaintenanceReport {
            accounts_removed: removed.len() as u64,
            ..MaintenanceReport::default()
        })
    }

    pub async fn purge_expired_tokens(&self, actor: &Actor) -> DomainResult<MaintenanceReport> {
        AuthorizationGate::ensure_admin(actor)?;
        Ok(MaintenanceReport {
            tokens: self.tokens.purge_expired().await?,
            ..MaintenanceReport::default()
        })
    }

    /// Create a verified ADMIN account when the store holds no accounts.
    /// Returns the account when one was created.
    pub async fn ensure_default_admin(
        &self,
        email: &str,
        password: &str,
    ) -> DomainResult<Option<Account>> {
        if self.repos.accounts().count().await? > 0 {
            return Ok(None);
        }
        check_password("admin.password", password)?;

        let password_hash = hash_password(&self.hasher, password).await?;
        let dto = CreateAccountDto::new(email, password_hash, "System", "Administrator", None)
            .with_role(Role::Admin)
            .verified();
        let account = self
            .repos
            .accounts()
            .insert(Account::new(dto, self.clock.now())?)
            .await?;

        info!(account_id = %account.id, email = %account.email, "Default admin account created");
        Ok(Some(account))
    }
}
