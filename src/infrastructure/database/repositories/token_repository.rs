use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use super::account_repository::db_err;
use crate::domain::{
    DomainResult, OneShotKind, OneShotToken, OneShotTokenRepository, RefreshToken,
    RefreshTokenRepository,
};
use crate::infrastructure::database::entities::{one_shot_token, refresh_token};

// ── Refresh tokens ──────────────────────────────────────────────

pub struct SeaOrmRefreshTokenRepository {
    db: DatabaseConnection,
}

impl SeaOrmRefreshTokenRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn refresh_model_to_domain(model: refresh_token::Model) -> RefreshToken {
    RefreshToken {
        id: model.id,
        token: model.token,
        account_id: model.account_id,
        expires_at: model.expires_at,
        created_at: model.created_at,
    }
}

#[async_trait]
impl RefreshTokenRepository for SeaOrmRefreshTokenRepository {
    async fn replace_for_account(&self, token: RefreshToken) -> DomainResult<()> {
        let txn = self.db.begin().await.map_err(db_err)?;

        refresh_token::Entity::delete_many()
            .filter(refresh_token::Column::AccountId.eq(token.account_id.as_str()))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        refresh_token::ActiveModel {
            id: Set(token.id),
            token: Set(token.token),
            account_id: Set(token.account_id),
            expires_at: Set(token.expires_at),
            created_at: Set(token.created_at),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> DomainResult<Option<RefreshToken>> {
        let model = refresh_token::Entity::find()
            .filter(refresh_token::Column::Token.eq(token))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(refresh_model_to_domain))
    }

    async fn find_for_account(&self, account_id: &str) -> DomainResult<Option<RefreshToken>> {
        let model = refresh_token::Entity::find()
            .filter(refresh_token::Column::AccountId.eq(account_id))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(refresh_model_to_domain))
    }

    async fn delete_by_token(&self, token: &str) -> DomainResult<bool> {
        let result = refresh_token::Entity::delete_many()
            .filter(refresh_token::Column::Token.eq(token))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected > 0)
    }

    async fn delete_for_account(&self, account_id: &str) -> DomainResult<u64> {
        let result = refresh_token::Entity::delete_many()
            .filter(refresh_token::Column::AccountId.eq(account_id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> DomainResult<u64> {
        let result = refresh_token::Entity::delete_many()
            .filter(refresh_token::Column::ExpiresAt.lt(now))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected)
    }
}

// ── One-shot tokens ─────────────────────────────────────────────

pub struct SeaOrmOneShotTokenRepository {
    db: DatabaseConnection,
}

impl SeaOrmOneShotTokenRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn kind_to_entity(kind: OneShotKind) -> one_shot_token::TokenKindColumn {
    match kind {
        OneShotKind::EmailVerification => one_shot_token::TokenKindColumn::EmailVerification,
        OneShotKind::PasswordReset => one_shot_token::TokenKindColumn::PasswordReset,
    }
}

fn kind_to_domain(kind: one_shot_token::TokenKindColumn) -> OneShotKind {
    match kind {
        one_shot_token::TokenKindColumn::EmailVerification => OneShotKind::EmailVerification,
        one_shot_token::TokenKindColumn::PasswordReset => OneShotKind::PasswordReset,
    }
}

fn one_shot_model_to_domain(model: one_shot_token::Model) -> OneShotToken {
    OneShotToken {
        id: model.id,
        token: model.token,
        kind: kind_to_domain(model.kind),
        account_id: model.account_id,
        expires_at: model.expires_at,
        created_at: model.created_at,
    }
}

#[async_trait]
impl OneShotTokenRepository for SeaOrmOneShotTokenRepository {
    async fn insert(&self, token: OneShotToken) -> DomainResult<()> {
        one_shot_token::ActiveModel {
            id: Set(token.id),
            token: Set(token.token),
            kind: Set(kind_to_entity(token.kind)),
            account_id: Set(token.account_id),
            expires_at: Set(token.expires_at),
            created_at: Set(token.created_at),
        }
        .insert(&self.db)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> DomainResult<Option<OneShotToken>> {
        let model = one_shot_token::Entity::find()
            .filter(one_shot_token::Column::Token.eq(token))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(one_shot_model_to_domain))
    }

    async fn list_for_account(&self, account_id: &str) -> DomainResult<Vec<OneShotToken>> {
        let models = one_shot_token::Entity::find()
            .filter(one_shot_token::Column::AccountId.eq(account_id))
            .order_by_desc(one_shot_token::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(models.into_iter().map(one_shot_model_to_domain).collect())
    }

    async fn delete_by_token(&self, token: &str) -> DomainResult<bool> {
        let result = one_shot_token::Entity::delete_many()
            .filter(one_shot_token::Column::Token.eq(token))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected == 1)
    }

    async fn delete_for_account(&self, account_id: &str) -> DomainResult<u64> {
        let result = one_shot_token::Entity::delete_many()
            .filter(one_shot_token::Column::AccountId.eq(account_id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> DomainResult<u64> {
        let result = one_shot_token::Entity::delete_many()
            .filter(one_shot_token::Column::ExpiresAt.lt(now))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected)
    }
}
