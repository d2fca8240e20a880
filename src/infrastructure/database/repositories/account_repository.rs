use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};

use crate::domain::{
    Account, AccountRepository, DomainError, DomainResult, GetAccountsDto, Role, UpdateProfileDto,
};
use crate::infrastructure::database::entities::account;
use crate::shared::{validate_pagination, PaginatedResult};

pub struct SeaOrmAccountRepository {
    db: DatabaseConnection,
}

impl SeaOrmAccountRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Column-targeted `UPDATE … WHERE id = ?`. `NotFound` if no row matched.
    async fn update_columns(
        &self,
        id: &str,
        columns: Vec<(account::Column, sea_orm::sea_query::SimpleExpr)>,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        let mut update = account::Entity::update_many()
            .col_expr(account::Column::UpdatedAt, Expr::value(at))
            .filter(account::Column::Id.eq(id));
        for (column, value) in columns {
            update = update.col_expr(column, value);
        }

        let result = update.exec(&self.db).await.map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(DomainError::account_not_found(id));
        }
        Ok(())
    }
}

// ── Conversion helpers ──────────────────────────────────────────

pub(crate) fn entity_role_to_domain(role: account::AccountRole) -> Role {
    match role {
        account::AccountRole::User => Role::User,
        account::AccountRole::Organizer => Role::Organizer,
        account::AccountRole::Admin => Role::Admin,
    }
}

pub(crate) fn domain_role_to_entity(role: Role) -> account::AccountRole {
    match role {
        Role::User => account::AccountRole::User,
        Role::Organizer => account::AccountRole::Organizer,
        Role::Admin => account::AccountRole::Admin,
    }
}

fn account_model_to_domain(model: account::Model) -> Account {
    Account {
        id: model.id,
        email: model.email,
        password_hash: model.password_hash,
        first_name: model.first_name,
        last_name: model.last_name,
        phone: model.phone,
        role: entity_role_to_domain(model.role),
        is_active: model.is_active,
        is_email_verified: model.is_email_verified,
        created_at: model.created_at,
        updated_at: model.updated_at,
        last_login_at: model.last_login_at,
    }
}

pub(crate) fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::from(e)
}

// ── Repository implementation ───────────────────────────────────

#[async_trait]
impl AccountRepository for SeaOrmAccountRepository {
    async fn insert(&self, account: Account) -> DomainResult<Account> {
        let email = account.email.clone();
        let model = account::ActiveModel {
            id: Set(account.id),
            email: Set(account.email),
            password_hash: Set(account.password_hash),
            first_name: Set(account.first_name),
            last_name: Set(account.last_name),
            phone: Set(account.phone),
            role: Set(domain_role_to_entity(account.role)),
            is_active: Set(account.is_active),
            is_email_verified: Set(account.is_email_verified),
            created_at: Set(account.created_at),
            updated_at: Set(account.updated_at),
            last_login_at: Set(account.last_login_at),
        };

        let inserted = model.insert(&self.db).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                DomainError::EmailAlreadyExists(email)
            } else {
                db_err(e)
            }
        })?;

        Ok(account_model_to_domain(inserted))
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Account>> {
        let model = account::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(account_model_to_domain))
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<Account>> {
        let model = account::Entity::find()
            .filter(account::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(account_model_to_domain))
    }

    async fn exists_by_email(&self, email: &str) -> DomainResult<bool> {
        let count = account::Entity::find()
            .filter(account::Column::Email.eq(email))
            .count(&self.db)
            .await
            .map_err(db_err)?;

        Ok(count > 0)
    }

    async fn count(&self) -> DomainResult<u64> {
        account::Entity::find().count(&self.db).await.map_err(db_err)
    }

    async fn list(&self, dto: GetAccountsDto) -> DomainResult<PaginatedResult<Account>> {
        let (page, page_size) = validate_pagination(dto.page, dto.page_size);

        let mut query = account::Entity::find();

        // Apply search filter (first name, last name or email)
        if let Some(search) = dto.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(account::Column::FirstName.contains(search))
                    .add(account::Column::LastName.contains(search))
                    .add(account::Column::Email.contains(search)),
            );
        }

        if let Some(role) = dto.role {
            query = query.filter(account::Column::Role.eq(domain_role_to_entity(role)));
        }

        if let Some(active) = dto.is_active {
            query = query.filter(account::Column::IsActive.eq(active));
        }

        query = query
            .order_by_desc(account::Column::CreatedAt)
            .order_by_asc(account::Column::Email);

        // Count total
        let total = query.clone().count(&self.db).await.map_err(db_err)?;

        // Paginate
        let offset = ((page - 1) * page_size) as u64;
        let models = query
            .offset(offset)
            .limit(page_size as u64)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let items: Vec<Account> = models.into_iter().map(account_model_to_domain).collect();

        Ok(PaginatedResult::new(items, total, page, page_size))
    }

    async fn update_profile(
        &self,
        id: &str,
        dto: UpdateProfileDto,
        at: DateTime<Utc>,
    ) -> DomainResult<Option<Account>> {
        if !dto.is_empty() {
            let mut columns = Vec::new();
            if let Some(first_name) = dto.first_name {
                columns.push((account::Column::FirstName, Expr::value(first_name)));
            }
            if let Some(last_name) = dto.last_name {
                columns.push((account::Column::LastName, Expr::value(last_name)));
            }
            if let Some(phone) = dto.phone {
                let phone = Some(phone).filter(|p| !p.trim().is_empty());
                columns.push((account::Column::Phone, Expr::value(phone)));
            }

            match self.update_columns(id, columns, at).await {
                Ok(()) => {}
                Err(DomainError::NotFound { .. }) => return Ok(None),
                Err(e) => return Err(e),
            }
        }

        self.find_by_id(id).await
    }

    async fn update_password_hash(
        &self,
        id: &str,
        password_hash: &str,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.update_columns(
            id,
            vec![(account::Column::PasswordHash, Expr::value(password_hash))],
            at,
        )
        .await
    }

    async fn set_role(&self, id: &str, role: Role, at: DateTime<Utc>) -> DomainResult<()> {
        self.update_columns(
            id,
            vec![(
                account::Column::Role,
                Expr::value(domain_role_to_entity(role)),
            )],
            at,
        )
        .await
    }

    async fn set_active(&self, id: &str, active: bool, at: DateTime<Utc>) -> DomainResult<()> {
        self.update_columns(
            id,
            vec![(account::Column::IsActive, Expr::value(active))],
            at,
        )
        .await
    }

    async fn mark_email_verified(&self, id: &str, at: DateTime<Utc>) -> DomainResult<()> {
        self.update_columns(
            id,
            vec![(account::Column::IsEmailVerified, Expr::value(true))],
            at,
        )
        .await
    }

    async fn stamp_last_login(&self, id: &str, at: DateTime<Utc>) -> DomainResult<()> {
        self.update_columns(
            id,
            vec![(account::Column::LastLoginAt, Expr::value(at))],
            at,
        )
        .await
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        let result = account::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(DomainError::account_not_found(id));
        }
        Ok(())
    }

    async fn delete_unverified_before(&self, cutoff: DateTime<Utc>) -> DomainResult<Vec<String>> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let ids: Vec<String> = account::Entity::find()
            .select_only()
            .column(account::Column::Id)
            .filter(account::Column::IsEmailVerified.eq(false))
            .filter(account::Column::CreatedAt.lt(cutoff))
            .into_tuple()
            .all(&txn)
            .await
            .map_err(db_err)?;

        if !ids.is_empty() {
            account::Entity::delete_many()
                .filter(account::Column::Id.is_in(ids.clone()))
                .exec(&txn)
                .await
                .map_err(db_err)?;
        }

        txn.commit().await.map_err(db_err)?;
        Ok(ids)
    }
}
