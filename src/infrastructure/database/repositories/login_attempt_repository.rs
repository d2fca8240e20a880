use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use super::account_repository::db_err;
use crate::domain::{DomainResult, LoginAttempt, LoginAttemptRepository};
use crate::infrastructure::database::entities::login_attempt;

pub struct SeaOrmLoginAttemptRepository {
    db: DatabaseConnection,
}

impl SeaOrmLoginAttemptRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn attempt_model_to_domain(model: login_attempt::Model) -> LoginAttempt {
    LoginAttempt {
        id: model.id,
        email: model.email,
        successful: model.successful,
        timestamp: model.timestamp,
    }
}

#[async_trait]
impl LoginAttemptRepository for SeaOrmLoginAttemptRepository {
    async fn append(
        &self,
        email: &str,
        successful: bool,
        at: DateTime<Utc>,
    ) -> DomainResult<LoginAttempt> {
        let model = login_attempt::ActiveModel {
            id: NotSet,
            email: Set(email.to_string()),
            successful: Set(successful),
            timestamp: Set(at),
        }
        .insert(&self.db)
        .await
        .map_err(db_err)?;

        Ok(attempt_model_to_domain(model))
    }

    async fn list_for_email(&self, email: &str, limit: u64) -> DomainResult<Vec<LoginAttempt>> {
        let models = login_attempt::Entity::find()
            .filter(login_attempt::Column::Email.eq(email))
            .order_by_desc(login_attempt::Column::Timestamp)
            .order_by_desc(login_attempt::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(models.into_iter().map(attempt_model_to_domain).collect())
    }
}
