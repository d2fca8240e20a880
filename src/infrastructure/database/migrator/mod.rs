//! Database migrations module

pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_accounts;
mod m20240101_000002_create_refresh_tokens;
mod m20240101_000003_create_one_shot_tokens;
mod m20240101_000004_create_login_attempts;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_accounts::Migration),
            Box::new(m20240101_000002_create_refresh_tokens::Migration),
            Box::new(m20240101_000003_create_one_shot_tokens::Migration),
            Box::new(m20240101_000004_create_login_attempts::Migration),
        ]
    }
}
