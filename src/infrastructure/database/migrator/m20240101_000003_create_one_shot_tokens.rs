//! Create one_shot_tokens table

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_accounts::Accounts;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OneShotTokens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OneShotTokens::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(OneShotTokens::Token)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(OneShotTokens::Kind).string_len(32).not_null())
                    .col(ColumnDef::new(OneShotTokens::AccountId).string().not_null())
                    .col(
                        ColumnDef::new(OneShotTokens::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OneShotTokens::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_one_shot_tokens_account_id")
                            .from(OneShotTokens::Table, OneShotTokens::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_one_shot_tokens_account_id")
                    .table(OneShotTokens::Table)
                    .col(OneShotTokens::AccountId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OneShotTokens::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum OneShotTokens {
    Table,
    Id,
    Token,
    Kind,
    AccountId,
    ExpiresAt,
    CreatedAt,
}
