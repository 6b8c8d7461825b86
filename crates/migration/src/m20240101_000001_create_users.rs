//! Create `users` table.
//!
//! Email is unique and stored lowercased by the application.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string_len(Users::Name, 50))
                    .col(string_len(Users::Email, 255).unique_key())
                    .col(string_len(Users::PasswordHash, 255))
                    .col(text(Users::Role).default("user"))
                    .col(boolean(Users::IsActive).default(true))
                    .col(string_len_null(Users::Phone, 20))
                    .col(string_len_null(Users::Location, 100))
                    .col(string_len_null(Users::Bio, 500))
                    .col(timestamp_with_time_zone(Users::CreatedAt))
                    .col(timestamp_with_time_zone(Users::UpdatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Users::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Users { Table, Id, Name, Email, PasswordHash, Role, IsActive, Phone, Location, Bio, CreatedAt, UpdatedAt }
