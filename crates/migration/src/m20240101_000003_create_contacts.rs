//! Create `contacts` table (contact-form inbox).
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Contacts::Table)
                    .if_not_exists()
                    .col(pk_auto(Contacts::Id))
                    .col(string_len(Contacts::Name, 50))
                    .col(string_len(Contacts::Email, 255))
                    .col(string_len_null(Contacts::Phone, 20))
                    .col(string_len(Contacts::Subject, 100))
                    .col(string_len(Contacts::Message, 1000))
                    .col(text(Contacts::Status).default("new"))
                    .col(text(Contacts::Priority).default("medium"))
                    .col(integer_null(Contacts::AssignedTo))
                    // {message, repliedBy, repliedAt}
                    .col(json_binary_null(Contacts::Reply))
                    .col(string_len_null(Contacts::IpAddress, 64))
                    .col(string_len_null(Contacts::UserAgent, 512))
                    .col(timestamp_with_time_zone(Contacts::CreatedAt))
                    .col(timestamp_with_time_zone(Contacts::UpdatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Contacts::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Contacts {
    Table,
    Id,
    Name,
    Email,
    Phone,
    Subject,
    Message,
    Status,
    Priority,
    AssignedTo,
    Reply,
    IpAddress,
    UserAgent,
    CreatedAt,
    UpdatedAt,
}
