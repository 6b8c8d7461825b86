//! Create `services` table.
//!
//! `features` is an ordered JSON array of strings. `created_by` holds a user id
//! without a foreign key so removing a user never touches the catalog.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Services::Table)
                    .if_not_exists()
                    .col(pk_auto(Services::Id))
                    .col(string_len(Services::Title, 100))
                    .col(string_len(Services::Description, 1000))
                    .col(string_len(Services::ShortDescription, 200))
                    .col(string_len(Services::Icon, 64).default("service"))
                    .col(string_len_null(Services::Image, 512))
                    .col(text(Services::Category))
                    .col(double_null(Services::Price).check(Expr::col(Services::Price).gte(0)))
                    .col(text(Services::Currency).default("USD"))
                    .col(string_len_null(Services::Duration, 64))
                    .col(json_binary(Services::Features))
                    .col(boolean(Services::IsActive).default(true))
                    .col(integer(Services::DisplayOrder).default(0))
                    .col(integer(Services::CreatedBy))
                    .col(timestamp_with_time_zone(Services::CreatedAt))
                    .col(timestamp_with_time_zone(Services::UpdatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Services::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Services {
    Table,
    Id,
    Title,
    Description,
    ShortDescription,
    Icon,
    Image,
    Category,
    Price,
    Currency,
    Duration,
    Features,
    IsActive,
    DisplayOrder,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}
