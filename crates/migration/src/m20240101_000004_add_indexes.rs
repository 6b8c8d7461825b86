use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Services: public listing filters on category + is_active
        manager
            .create_index(
                Index::create()
                    .name("idx_services_category_active")
                    .table(Services::Table)
                    .col(Services::Category)
                    .col(Services::IsActive)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_services_display_order")
                    .table(Services::Table)
                    .col(Services::DisplayOrder)
                    .to_owned(),
            )
            .await?;

        // Contacts: inbox filters by status and sorts by created_at
        manager
            .create_index(
                Index::create()
                    .name("idx_contacts_status")
                    .table(Contacts::Table)
                    .col(Contacts::Status)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_contacts_created_at")
                    .table(Contacts::Table)
                    .col(Contacts::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_services_category_active").table(Services::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_services_display_order").table(Services::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_contacts_status").table(Contacts::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_contacts_created_at").table(Contacts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Services { Table, Category, IsActive, DisplayOrder }

#[derive(DeriveIden)]
enum Contacts { Table, Status, CreatedAt }
