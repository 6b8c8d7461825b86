use async_trait::async_trait;
use chrono::Utc;
use models::service::Features;
use models::{contact, service, user, ContactStatus, Priority};
use sea_orm::sea_query::{Expr, Func, LikeExpr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, FromQueryResult, ModelTrait,
    NotSet, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use tracing::instrument;

use crate::backend::{Backend, BackendKind};
use crate::errors::StoreError;
use crate::pagination::{Page, Pagination};
use crate::types::{
    ContactChanges, ContactPage, ContactQuery, NewContact, NewService, NewUser, ServiceChanges, ServiceQuery,
    StatusCount, UserChanges, UserQuery,
};

/// sea-orm backed store over a pooled Postgres connection.
pub struct PostgresBackend {
    pub db: DatabaseConnection,
}

impl PostgresBackend {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

#[derive(Debug, FromQueryResult)]
struct StatusCountRow {
    status: ContactStatus,
    count: i64,
}

/// Wrap a needle in `%..%`, escaping LIKE metacharacters so input only matches literally.
fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn lower_like(col: service::Column, needle: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(col))).like(LikeExpr::new(escape_like(needle)).escape('\\'))
}

async fn fetch_page<E>(select: Select<E>, db: &DatabaseConnection, p: Pagination) -> Result<Page<E::Model>, StoreError>
where
    E: EntityTrait,
    E::Model: FromQueryResult + Sized + Send + Sync + 'static,
{
    let paginator = select.paginate(db, p.limit);
    let total = paginator.num_items().await?;
    // 超出末页时不再查询，直接返回空页
    let items = if p.offset() >= total { Vec::new() } else { paginator.fetch_page(p.page - 1).await? };
    Ok(Page { items, total, page: p.page, pages: p.pages(total) })
}

#[async_trait]
impl Backend for PostgresBackend {
    fn kind(&self) -> BackendKind { BackendKind::Postgres }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<user::Model>, StoreError> {
        Ok(user::Entity::find().filter(user::Column::Email.eq(email)).one(&self.db).await?)
    }

    async fn find_user_by_id(&self, id: i32) -> Result<Option<user::Model>, StoreError> {
        Ok(user::Entity::find_by_id(id).one(&self.db).await?)
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    async fn create_user(&self, input: NewUser) -> Result<user::Model, StoreError> {
        let ts = Utc::now().into();
        let am = user::ActiveModel {
            id: NotSet,
            name: Set(input.name),
            email: Set(input.email),
            password_hash: Set(input.password_hash),
            role: Set(input.role),
            is_active: Set(input.is_active),
            phone: Set(None),
            location: Set(None),
            bio: Set(None),
            created_at: Set(ts),
            updated_at: Set(ts),
        };
        Ok(am.insert(&self.db).await?)
    }

    async fn update_user(&self, id: i32, changes: UserChanges) -> Result<Option<user::Model>, StoreError> {
        let Some(found) = user::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };
        let mut am: user::ActiveModel = found.into();
        if let Some(v) = changes.name { am.name = Set(v); }
        if let Some(v) = changes.email { am.email = Set(v); }
        if let Some(v) = changes.password_hash { am.password_hash = Set(v); }
        if let Some(v) = changes.role { am.role = Set(v); }
        if let Some(v) = changes.is_active { am.is_active = Set(v); }
        if let Some(v) = changes.phone { am.phone = Set(Some(v)); }
        if let Some(v) = changes.location { am.location = Set(Some(v)); }
        if let Some(v) = changes.bio { am.bio = Set(Some(v)); }
        am.updated_at = Set(Utc::now().into());
        Ok(Some(am.update(&self.db).await?))
    }

    async fn delete_user(&self, id: i32) -> Result<Option<user::Model>, StoreError> {
        let Some(found) = user::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };
        found.clone().delete(&self.db).await?;
        Ok(Some(found))
    }

    async fn list_users(&self, query: &UserQuery) -> Result<Page<user::Model>, StoreError> {
        let select = user::Entity::find()
            .order_by_desc(user::Column::CreatedAt)
            .order_by_desc(user::Column::Id);
        fetch_page(select, &self.db, query.pagination).await
    }

    async fn find_service_by_id(&self, id: i32) -> Result<Option<service::Model>, StoreError> {
        Ok(service::Entity::find_by_id(id).one(&self.db).await?)
    }

    #[instrument(skip(self, input), fields(title = %input.title, category = %input.category))]
    async fn create_service(&self, input: NewService) -> Result<service::Model, StoreError> {
        let ts = Utc::now().into();
        let am = service::ActiveModel {
            id: NotSet,
            title: Set(input.title),
            description: Set(input.description),
            short_description: Set(input.short_description),
            icon: Set(input.icon),
            image: Set(input.image),
            category: Set(input.category),
            price: Set(input.price),
            currency: Set(input.currency),
            duration: Set(input.duration),
            features: Set(Features(input.features)),
            is_active: Set(input.is_active),
            display_order: Set(input.display_order),
            created_by: Set(input.created_by),
            created_at: Set(ts),
            updated_at: Set(ts),
        };
        Ok(am.insert(&self.db).await?)
    }

    async fn update_service(&self, id: i32, changes: ServiceChanges) -> Result<Option<service::Model>, StoreError> {
        let Some(found) = service::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };
        let mut am: service::ActiveModel = found.into();
        if let Some(v) = changes.title { am.title = Set(v); }
        if let Some(v) = changes.description { am.description = Set(v); }
        if let Some(v) = changes.short_description { am.short_description = Set(v); }
        if let Some(v) = changes.icon { am.icon = Set(v); }
        if let Some(v) = changes.image { am.image = Set(Some(v)); }
        if let Some(v) = changes.category { am.category = Set(v); }
        if let Some(v) = changes.price { am.price = Set(Some(v)); }
        if let Some(v) = changes.currency { am.currency = Set(v); }
        if let Some(v) = changes.duration { am.duration = Set(Some(v)); }
        if let Some(v) = changes.features { am.features = Set(Features(v)); }
        if let Some(v) = changes.is_active { am.is_active = Set(v); }
        if let Some(v) = changes.display_order { am.display_order = Set(v); }
        am.updated_at = Set(Utc::now().into());
        Ok(Some(am.update(&self.db).await?))
    }

    async fn delete_service(&self, id: i32) -> Result<Option<service::Model>, StoreError> {
        let Some(found) = service::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };
        found.clone().delete(&self.db).await?;
        Ok(Some(found))
    }

    #[instrument(skip(self, query), fields(category = ?query.category, search = ?query.search))]
    async fn list_services(&self, query: &ServiceQuery) -> Result<Page<service::Model>, StoreError> {
        let mut select = service::Entity::find().filter(service::Column::IsActive.eq(true));
        if let Some(category) = query.category {
            select = select.filter(service::Column::Category.eq(category));
        }
        if let Some(needle) = query.needle() {
            select = select.filter(
                Condition::any()
                    .add(lower_like(service::Column::Title, &needle))
                    .add(lower_like(service::Column::Description, &needle))
                    .add(lower_like(service::Column::ShortDescription, &needle)),
            );
        }
        let select = select
            .order_by_asc(service::Column::DisplayOrder)
            .order_by_desc(service::Column::CreatedAt)
            .order_by_desc(service::Column::Id);
        fetch_page(select, &self.db, query.pagination).await
    }

    async fn find_contact_by_id(&self, id: i32) -> Result<Option<contact::Model>, StoreError> {
        Ok(contact::Entity::find_by_id(id).one(&self.db).await?)
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    async fn create_contact(&self, input: NewContact) -> Result<contact::Model, StoreError> {
        let ts = Utc::now().into();
        let am = contact::ActiveModel {
            id: NotSet,
            name: Set(input.name),
            email: Set(input.email),
            phone: Set(input.phone),
            subject: Set(input.subject),
            message: Set(input.message),
            status: Set(ContactStatus::New),
            priority: Set(Priority::Medium),
            assigned_to: Set(None),
            reply: Set(None),
            ip_address: Set(input.ip_address),
            user_agent: Set(input.user_agent),
            created_at: Set(ts),
            updated_at: Set(ts),
        };
        Ok(am.insert(&self.db).await?)
    }

    async fn update_contact(&self, id: i32, changes: ContactChanges) -> Result<Option<contact::Model>, StoreError> {
        let Some(found) = contact::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };
        let mut am: contact::ActiveModel = found.into();
        if let Some(v) = changes.status { am.status = Set(v); }
        if let Some(v) = changes.priority { am.priority = Set(v); }
        if let Some(v) = changes.assigned_to { am.assigned_to = Set(Some(v)); }
        if let Some(v) = changes.reply { am.reply = Set(Some(v)); }
        am.updated_at = Set(Utc::now().into());
        Ok(Some(am.update(&self.db).await?))
    }

    async fn delete_contact(&self, id: i32) -> Result<Option<contact::Model>, StoreError> {
        let Some(found) = contact::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };
        found.clone().delete(&self.db).await?;
        Ok(Some(found))
    }

    #[instrument(skip(self, query), fields(status = ?query.status, priority = ?query.priority))]
    async fn list_contacts(&self, query: &ContactQuery) -> Result<ContactPage, StoreError> {
        let mut select = contact::Entity::find();
        if let Some(status) = query.status {
            select = select.filter(contact::Column::Status.eq(status));
        }
        if let Some(priority) = query.priority {
            select = select.filter(contact::Column::Priority.eq(priority));
        }
        let select = select
            .order_by_desc(contact::Column::CreatedAt)
            .order_by_desc(contact::Column::Id);
        let page = fetch_page(select, &self.db, query.pagination).await?;

        let rows = contact::Entity::find()
            .select_only()
            .column(contact::Column::Status)
            .column_as(Expr::col(contact::Column::Id).count(), "count")
            .group_by(contact::Column::Status)
            .order_by_asc(contact::Column::Status)
            .into_model::<StatusCountRow>()
            .all(&self.db)
            .await?;
        let status_counts = rows
            .into_iter()
            .map(|r| StatusCount { status: r.status, count: r.count.max(0) as u64 })
            .collect();

        Ok(ContactPage { page, status_counts })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, QueryTrait, Value};

    #[test]
    fn like_pattern_escapes_metacharacters() {
        assert_eq!(escape_like("web"), "%web%");
        assert_eq!(escape_like("50%_off"), r"%50\%\_off%");
        assert_eq!(escape_like(r"a\b"), r"%a\\b%");
    }

    #[test]
    fn search_lowercases_the_column() {
        let stmt = service::Entity::find()
            .filter(lower_like(service::Column::Title, "web"))
            .build(DatabaseBackend::Postgres);
        assert!(stmt.sql.contains(r#"LOWER("title")"#), "{}", stmt.sql);
        assert!(stmt.sql.contains("LIKE $1 ESCAPE"), "{}", stmt.sql);
    }

    #[test]
    fn list_query_orders_by_display_order_first() {
        let stmt = service::Entity::find()
            .filter(service::Column::IsActive.eq(true))
            .order_by_asc(service::Column::DisplayOrder)
            .order_by_desc(service::Column::CreatedAt)
            .build(DatabaseBackend::Postgres);
        assert!(
            stmt.sql.ends_with(r#"ORDER BY "services"."display_order" ASC, "services"."created_at" DESC"#),
            "{}",
            stmt.sql
        );
    }

    #[tokio::test]
    async fn page_past_the_end_skips_the_row_query() -> Result<(), anyhow::Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[BTreeMap::from([("num_items", Value::BigInt(Some(3)))])]])
            .into_connection();
        let backend = PostgresBackend::new(db);
        let query = ServiceQuery { pagination: Pagination::new(Some(u64::MAX / 2), Some(10)), ..Default::default() };

        let page = backend.list_services(&query).await?;
        assert!(page.items.is_empty());
        assert_eq!(page.total, 3);
        assert_eq!(page.pages, 1);
        // only the COUNT ran
        assert_eq!(backend.db.into_transaction_log().len(), 1);
        Ok(())
    }
}
