use std::fmt;

use async_trait::async_trait;
use models::{contact, service, user};

use crate::errors::StoreError;
use crate::pagination::Page;
use crate::types::{
    ContactChanges, ContactPage, ContactQuery, NewContact, NewService, NewUser, ServiceChanges, ServiceQuery,
    UserChanges, UserQuery,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    Postgres,
    Memory,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Postgres => "postgres",
            BackendKind::Memory => "memory",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persistence abstraction shared by the database and in-memory stores.
///
/// Both implementations must agree on filtering, ordering and pagination so the
/// API behaves the same whichever one is active. Update and delete return
/// `Ok(None)` for an unknown id.
#[async_trait]
pub trait Backend: Send + Sync {
    fn kind(&self) -> BackendKind;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<user::Model>, StoreError>;
    async fn find_user_by_id(&self, id: i32) -> Result<Option<user::Model>, StoreError>;
    async fn create_user(&self, input: NewUser) -> Result<user::Model, StoreError>;
    async fn update_user(&self, id: i32, changes: UserChanges) -> Result<Option<user::Model>, StoreError>;
    async fn delete_user(&self, id: i32) -> Result<Option<user::Model>, StoreError>;
    /// Newest first.
    async fn list_users(&self, query: &UserQuery) -> Result<Page<user::Model>, StoreError>;

    async fn find_service_by_id(&self, id: i32) -> Result<Option<service::Model>, StoreError>;
    async fn create_service(&self, input: NewService) -> Result<service::Model, StoreError>;
    async fn update_service(&self, id: i32, changes: ServiceChanges) -> Result<Option<service::Model>, StoreError>;
    async fn delete_service(&self, id: i32) -> Result<Option<service::Model>, StoreError>;
    /// Active services only, by display order then newest first.
    async fn list_services(&self, query: &ServiceQuery) -> Result<Page<service::Model>, StoreError>;

    async fn find_contact_by_id(&self, id: i32) -> Result<Option<contact::Model>, StoreError>;
    async fn create_contact(&self, input: NewContact) -> Result<contact::Model, StoreError>;
    async fn update_contact(&self, id: i32, changes: ContactChanges) -> Result<Option<contact::Model>, StoreError>;
    async fn delete_contact(&self, id: i32) -> Result<Option<contact::Model>, StoreError>;
    /// Newest first; status counts cover every contact regardless of filters.
    async fn list_contacts(&self, query: &ContactQuery) -> Result<ContactPage, StoreError>;
}
