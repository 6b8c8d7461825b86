//! Inputs and filters accepted by the store.
//!
//! Handlers validate and normalize first; these types carry already-clean values.

use models::contact::Reply;
use models::{user, Category, ContactStatus, Currency, Priority, Role};
use serde::Serialize;

use crate::pagination::{Page, Pagination};

/// Account registration with a plaintext password; the store hashes it.
#[derive(Clone, Debug)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Row handed to a backend once the password is hashed.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
}

#[derive(Clone, Debug, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewService {
    pub title: String,
    pub description: String,
    pub short_description: String,
    pub icon: String,
    pub image: Option<String>,
    pub category: Category,
    pub price: Option<f64>,
    pub currency: Currency,
    pub duration: Option<String>,
    pub features: Vec<String>,
    pub is_active: bool,
    pub display_order: i32,
    pub created_by: i32,
}

impl NewService {
    /// Required fields only; everything else takes the catalog defaults.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        short_description: impl Into<String>,
        category: Category,
        created_by: i32,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            short_description: short_description.into(),
            icon: models::service::DEFAULT_ICON.to_string(),
            image: None,
            category,
            price: None,
            currency: Currency::default(),
            duration: None,
            features: Vec::new(),
            is_active: true,
            display_order: 0,
            created_by,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ServiceChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub icon: Option<String>,
    pub image: Option<String>,
    pub category: Option<Category>,
    pub price: Option<f64>,
    pub currency: Option<Currency>,
    pub duration: Option<String>,
    pub features: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub display_order: Option<i32>,
}

/// Contact form submission; status and priority start at their defaults.
#[derive(Clone, Debug, Default)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ContactChanges {
    pub status: Option<ContactStatus>,
    pub priority: Option<Priority>,
    pub assigned_to: Option<i32>,
    pub reply: Option<Reply>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct UserQuery {
    pub pagination: Pagination,
}

#[derive(Clone, Debug, Default)]
pub struct ServiceQuery {
    pub pagination: Pagination,
    pub category: Option<Category>,
    pub search: Option<String>,
}

impl ServiceQuery {
    /// Lowercased search needle; blank terms disable the search filter.
    pub fn needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ContactQuery {
    pub pagination: Pagination,
    pub status: Option<ContactStatus>,
    pub priority: Option<Priority>,
}

/// Number of contacts in one status, over the whole inbox.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    #[serde(rename = "_id")]
    pub status: ContactStatus,
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ContactPage {
    pub page: Page<models::contact::Model>,
    pub status_counts: Vec<StatusCount>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_services: u64,
    pub total_users: u64,
    pub total_contacts: u64,
    pub new_contacts: u64,
}

/// Who an id on a record points at, for display next to it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UserRef {
    pub id: i32,
    pub name: String,
    pub email: String,
}

impl From<&user::Model> for UserRef {
    fn from(u: &user::Model) -> Self {
        Self { id: u.id, name: u.name.clone(), email: u.email.clone() }
    }
}
