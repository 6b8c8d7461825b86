//! Process-local backend used when no database is reachable.
//!
//! Three ordered collections and one id counter shared by all of them, behind
//! a single `RwLock`. Nothing survives a restart.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use models::contact;
use models::service::{self, Features};
use models::user;
use models::{ContactStatus, Priority};
use sea_orm::prelude::DateTimeWithTimeZone;
use tokio::sync::RwLock;
use tracing::debug;

use crate::backend::{Backend, BackendKind};
use crate::errors::StoreError;
use crate::pagination::Page;
use crate::types::{
    ContactChanges, ContactPage, ContactQuery, NewContact, NewService, NewUser, ServiceChanges, ServiceQuery,
    StatusCount, UserChanges, UserQuery,
};

struct Collections {
    users: Vec<user::Model>,
    services: Vec<service::Model>,
    contacts: Vec<contact::Model>,
    next_id: i32,
}

impl Collections {
    fn allocate_id(&mut self) -> i32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

pub struct MemoryBackend {
    inner: RwLock<Collections>,
}

impl Default for MemoryBackend {
    fn default() -> Self { Self::new() }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Collections { users: Vec::new(), services: Vec::new(), contacts: Vec::new(), next_id: 1 }),
        }
    }
}

fn now() -> DateTimeWithTimeZone {
    Utc::now().into()
}

fn remove_by<T>(items: &mut Vec<T>, pred: impl Fn(&T) -> bool) -> Option<T> {
    items.iter().position(pred).map(|idx| items.remove(idx))
}

#[async_trait]
impl Backend for MemoryBackend {
    fn kind(&self) -> BackendKind { BackendKind::Memory }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<user::Model>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: i32) -> Result<Option<user::Model>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, input: NewUser) -> Result<user::Model, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.users.iter().any(|u| u.email == input.email) {
            return Err(StoreError::Conflict(format!("email {} already registered", input.email)));
        }
        let ts = now();
        let user = user::Model {
            id: inner.allocate_id(),
            name: input.name,
            email: input.email,
            password_hash: input.password_hash,
            role: input.role,
            is_active: input.is_active,
            phone: None,
            location: None,
            bio: None,
            created_at: ts,
            updated_at: ts,
        };
        inner.users.push(user.clone());
        debug!(user_id = user.id, "memory: user created");
        Ok(user)
    }

    async fn update_user(&self, id: i32, changes: UserChanges) -> Result<Option<user::Model>, StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(email) = &changes.email {
            if inner.users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(StoreError::Conflict(format!("email {email} already registered")));
            }
        }
        let Some(user) = inner.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(v) = changes.name { user.name = v; }
        if let Some(v) = changes.email { user.email = v; }
        if let Some(v) = changes.password_hash { user.password_hash = v; }
        if let Some(v) = changes.role { user.role = v; }
        if let Some(v) = changes.is_active { user.is_active = v; }
        if let Some(v) = changes.phone { user.phone = Some(v); }
        if let Some(v) = changes.location { user.location = Some(v); }
        if let Some(v) = changes.bio { user.bio = Some(v); }
        user.updated_at = now();
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: i32) -> Result<Option<user::Model>, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(remove_by(&mut inner.users, |u| u.id == id))
    }

    async fn list_users(&self, query: &UserQuery) -> Result<Page<user::Model>, StoreError> {
        let inner = self.inner.read().await;
        let mut all = inner.users.clone();
        all.sort_by_key(|u| (Reverse(u.created_at), Reverse(u.id)));
        Ok(Page::slice(all, query.pagination))
    }

    async fn find_service_by_id(&self, id: i32) -> Result<Option<service::Model>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.services.iter().find(|s| s.id == id).cloned())
    }

    async fn create_service(&self, input: NewService) -> Result<service::Model, StoreError> {
        let mut inner = self.inner.write().await;
        let ts = now();
        let svc = service::Model {
            id: inner.allocate_id(),
            title: input.title,
            description: input.description,
            short_description: input.short_description,
            icon: input.icon,
            image: input.image,
            category: input.category,
            price: input.price,
            currency: input.currency,
            duration: input.duration,
            features: Features(input.features),
            is_active: input.is_active,
            display_order: input.display_order,
            created_by: input.created_by,
            created_at: ts,
            updated_at: ts,
        };
        inner.services.push(svc.clone());
        Ok(svc)
    }

    async fn update_service(&self, id: i32, changes: ServiceChanges) -> Result<Option<service::Model>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(svc) = inner.services.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        if let Some(v) = changes.title { svc.title = v; }
        if let Some(v) = changes.description { svc.description = v; }
        if let Some(v) = changes.short_description { svc.short_description = v; }
        if let Some(v) = changes.icon { svc.icon = v; }
        if let Some(v) = changes.image { svc.image = Some(v); }
        if let Some(v) = changes.category { svc.category = v; }
        if let Some(v) = changes.price { svc.price = Some(v); }
        if let Some(v) = changes.currency { svc.currency = v; }
        if let Some(v) = changes.duration { svc.duration = Some(v); }
        if let Some(v) = changes.features { svc.features = Features(v); }
        if let Some(v) = changes.is_active { svc.is_active = v; }
        if let Some(v) = changes.display_order { svc.display_order = v; }
        svc.updated_at = now();
        Ok(Some(svc.clone()))
    }

    async fn delete_service(&self, id: i32) -> Result<Option<service::Model>, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(remove_by(&mut inner.services, |s| s.id == id))
    }

    async fn list_services(&self, query: &ServiceQuery) -> Result<Page<service::Model>, StoreError> {
        let needle = query.needle();
        let inner = self.inner.read().await;
        let mut all: Vec<service::Model> = inner
            .services
            .iter()
            .filter(|s| s.is_active)
            .filter(|s| query.category.map_or(true, |c| s.category == c))
            .filter(|s| needle.as_deref().map_or(true, |n| s.matches_search(n)))
            .cloned()
            .collect();
        all.sort_by_key(|s| (s.display_order, Reverse(s.created_at), Reverse(s.id)));
        Ok(Page::slice(all, query.pagination))
    }

    async fn find_contact_by_id(&self, id: i32) -> Result<Option<contact::Model>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.contacts.iter().find(|c| c.id == id).cloned())
    }

    async fn create_contact(&self, input: NewContact) -> Result<contact::Model, StoreError> {
        let mut inner = self.inner.write().await;
        let ts = now();
        let c = contact::Model {
            id: inner.allocate_id(),
            name: input.name,
            email: input.email,
            phone: input.phone,
            subject: input.subject,
            message: input.message,
            status: ContactStatus::New,
            priority: Priority::Medium,
            assigned_to: None,
            reply: None,
            ip_address: input.ip_address,
            user_agent: input.user_agent,
            created_at: ts,
            updated_at: ts,
        };
        inner.contacts.push(c.clone());
        Ok(c)
    }

    async fn update_contact(&self, id: i32, changes: ContactChanges) -> Result<Option<contact::Model>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(c) = inner.contacts.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        if let Some(v) = changes.status { c.status = v; }
        if let Some(v) = changes.priority { c.priority = v; }
        if let Some(v) = changes.assigned_to { c.assigned_to = Some(v); }
        if let Some(v) = changes.reply { c.reply = Some(v); }
        c.updated_at = now();
        Ok(Some(c.clone()))
    }

    async fn delete_contact(&self, id: i32) -> Result<Option<contact::Model>, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(remove_by(&mut inner.contacts, |c| c.id == id))
    }

    async fn list_contacts(&self, query: &ContactQuery) -> Result<ContactPage, StoreError> {
        let inner = self.inner.read().await;
        let mut all: Vec<contact::Model> = inner
            .contacts
            .iter()
            .filter(|c| query.status.map_or(true, |s| c.status == s))
            .filter(|c| query.priority.map_or(true, |p| c.priority == p))
            .cloned()
            .collect();
        all.sort_by_key(|c| (Reverse(c.created_at), Reverse(c.id)));

        // keyed by the stored text so ordering matches `ORDER BY status`
        let mut counts: BTreeMap<String, StatusCount> = BTreeMap::new();
        for c in &inner.contacts {
            counts
                .entry(c.status.to_string())
                .or_insert(StatusCount { status: c.status, count: 0 })
                .count += 1;
        }

        Ok(ContactPage { page: Page::slice(all, query.pagination), status_counts: counts.into_values().collect() })
    }
}
