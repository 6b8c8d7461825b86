use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use configs::{AppConfig, DatabaseConfig, StoreBackend};
use migration::MigratorTrait;
use models::contact::{self, Reply};
use models::{service, user, ContactStatus, Priority, Role};
use sea_orm::DatabaseConnection;
use tracing::{info, instrument, warn};

use crate::backend::{Backend, BackendKind};
use crate::errors::StoreError;
use crate::memory::MemoryBackend;
use crate::pagination::{Page, Pagination};
use crate::password;
use crate::postgres::PostgresBackend;
use crate::seed;
use crate::types::{
    ContactChanges, ContactPage, ContactQuery, DashboardStats, NewContact, NewService, NewUser, Registration,
    ServiceChanges, ServiceQuery, UserChanges, UserQuery, UserRef,
};

/// Data-access handle injected into request handlers.
///
/// The backend is chosen once, when the handle is built; clones share it.
/// Policy that must not differ between backends (email normalization,
/// uniqueness, password hashing, contact status transitions) lives here.
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn Backend>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Store {
    pub fn with_backend(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Empty in-memory store.
    pub fn memory() -> Self {
        Self::with_backend(Arc::new(MemoryBackend::new()))
    }

    /// In-memory store pre-filled with the sample accounts and services.
    pub async fn seeded_memory() -> Result<Self, StoreError> {
        let store = Self::memory();
        seed::seed_sample_data(&store).await?;
        Ok(store)
    }

    /// Postgres store over an existing connection; runs pending migrations.
    pub async fn postgres(db: DatabaseConnection) -> Result<Self, StoreError> {
        migration::Migrator::up(&db, None).await?;
        Ok(Self::with_backend(Arc::new(PostgresBackend::new(db))))
    }

    /// Select the backend from configuration.
    ///
    /// `auto` probes the database exactly once and falls back to the seeded
    /// in-memory store when no URL is configured or the server is unreachable.
    pub async fn initialize(cfg: &AppConfig) -> Result<Self, StoreError> {
        match cfg.store.backend {
            StoreBackend::Memory => {
                info!(event = "store_selected", backend = "memory", "using in-memory database");
                Self::fallback_memory(cfg.store.seed_sample_data).await
            }
            StoreBackend::Postgres => {
                let db = Self::connect(&cfg.database).await?;
                info!(event = "store_selected", backend = "postgres", "using postgres database");
                Self::postgres(db).await
            }
            StoreBackend::Auto => {
                if !cfg.database.is_configured() {
                    warn!(event = "store_fallback", reason = "database.url not set", "database not configured, using in-memory database");
                    return Self::fallback_memory(cfg.store.seed_sample_data).await;
                }
                match Self::connect(&cfg.database).await {
                    Ok(db) => {
                        info!(event = "store_selected", backend = "postgres", "using postgres database");
                        Self::postgres(db).await
                    }
                    Err(e) => {
                        warn!(event = "store_fallback", error = %e, "database not available, using in-memory database");
                        Self::fallback_memory(cfg.store.seed_sample_data).await
                    }
                }
            }
        }
    }

    async fn connect(cfg: &DatabaseConfig) -> Result<DatabaseConnection, StoreError> {
        models::db::connect_with(cfg).await.map_err(StoreError::from)
    }

    async fn fallback_memory(seed_data: bool) -> Result<Self, StoreError> {
        if seed_data { Self::seeded_memory().await } else { Ok(Self::memory()) }
    }

    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    // ---- users ----

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<user::Model>, StoreError> {
        self.backend.find_user_by_email(&normalize_email(email)).await
    }

    pub async fn find_user_by_id(&self, id: i32) -> Result<Option<user::Model>, StoreError> {
        self.backend.find_user_by_id(id).await
    }

    /// Resolve account ids to `{id, name, email}`; ids with no account are left out.
    pub async fn user_refs(&self, ids: impl IntoIterator<Item = i32>) -> Result<HashMap<i32, UserRef>, StoreError> {
        let mut refs = HashMap::new();
        for id in ids {
            if refs.contains_key(&id) {
                continue;
            }
            if let Some(u) = self.backend.find_user_by_id(id).await? {
                refs.insert(id, UserRef::from(&u));
            }
        }
        Ok(refs)
    }

    /// Register an account; the email is lowercased and must be unused.
    ///
    /// # Examples
    /// ```
    /// use store::{Store, Registration};
    /// use models::Role;
    /// let store = Store::memory();
    /// let input = Registration { name: "Jo Lee".into(), email: " Jo@X.com ".into(), password: "secret1".into(), role: Role::User };
    /// let user = tokio_test::block_on(store.create_user(input)).unwrap();
    /// assert_eq!(user.email, "jo@x.com");
    /// assert_ne!(user.password_hash, "secret1");
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_user(&self, input: Registration) -> Result<user::Model, StoreError> {
        let email = normalize_email(&input.email);
        if self.backend.find_user_by_email(&email).await?.is_some() {
            return Err(StoreError::Conflict(format!("email {email} already registered")));
        }
        let password_hash = password::hash(&input.password)?;
        let user = self
            .backend
            .create_user(NewUser { name: input.name.trim().to_string(), email, password_hash, role: input.role, is_active: true })
            .await?;
        info!(user_id = user.id, role = %user.role, "user_registered");
        Ok(user)
    }

    pub async fn update_user(&self, id: i32, mut changes: UserChanges) -> Result<Option<user::Model>, StoreError> {
        if let Some(email) = changes.email.take() {
            let email = normalize_email(&email);
            if let Some(owner) = self.backend.find_user_by_email(&email).await? {
                if owner.id != id {
                    return Err(StoreError::Conflict(format!("email {email} already registered")));
                }
            }
            changes.email = Some(email);
        }
        self.backend.update_user(id, changes).await
    }

    pub async fn delete_user(&self, id: i32) -> Result<Option<user::Model>, StoreError> {
        self.backend.delete_user(id).await
    }

    pub async fn list_users(&self, query: &UserQuery) -> Result<Page<user::Model>, StoreError> {
        self.backend.list_users(query).await
    }

    /// Look up by email and compare the password. `None` covers both an
    /// unknown email and a wrong password.
    pub async fn authenticate(&self, email: &str, candidate: &str) -> Result<Option<user::Model>, StoreError> {
        let Some(user) = self.find_user_by_email(email).await? else {
            return Ok(None);
        };
        Ok(password::verify(&user.password_hash, candidate).then_some(user))
    }

    /// Replace the password after checking the current one.
    pub async fn change_password(&self, id: i32, current: &str, new: &str) -> Result<user::Model, StoreError> {
        let user = self.find_user_by_id(id).await?.ok_or_else(|| StoreError::not_found("user"))?;
        if !password::verify(&user.password_hash, current) {
            return Err(StoreError::Unauthorized);
        }
        let changes = UserChanges { password_hash: Some(password::hash(new)?), ..Default::default() };
        self.backend
            .update_user(id, changes)
            .await?
            .ok_or_else(|| StoreError::not_found("user"))
    }

    /// Create the configured administrator unless the email is already taken.
    pub async fn ensure_admin(&self, name: &str, email: &str, password: &str) -> Result<user::Model, StoreError> {
        if let Some(existing) = self.find_user_by_email(email).await? {
            if existing.role != Role::Admin {
                warn!(user_id = existing.id, "bootstrap admin email belongs to a non-admin account");
            }
            return Ok(existing);
        }
        self.create_user(Registration { name: name.into(), email: email.into(), password: password.into(), role: Role::Admin })
            .await
    }

    // ---- services ----

    pub async fn find_service_by_id(&self, id: i32) -> Result<Option<service::Model>, StoreError> {
        self.backend.find_service_by_id(id).await
    }

    /// Public lookup: inactive services are treated as missing.
    pub async fn find_active_service(&self, id: i32) -> Result<Option<service::Model>, StoreError> {
        Ok(self.backend.find_service_by_id(id).await?.filter(|s| s.is_active))
    }

    pub async fn create_service(&self, input: NewService) -> Result<service::Model, StoreError> {
        if input.price.is_some_and(|p| p < 0.0 || !p.is_finite()) {
            return Err(StoreError::Validation("price must be a non-negative number".into()));
        }
        self.backend.create_service(input).await
    }

    pub async fn update_service(&self, id: i32, changes: ServiceChanges) -> Result<Option<service::Model>, StoreError> {
        if changes.price.is_some_and(|p| p < 0.0 || !p.is_finite()) {
            return Err(StoreError::Validation("price must be a non-negative number".into()));
        }
        self.backend.update_service(id, changes).await
    }

    pub async fn delete_service(&self, id: i32) -> Result<Option<service::Model>, StoreError> {
        self.backend.delete_service(id).await
    }

    pub async fn list_services(&self, query: &ServiceQuery) -> Result<Page<service::Model>, StoreError> {
        self.backend.list_services(query).await
    }

    // ---- contacts ----

    pub async fn find_contact_by_id(&self, id: i32) -> Result<Option<contact::Model>, StoreError> {
        self.backend.find_contact_by_id(id).await
    }

    /// Admin view of one message; a `new` message becomes `read`.
    pub async fn open_contact(&self, id: i32) -> Result<Option<contact::Model>, StoreError> {
        match self.backend.find_contact_by_id(id).await? {
            Some(c) if c.status == ContactStatus::New => {
                let changes = ContactChanges { status: Some(ContactStatus::Read), ..Default::default() };
                self.backend.update_contact(id, changes).await
            }
            other => Ok(other),
        }
    }

    pub async fn create_contact(&self, mut input: NewContact) -> Result<contact::Model, StoreError> {
        input.email = normalize_email(&input.email);
        let c = self.backend.create_contact(input).await?;
        info!(contact_id = c.id, "contact_received");
        Ok(c)
    }

    pub async fn update_contact(&self, id: i32, changes: ContactChanges) -> Result<Option<contact::Model>, StoreError> {
        self.backend.update_contact(id, changes).await
    }

    /// Explicit triage by an administrator.
    pub async fn set_contact_status(
        &self,
        id: i32,
        status: ContactStatus,
        priority: Option<Priority>,
        assigned_to: Option<i32>,
    ) -> Result<Option<contact::Model>, StoreError> {
        let changes = ContactChanges { status: Some(status), priority, assigned_to, reply: None };
        self.backend.update_contact(id, changes).await
    }

    /// Record a reply; the message moves to `replied` in the same update.
    pub async fn reply_to_contact(&self, id: i32, message: &str, replied_by: i32) -> Result<Option<contact::Model>, StoreError> {
        let reply = Reply { message: message.to_string(), replied_by, replied_at: Utc::now().into() };
        let changes = ContactChanges { status: Some(ContactStatus::Replied), reply: Some(reply), ..Default::default() };
        self.backend.update_contact(id, changes).await
    }

    pub async fn delete_contact(&self, id: i32) -> Result<Option<contact::Model>, StoreError> {
        self.backend.delete_contact(id).await
    }

    pub async fn list_contacts(&self, query: &ContactQuery) -> Result<ContactPage, StoreError> {
        self.backend.list_contacts(query).await
    }

    /// Totals shown on the dashboard.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, StoreError> {
        let one = Pagination::new(Some(1), Some(1));
        let services = self.backend.list_services(&ServiceQuery { pagination: one, ..Default::default() }).await?;
        let users = self.backend.list_users(&UserQuery { pagination: one }).await?;
        let contacts = self.backend.list_contacts(&ContactQuery { pagination: one, ..Default::default() }).await?;
        let new_contacts = contacts
            .status_counts
            .iter()
            .find(|c| c.status == ContactStatus::New)
            .map(|c| c.count)
            .unwrap_or(0);
        Ok(DashboardStats {
            total_services: services.total,
            total_users: users.total,
            total_contacts: contacts.page.total,
            new_contacts,
        })
    }
}
