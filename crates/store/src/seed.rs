//! Sample records for the in-memory store.

use models::{Category, Role};
use tracing::info;

use crate::errors::StoreError;
use crate::store::Store;
use crate::types::{NewService, Registration};

pub const ADMIN_EMAIL: &str = "admin@geed.com";
pub const ADMIN_PASSWORD: &str = "admin123";
pub const USER_EMAIL: &str = "john@example.com";
pub const USER_PASSWORD: &str = "password123";

fn sample_services(created_by: i32) -> Vec<NewService> {
    let mut web = NewService::new(
        "Web Development",
        "Custom web application development using modern technologies",
        "Modern, responsive websites and web applications",
        Category::Technology,
        created_by,
    );
    web.price = Some(2500.0);
    web.duration = Some("4-6 weeks".into());
    web.features = vec!["Responsive Design".into(), "Modern Framework".into(), "Database Integration".into(), "API Development".into()];
    web.icon = "code".into();
    web.display_order = 1;

    let mut mobile = NewService::new(
        "Mobile App Development",
        "Native and cross-platform mobile application development",
        "iOS and Android apps from a single team",
        Category::Technology,
        created_by,
    );
    mobile.price = Some(3500.0);
    mobile.duration = Some("6-8 weeks".into());
    mobile.features = vec!["iOS & Android".into(), "Cross-platform".into(), "API Integration".into(), "App Store Deployment".into()];
    mobile.icon = "smartphone".into();
    mobile.display_order = 2;

    let mut marketing = NewService::new(
        "Digital Marketing",
        "Comprehensive digital marketing strategy and implementation",
        "SEO, social media and content that converts",
        Category::Marketing,
        created_by,
    );
    marketing.price = Some(1500.0);
    marketing.duration = Some("3-4 weeks".into());
    marketing.features = vec!["SEO Optimization".into(), "Social Media".into(), "Content Strategy".into(), "Analytics".into()];
    marketing.icon = "trending-up".into();
    marketing.display_order = 3;

    vec![web, mobile, marketing]
}

/// Two accounts (one admin) and three catalog services.
pub async fn seed_sample_data(store: &Store) -> Result<(), StoreError> {
    let admin = store
        .create_user(Registration {
            name: "Admin User".into(),
            email: ADMIN_EMAIL.into(),
            password: ADMIN_PASSWORD.into(),
            role: Role::Admin,
        })
        .await?;
    store
        .create_user(Registration {
            name: "John Doe".into(),
            email: USER_EMAIL.into(),
            password: USER_PASSWORD.into(),
            role: Role::User,
        })
        .await?;
    for svc in sample_services(admin.id) {
        store.create_service(svc).await?;
    }
    info!(backend = %store.kind(), event = "seeded", "sample data initialized");
    Ok(())
}
