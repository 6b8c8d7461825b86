use utoipa::OpenApi;
use utoipa::ToSchema;

use crate::routes::{auth, contact, services, users};

#[derive(ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// `postgres` or `memory`
    pub backend: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::services::list,
        crate::routes::services::categories,
        crate::routes::services::get,
        crate::routes::services::create,
        crate::routes::services::update,
        crate::routes::services::delete,
        crate::routes::contact::submit,
        crate::routes::contact::list,
        crate::routes::contact::get,
        crate::routes::contact::update_status,
        crate::routes::contact::reply,
        crate::routes::contact::delete,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::auth::update_profile,
        crate::routes::auth::change_password,
        crate::routes::users::list,
        crate::routes::users::dashboard,
        crate::routes::users::get,
        crate::routes::users::update,
        crate::routes::users::delete,
    ),
    components(
        schemas(
            HealthResponse,
            services::CreateServiceBody,
            services::UpdateServiceBody,
            contact::ContactBody,
            contact::StatusBody,
            contact::ReplyBody,
            auth::RegisterBody,
            auth::LoginBody,
            auth::ProfileBody,
            auth::ChangePasswordBody,
            users::AdminUserBody,
        )
    ),
    tags(
        (name = "health"),
        (name = "services"),
        (name = "contact"),
        (name = "auth"),
        (name = "users")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_resource() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for expected in ["/api/health", "/api/services", "/api/contact/{id}/reply", "/api/auth/login", "/api/users/dashboard"] {
            assert!(paths.iter().any(|p| p.as_str() == expected), "missing {expected}");
        }
    }
}
