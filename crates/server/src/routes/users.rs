use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use store::{Pagination, UserChanges, UserQuery};
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::CurrentUser;
use crate::errors::{ApiError, ApiResult};
use crate::extract::{email_opt, is_role, lenient_u64, parse_checked, parse_id, trim_opt, Normalize, ValidJson};
use crate::routes::auth::trim_keep;
use crate::state::AppState;

const NOT_FOUND: &str = "User not found";

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Administrative edit of any account.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserBody {
    #[validate(length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Please enter a valid email"))]
    pub email: Option<String>,
    #[validate(custom(function = "is_role", message = "Invalid role"))]
    pub role: Option<String>,
    pub is_active: Option<bool>,
    #[validate(length(max = 20, message = "Phone number cannot be more than 20 characters"))]
    pub phone: Option<String>,
    #[validate(length(max = 100, message = "Location cannot be more than 100 characters"))]
    pub location: Option<String>,
    #[validate(length(max = 500, message = "Bio cannot be more than 500 characters"))]
    pub bio: Option<String>,
}

impl Normalize for AdminUserBody {
    fn normalize(&mut self) {
        trim_keep(&mut self.name);
        email_opt(&mut self.email);
        trim_opt(&mut self.role);
        trim_keep(&mut self.phone);
        trim_keep(&mut self.location);
        trim_keep(&mut self.bio);
    }
}

#[utoipa::path(get, path = "/api/users", tag = "users", responses((status = 200, description = "Accounts, newest first"), (status = 403, description = "Forbidden")))]
pub async fn list(State(state): State<AppState>, Query(params): Query<ListParams>) -> ApiResult<Json<Value>> {
    let pagination = Pagination::new(lenient_u64(params.page.as_deref()), lenient_u64(params.limit.as_deref()));
    let page = state.store.list_users(&UserQuery { pagination }).await?;
    Ok(Json(json!({
        "success": true,
        "count": page.items.len(),
        "total": page.total,
        "page": page.page,
        "pages": page.pages,
        "users": page.items,
    })))
}

#[utoipa::path(get, path = "/api/users/dashboard", tag = "users", responses((status = 200, description = "Dashboard totals"), (status = 401, description = "Unauthorized")))]
pub async fn dashboard(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let stats = state.store.dashboard_stats().await?;
    Ok(Json(json!({ "success": true, "stats": stats })))
}

#[utoipa::path(get, path = "/api/users/{id}", tag = "users", params(("id" = i32, Path, description = "User id")), responses((status = 200, description = "Account"), (status = 404, description = "Not found")))]
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let id = parse_id(&id, NOT_FOUND)?;
    let user = state
        .store
        .find_user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.into()))?;
    Ok(Json(json!({ "success": true, "user": user })))
}

#[utoipa::path(put, path = "/api/users/{id}", tag = "users", params(("id" = i32, Path, description = "User id")), request_body = AdminUserBody, responses((status = 200, description = "Updated"), (status = 400, description = "Validation failed"), (status = 404, description = "Not found")))]
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<AdminUserBody>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&id, NOT_FOUND)?;
    let role = body.role.as_deref().map(parse_checked::<models::Role>).transpose()?;
    // 管理员不能撤销自己的权限
    if id == caller.id && (role.is_some_and(|r| r != models::Role::Admin) || body.is_active == Some(false)) {
        return Err(ApiError::BadRequest("You cannot remove your own admin access".into()));
    }
    let changes = UserChanges {
        name: body.name,
        email: body.email,
        role,
        is_active: body.is_active,
        phone: body.phone,
        location: body.location,
        bio: body.bio,
        ..Default::default()
    };
    let user = state
        .store
        .update_user(id, changes)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.into()))?;
    info!(user_id = id, updated_by = caller.id, "user_updated");
    Ok(Json(json!({ "success": true, "message": "User updated successfully", "user": user })))
}

#[utoipa::path(delete, path = "/api/users/{id}", tag = "users", params(("id" = i32, Path, description = "User id")), responses((status = 200, description = "Deleted"), (status = 400, description = "Cannot delete yourself"), (status = 404, description = "Not found")))]
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&id, NOT_FOUND)?;
    if id == caller.id {
        return Err(ApiError::BadRequest("You cannot delete your own account".into()));
    }
    state
        .store
        .delete_user(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.into()))?;
    info!(user_id = id, deleted_by = caller.id, "user_deleted");
    Ok(Json(json!({ "success": true, "message": "User deleted successfully" })))
}
