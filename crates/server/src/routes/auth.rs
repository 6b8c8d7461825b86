use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use models::Role;
use serde::Deserialize;
use serde_json::{json, Value};
use store::{Registration, StoreError, UserChanges};
use tracing::{info, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::{expired_cookie, issue_token, session_cookie, CurrentUser};
use crate::errors::{ApiError, ApiResult};
use crate::extract::{email, email_opt, trim, Normalize, ValidJson};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterBody {
    #[serde(default)]
    #[validate(length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

impl Normalize for RegisterBody {
    fn normalize(&mut self) {
        trim(&mut self.name);
        email(&mut self.email);
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginBody {
    #[serde(default)]
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl Normalize for LoginBody {
    fn normalize(&mut self) {
        email(&mut self.email);
    }
}

/// Self-service profile fields.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ProfileBody {
    #[validate(length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Please enter a valid email"))]
    pub email: Option<String>,
    #[validate(length(max = 20, message = "Phone number cannot be more than 20 characters"))]
    pub phone: Option<String>,
    #[validate(length(max = 100, message = "Location cannot be more than 100 characters"))]
    pub location: Option<String>,
    #[validate(length(max = 500, message = "Bio cannot be more than 500 characters"))]
    pub bio: Option<String>,
}

/// Trim in place; an empty string stays so a field can be cleared.
pub(crate) fn trim_keep(s: &mut Option<String>) {
    if let Some(v) = s.as_mut() {
        trim(v);
    }
}

impl Normalize for ProfileBody {
    fn normalize(&mut self) {
        trim_keep(&mut self.name);
        email_opt(&mut self.email);
        trim_keep(&mut self.phone);
        trim_keep(&mut self.location);
        trim_keep(&mut self.bio);
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordBody {
    #[serde(default)]
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "New password must be at least 6 characters"))]
    pub new_password: String,
}

impl Normalize for ChangePasswordBody {}

#[utoipa::path(post, path = "/api/auth/register", tag = "auth", request_body = RegisterBody, responses((status = 201, description = "Registered"), (status = 400, description = "Validation failed or email taken")))]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidJson(body): ValidJson<RegisterBody>,
) -> ApiResult<(StatusCode, CookieJar, Json<Value>)> {
    let user = state
        .store
        .create_user(Registration { name: body.name, email: body.email, password: body.password, role: Role::User })
        .await?;
    let token = issue_token(&state.auth, &user)?;
    let jar = jar.add(session_cookie(token.clone()));
    Ok((
        StatusCode::CREATED,
        jar,
        Json(json!({ "success": true, "message": "User registered successfully", "token": token, "user": user })),
    ))
}

#[utoipa::path(post, path = "/api/auth/login", tag = "auth", request_body = LoginBody, responses((status = 200, description = "Logged in; sets the auth_token cookie"), (status = 401, description = "Invalid credentials or deactivated account")))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidJson(body): ValidJson<LoginBody>,
) -> ApiResult<(CookieJar, Json<Value>)> {
    let Some(user) = state.store.authenticate(&body.email, &body.password).await? else {
        warn!(email = %body.email, "login failed");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    };
    if !user.is_active {
        warn!(user_id = user.id, "login on deactivated account");
        return Err(ApiError::Unauthorized("Account is deactivated".into()));
    }
    let token = issue_token(&state.auth, &user)?;
    info!(user_id = user.id, "user_logged_in");
    let jar = jar.add(session_cookie(token.clone()));
    Ok((jar, Json(json!({ "success": true, "message": "Login successful", "token": token, "user": user }))))
}

#[utoipa::path(post, path = "/api/auth/logout", tag = "auth", responses((status = 200, description = "Cookie cleared")))]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<Value>) {
    (jar.remove(expired_cookie()), Json(json!({ "success": true, "message": "Logged out successfully" })))
}

#[utoipa::path(get, path = "/api/auth/me", tag = "auth", responses((status = 200, description = "Current user"), (status = 401, description = "Unauthorized")))]
pub async fn me(CurrentUser(user): CurrentUser) -> Json<Value> {
    Json(json!({ "success": true, "user": user }))
}

#[utoipa::path(put, path = "/api/auth/profile", tag = "auth", request_body = ProfileBody, responses((status = 200, description = "Profile updated"), (status = 400, description = "Validation failed"), (status = 401, description = "Unauthorized")))]
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ValidJson(body): ValidJson<ProfileBody>,
) -> ApiResult<Json<Value>> {
    let changes = UserChanges {
        name: body.name,
        email: body.email,
        phone: body.phone,
        location: body.location,
        bio: body.bio,
        ..Default::default()
    };
    let user = state
        .store
        .update_user(caller.id, changes)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(json!({ "success": true, "message": "Profile updated successfully", "user": user })))
}

#[utoipa::path(put, path = "/api/auth/change-password", tag = "auth", request_body = ChangePasswordBody, responses((status = 200, description = "Password changed"), (status = 400, description = "Wrong current password or validation failed")))]
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ValidJson(body): ValidJson<ChangePasswordBody>,
) -> ApiResult<Json<Value>> {
    match state.store.change_password(caller.id, &body.current_password, &body.new_password).await {
        Ok(_) => {
            info!(user_id = caller.id, "password_changed");
            Ok(Json(json!({ "success": true, "message": "Password changed successfully" })))
        }
        Err(StoreError::Unauthorized) => Err(ApiError::field("currentPassword", "Current password is incorrect")),
        Err(e) => Err(e.into()),
    }
}
