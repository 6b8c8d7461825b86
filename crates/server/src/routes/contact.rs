use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::header::USER_AGENT;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use models::contact::ContactSummary;
use models::{ContactStatus, Priority};
use serde::Deserialize;
use serde_json::{json, Value};
use store::{ContactQuery, NewContact, Pagination};
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::CurrentUser;
use crate::errors::{ApiError, ApiResult};
use crate::extract::{
    email, filter_value, is_priority, is_status, lenient_u64, parse_checked, parse_id, trim, trim_opt, Normalize,
    ValidJson,
};
use crate::populate;
use crate::state::AppState;

const NOT_FOUND: &str = "Contact message not found";

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ContactBody {
    #[serde(default)]
    #[validate(length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
    #[validate(length(max = 20, message = "Phone number cannot be more than 20 characters"))]
    pub phone: Option<String>,
    #[serde(default)]
    #[validate(length(min = 5, max = 100, message = "Subject must be between 5 and 100 characters"))]
    pub subject: String,
    #[serde(default)]
    #[validate(length(min = 10, max = 1000, message = "Message must be between 10 and 1000 characters"))]
    pub message: String,
}

impl Normalize for ContactBody {
    fn normalize(&mut self) {
        trim(&mut self.name);
        email(&mut self.email);
        trim_opt(&mut self.phone);
        trim(&mut self.subject);
        trim(&mut self.message);
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusBody {
    #[serde(default)]
    #[validate(custom(function = "is_status", message = "Invalid status"))]
    pub status: String,
    #[validate(custom(function = "is_priority", message = "Invalid priority"))]
    pub priority: Option<String>,
    #[validate(range(min = 1, message = "Invalid user ID"))]
    pub assigned_to: Option<i32>,
}

impl Normalize for StatusBody {
    fn normalize(&mut self) {
        trim(&mut self.status);
        trim_opt(&mut self.priority);
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReplyBody {
    #[serde(default)]
    #[validate(length(min = 10, max = 1000, message = "Reply message must be between 10 and 1000 characters"))]
    pub message: String,
}

impl Normalize for ReplyBody {
    fn normalize(&mut self) {
        trim(&mut self.message);
    }
}

/// Proxy header first, then the socket peer when the server exposes it.
fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| peer.map(|p| p.ip().to_string()))
}

#[utoipa::path(post, path = "/api/contact", tag = "contact", request_body = ContactBody, responses((status = 201, description = "Message received"), (status = 400, description = "Validation failed")))]
pub async fn submit(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    ValidJson(body): ValidJson<ContactBody>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let input = NewContact {
        name: body.name,
        email: body.email,
        phone: body.phone,
        subject: body.subject,
        message: body.message,
        ip_address: client_ip(&headers, peer.map(|ConnectInfo(addr)| addr)),
        user_agent: headers.get(USER_AGENT).and_then(|v| v.to_str().ok()).map(str::to_string),
    };
    let contact = state.store.create_contact(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Your message has been sent successfully. We will get back to you soon!",
            "contact": ContactSummary::from(&contact),
        })),
    ))
}

#[utoipa::path(get, path = "/api/contact", tag = "contact", responses((status = 200, description = "Inbox page with status counts"), (status = 403, description = "Forbidden")))]
pub async fn list(State(state): State<AppState>, Query(params): Query<ListParams>) -> ApiResult<Json<Value>> {
    let pagination = Pagination::new(lenient_u64(params.page.as_deref()), lenient_u64(params.limit.as_deref()));
    let status = filter_value::<ContactStatus>(params.status.as_deref(), "status")?;
    let priority = filter_value::<Priority>(params.priority.as_deref(), "priority")?;
    let result = state.store.list_contacts(&ContactQuery { pagination, status, priority }).await?;
    let page = result.page;
    let contacts = populate::contacts(&state.store, &page.items).await?;
    Ok(Json(json!({
        "success": true,
        "count": page.items.len(),
        "total": page.total,
        "page": page.page,
        "pages": page.pages,
        "statusCounts": result.status_counts,
        "contacts": contacts,
    })))
}

#[utoipa::path(get, path = "/api/contact/{id}", tag = "contact", params(("id" = i32, Path, description = "Contact id")), responses((status = 200, description = "Message; new becomes read"), (status = 404, description = "Not found")))]
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let id = parse_id(&id, NOT_FOUND)?;
    let contact = state
        .store
        .open_contact(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.into()))?;
    let contact = populate::contact(&state.store, &contact).await?;
    Ok(Json(json!({ "success": true, "contact": contact })))
}

#[utoipa::path(put, path = "/api/contact/{id}/status", tag = "contact", params(("id" = i32, Path, description = "Contact id")), request_body = StatusBody, responses((status = 200, description = "Updated"), (status = 400, description = "Validation failed"), (status = 404, description = "Not found")))]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<StatusBody>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&id, NOT_FOUND)?;
    let status = parse_checked::<ContactStatus>(&body.status)?;
    let priority = body.priority.as_deref().map(parse_checked::<Priority>).transpose()?;
    if let Some(user_id) = body.assigned_to {
        if state.store.find_user_by_id(user_id).await?.is_none() {
            return Err(ApiError::field("assignedTo", "Invalid user ID"));
        }
    }
    let contact = state
        .store
        .set_contact_status(id, status, priority, body.assigned_to)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.into()))?;
    info!(contact_id = id, status = %contact.status, "contact_status_updated");
    let contact = populate::contact(&state.store, &contact).await?;
    Ok(Json(json!({ "success": true, "message": "Contact message updated successfully", "contact": contact })))
}

#[utoipa::path(post, path = "/api/contact/{id}/reply", tag = "contact", params(("id" = i32, Path, description = "Contact id")), request_body = ReplyBody, responses((status = 200, description = "Reply recorded"), (status = 400, description = "Validation failed"), (status = 404, description = "Not found")))]
pub async fn reply(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<ReplyBody>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&id, NOT_FOUND)?;
    let contact = state
        .store
        .reply_to_contact(id, &body.message, caller.id)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.into()))?;
    info!(contact_id = id, replied_by = caller.id, "contact_replied");
    let contact = populate::contact(&state.store, &contact).await?;
    Ok(Json(json!({ "success": true, "message": "Reply sent successfully", "contact": contact })))
}

#[utoipa::path(delete, path = "/api/contact/{id}", tag = "contact", params(("id" = i32, Path, description = "Contact id")), responses((status = 200, description = "Deleted"), (status = 404, description = "Not found")))]
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let id = parse_id(&id, NOT_FOUND)?;
    state
        .store
        .delete_contact(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.into()))?;
    Ok(Json(json!({ "success": true, "message": "Contact message deleted successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn forwarded_for_takes_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9, 10.0.0.1"));
        let peer: SocketAddr = "127.0.0.1:4000".parse().unwrap();
        assert_eq!(client_ip(&headers, Some(peer)).as_deref(), Some("203.0.113.9"));
        assert_eq!(client_ip(&HeaderMap::new(), Some(peer)).as_deref(), Some("127.0.0.1"));
        assert_eq!(client_ip(&HeaderMap::new(), None), None);
    }
}
