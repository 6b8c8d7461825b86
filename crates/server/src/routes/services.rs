use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use models::{Category, Currency};
use serde::Deserialize;
use serde_json::{json, Value};
use store::{NewService, Pagination, ServiceChanges, ServiceQuery};
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::CurrentUser;
use crate::errors::{ApiError, ApiResult};
use crate::extract::{
    filter_value, is_category, is_currency, lenient_u64, parse_checked, parse_id, trim, trim_opt, Normalize,
    ValidJson,
};
use crate::populate;
use crate::state::AppState;

const NOT_FOUND: &str = "Service not found";

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceBody {
    #[serde(default)]
    #[validate(length(min = 2, max = 100, message = "Title must be between 2 and 100 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 10, max = 1000, message = "Description must be between 10 and 1000 characters"))]
    pub description: String,
    #[serde(default)]
    #[validate(length(min = 10, max = 200, message = "Short description must be between 10 and 200 characters"))]
    pub short_description: String,
    #[serde(default)]
    #[validate(custom(function = "is_category", message = "Invalid category"))]
    pub category: String,
    #[validate(range(min = 0.0, message = "Price must be a non-negative number"))]
    pub price: Option<f64>,
    #[validate(custom(function = "is_currency", message = "Invalid currency"))]
    pub currency: Option<String>,
    pub features: Option<Vec<String>>,
    pub icon: Option<String>,
    pub image: Option<String>,
    pub duration: Option<String>,
    pub is_active: Option<bool>,
    pub order: Option<i32>,
}

impl Normalize for CreateServiceBody {
    fn normalize(&mut self) {
        trim(&mut self.title);
        trim(&mut self.description);
        trim(&mut self.short_description);
        trim(&mut self.category);
        trim_opt(&mut self.currency);
        trim_opt(&mut self.icon);
        trim_opt(&mut self.image);
        trim_opt(&mut self.duration);
        if let Some(features) = self.features.as_mut() {
            features.iter_mut().for_each(trim);
            features.retain(|f| !f.is_empty());
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceBody {
    #[validate(length(min = 2, max = 100, message = "Title must be between 2 and 100 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 10, max = 1000, message = "Description must be between 10 and 1000 characters"))]
    pub description: Option<String>,
    #[validate(length(min = 10, max = 200, message = "Short description must be between 10 and 200 characters"))]
    pub short_description: Option<String>,
    #[validate(custom(function = "is_category", message = "Invalid category"))]
    pub category: Option<String>,
    #[validate(range(min = 0.0, message = "Price must be a non-negative number"))]
    pub price: Option<f64>,
    #[validate(custom(function = "is_currency", message = "Invalid currency"))]
    pub currency: Option<String>,
    pub features: Option<Vec<String>>,
    pub icon: Option<String>,
    pub image: Option<String>,
    pub duration: Option<String>,
    pub is_active: Option<bool>,
    pub order: Option<i32>,
}

impl Normalize for UpdateServiceBody {
    fn normalize(&mut self) {
        // 更新时字段缺省即不修改；只去掉首尾空白
        for field in [&mut self.title, &mut self.description, &mut self.short_description, &mut self.category] {
            if let Some(v) = field.as_mut() {
                trim(v);
            }
        }
        trim_opt(&mut self.currency);
        trim_opt(&mut self.icon);
        trim_opt(&mut self.image);
        trim_opt(&mut self.duration);
        if let Some(features) = self.features.as_mut() {
            features.iter_mut().for_each(trim);
            features.retain(|f| !f.is_empty());
        }
    }
}

impl UpdateServiceBody {
    fn into_changes(self) -> ApiResult<ServiceChanges> {
        Ok(ServiceChanges {
            title: self.title,
            description: self.description,
            short_description: self.short_description,
            icon: self.icon,
            image: self.image,
            category: self.category.as_deref().map(parse_checked::<Category>).transpose()?,
            price: self.price,
            currency: self.currency.as_deref().map(parse_checked::<Currency>).transpose()?,
            duration: self.duration,
            features: self.features,
            is_active: self.is_active,
            display_order: self.order,
        })
    }
}

#[utoipa::path(get, path = "/api/services", tag = "services", responses((status = 200, description = "Active services, paginated")))]
pub async fn list(State(state): State<AppState>, Query(params): Query<ListParams>) -> ApiResult<Json<Value>> {
    let pagination = Pagination::new(lenient_u64(params.page.as_deref()), lenient_u64(params.limit.as_deref()));
    let category = filter_value::<Category>(params.category.as_deref(), "category")?;
    let query = ServiceQuery { pagination, category, search: params.search };
    let page = state.store.list_services(&query).await?;
    let services = populate::services(&state.store, &page.items).await?;
    Ok(Json(json!({
        "success": true,
        "count": page.items.len(),
        "total": page.total,
        "page": page.page,
        "pages": page.pages,
        "services": services,
    })))
}

#[utoipa::path(get, path = "/api/services/categories/list", tag = "services", responses((status = 200, description = "Category values and labels")))]
pub async fn categories() -> Json<Value> {
    let categories: Vec<Value> = Category::all()
        .into_iter()
        .map(|c| json!({ "value": c.to_string(), "label": c.label() }))
        .collect();
    Json(json!({ "success": true, "categories": categories }))
}

#[utoipa::path(get, path = "/api/services/{id}", tag = "services", params(("id" = i32, Path, description = "Service id")), responses((status = 200, description = "Service"), (status = 404, description = "Not found")))]
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let id = parse_id(&id, NOT_FOUND)?;
    let service = state
        .store
        .find_active_service(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.into()))?;
    let service = populate::service(&state.store, &service).await?;
    Ok(Json(json!({ "success": true, "service": service })))
}

#[utoipa::path(post, path = "/api/services", tag = "services", request_body = CreateServiceBody, responses((status = 201, description = "Created"), (status = 400, description = "Validation failed"), (status = 401, description = "Unauthorized"), (status = 403, description = "Forbidden")))]
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ValidJson(body): ValidJson<CreateServiceBody>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let category = parse_checked::<Category>(&body.category)?;
    let mut input = NewService::new(body.title, body.description, body.short_description, category, caller.id);
    input.price = body.price;
    input.image = body.image;
    input.duration = body.duration;
    if let Some(currency) = body.currency.as_deref() {
        input.currency = parse_checked::<Currency>(currency)?;
    }
    if let Some(icon) = body.icon {
        input.icon = icon;
    }
    if let Some(features) = body.features {
        input.features = features;
    }
    if let Some(active) = body.is_active {
        input.is_active = active;
    }
    if let Some(order) = body.order {
        input.display_order = order;
    }
    let service = state.store.create_service(input).await?;
    info!(service_id = service.id, created_by = caller.id, "service_created");
    let service = populate::service(&state.store, &service).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": "Service created successfully", "service": service })),
    ))
}

#[utoipa::path(put, path = "/api/services/{id}", tag = "services", params(("id" = i32, Path, description = "Service id")), request_body = UpdateServiceBody, responses((status = 200, description = "Updated"), (status = 400, description = "Validation failed"), (status = 404, description = "Not found")))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<UpdateServiceBody>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&id, NOT_FOUND)?;
    let service = state
        .store
        .update_service(id, body.into_changes()?)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.into()))?;
    let service = populate::service(&state.store, &service).await?;
    Ok(Json(json!({ "success": true, "message": "Service updated successfully", "service": service })))
}

#[utoipa::path(delete, path = "/api/services/{id}", tag = "services", params(("id" = i32, Path, description = "Service id")), responses((status = 200, description = "Deleted"), (status = 404, description = "Not found")))]
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let id = parse_id(&id, NOT_FOUND)?;
    state
        .store
        .delete_service(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.into()))?;
    info!(service_id = id, "service_deleted");
    Ok(Json(json!({ "success": true, "message": "Service deleted successfully" })))
}
