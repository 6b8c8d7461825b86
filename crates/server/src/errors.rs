use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use store::StoreError;
use thiserror::Error;
use tracing::{error, warn};
use validator::ValidationErrors;

/// One rejected request field, as shown next to the form input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn field(field: &str, message: &str) -> Self {
        ApiError::Validation(vec![FieldError::new(field, message)])
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// `first_name` -> `firstName`; names already in camelCase pass through.
pub(crate) fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for ch in field.chars() {
        if ch == '_' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

impl From<ValidationErrors> for ApiError {
    fn from(errs: ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errs
            .field_errors()
            .into_iter()
            .flat_map(|(field, list)| {
                let name = camel_case(&field);
                list.iter()
                    .map(|e| {
                        let message = e
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("Invalid {name}"));
                        FieldError::new(name.clone(), message)
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        // HashMap 顺序不稳定，按字段名排序
        fields.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.message.cmp(&b.message)));
        ApiError::Validation(fields)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(error = %rejection.body_text(), "rejected request body");
        ApiError::BadRequest("Invalid JSON body".into())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Validation(msg) => ApiError::BadRequest(msg),
            StoreError::NotFound(msg) => ApiError::NotFound(msg),
            StoreError::Conflict(_) => ApiError::field("email", "User already exists with this email"),
            StoreError::Unauthorized => ApiError::Unauthorized("Invalid credentials".into()),
            other => {
                let code = other.code();
                ApiError::Internal(format!("store error {code}: {other}"))
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Validation(errors) => {
                json!({ "success": false, "message": "Validation failed", "errors": errors })
            }
            ApiError::Internal(detail) => {
                error!(error = %detail, "request failed");
                json!({ "success": false, "message": "Server error" })
            }
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg) => json!({ "success": false, "message": msg }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let res = err.into_response();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn camel_case_converts_snake_names() {
        assert_eq!(camel_case("short_description"), "shortDescription");
        assert_eq!(camel_case("is_active"), "isActive");
        assert_eq!(camel_case("assignedTo"), "assignedTo");
        assert_eq!(camel_case("email"), "email");
    }

    #[tokio::test]
    async fn internal_errors_hide_detail() {
        let (status, body) = body_of(StoreError::Db("connection reset".into()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Server error");
        assert!(!body.to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn conflict_becomes_email_field_error() {
        let (status, body) = body_of(StoreError::Conflict("dup".into()).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Validation failed");
        assert_eq!(body["errors"][0]["field"], "email");
    }

    #[tokio::test]
    async fn not_found_keeps_message() {
        let (status, body) = body_of(ApiError::NotFound("Service not found".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "success": false, "message": "Service not found" }));
    }
}
