//! Request extraction helpers: validated JSON bodies, lenient query numbers
//! and path ids.

use std::str::FromStr;

use axum::extract::{FromRequest, Request};
use axum::Json;
use models::{Category, ContactStatus, Currency, Priority, Role};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError};

use crate::errors::ApiError;

/// Cleanup applied to a body before validation runs.
pub trait Normalize {
    fn normalize(&mut self) {}
}

/// JSON body that has been normalized and validated.
///
/// Syntax errors reject with a 400 `BadRequest`; constraint failures reject
/// with a 400 field list.
pub struct ValidJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate + Normalize,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(mut value) = Json::<T>::from_request(req, state).await?;
        value.normalize();
        value.validate()?;
        Ok(ValidJson(value))
    }
}

pub fn trim(s: &mut String) {
    let t = s.trim();
    if t.len() != s.len() {
        *s = t.to_string();
    }
}

/// Trim an optional string; blank values count as absent.
pub fn trim_opt(s: &mut Option<String>) {
    if let Some(v) = s.as_mut() {
        trim(v);
        if v.is_empty() {
            *s = None;
        }
    }
}

pub fn email(s: &mut String) {
    *s = s.trim().to_lowercase();
}

pub fn email_opt(s: &mut Option<String>) {
    trim_opt(s);
    if let Some(v) = s.as_mut() {
        *v = v.to_lowercase();
    }
}

fn one_of<T: FromStr>(raw: &str, code: &'static str) -> Result<(), ValidationError> {
    raw.parse::<T>().map(|_| ()).map_err(|_| ValidationError::new(code))
}

pub fn is_category(raw: &str) -> Result<(), ValidationError> {
    one_of::<Category>(raw, "category")
}

pub fn is_currency(raw: &str) -> Result<(), ValidationError> {
    one_of::<Currency>(raw, "currency")
}

pub fn is_status(raw: &str) -> Result<(), ValidationError> {
    one_of::<ContactStatus>(raw, "status")
}

pub fn is_priority(raw: &str) -> Result<(), ValidationError> {
    one_of::<Priority>(raw, "priority")
}

pub fn is_role(raw: &str) -> Result<(), ValidationError> {
    one_of::<Role>(raw, "role")
}

/// Parse a value already accepted by one of the `is_*` validators.
pub fn parse_checked<T>(raw: &str) -> Result<T, ApiError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// Query numbers fall back to the default when absent or malformed.
pub fn lenient_u64(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
}

/// Blank filters are ignored; unknown values are a field error.
pub fn filter_value<T: std::str::FromStr>(raw: Option<&str>, field: &str) -> Result<Option<T>, ApiError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => v
            .parse::<T>()
            .map(Some)
            .map_err(|_| ApiError::field(field, &format!("Invalid {field}"))),
    }
}

/// Non-numeric ids cannot name a record, so they read as missing.
pub fn parse_id(raw: &str, not_found: &str) -> Result<i32, ApiError> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::NotFound(not_found.to_string()))
}
