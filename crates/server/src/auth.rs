use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use models::user;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::ApiError;
use crate::state::{AppState, AuthSettings};

pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// user id
    pub sub: String,
    pub role: String,
    pub exp: usize,
    pub iat: usize,
}

pub fn issue_token(settings: &AuthSettings, user: &user::Model) -> Result<String, ApiError> {
    let now = Utc::now();
    let exp = now + Duration::hours(settings.token_ttl_hours);
    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role.to_string(),
        exp: exp.timestamp() as usize,
        iat: now.timestamp() as usize,
    };
    let key = EncodingKey::from_secret(settings.jwt_secret.as_bytes());
    encode(&Header::new(Algorithm::HS256), &claims, &key).map_err(|e| ApiError::Internal(format!("token encode: {e}")))
}

pub fn decode_token(settings: &AuthSettings, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let key = DecodingKey::from_secret(settings.jwt_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(token, &key, &validation).map(|data| data.claims)
}

/// Session cookie carrying the token for browser clients.
pub fn session_cookie(token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(AUTH_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

pub fn expired_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::from(AUTH_COOKIE);
    cookie.set_path("/");
    cookie
}

/// Bearer header first, then the `auth_token` cookie.
fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(h) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        return h
            .strip_prefix("Bearer ")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
    }
    CookieJar::from_headers(headers)
        .get(AUTH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

/// Authenticated caller, reloaded from the store for every request.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub user::Model);

/// 校验 token 并加载当前用户，写入请求扩展
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Result<Response, ApiError> {
    let path = req.uri().path().to_string();
    let Some(token) = token_from_headers(req.headers()) else {
        warn!(path = %path, "missing Authorization header and auth_token cookie");
        return Err(ApiError::Unauthorized("Not authorized, no token".into()));
    };
    let claims = decode_token(&state.auth, &token).map_err(|e| {
        warn!(path = %path, err = %e, "token validation failed");
        ApiError::Unauthorized("Not authorized, token failed".into())
    })?;
    let id = claims
        .sub
        .parse::<i32>()
        .map_err(|_| ApiError::Unauthorized("Not authorized, token failed".into()))?;
    let user = state
        .store
        .find_user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Not authorized, user not found".into()))?;
    if !user.is_active {
        warn!(path = %path, user_id = user.id, "inactive account rejected");
        return Err(ApiError::Unauthorized("Account is deactivated".into()));
    }
    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

/// Must run after [`require_auth`].
pub async fn require_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    match req.extensions().get::<CurrentUser>() {
        Some(CurrentUser(u)) if u.is_admin() => Ok(next.run(req).await),
        Some(CurrentUser(u)) => {
            warn!(path = %req.uri().path(), user_id = u.id, "admin route denied");
            Err(ApiError::Forbidden("Access denied. Admin only.".into()))
        }
        None => Err(ApiError::Unauthorized("Not authorized, no token".into())),
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("Not authorized, no token".into()))
    }
}
