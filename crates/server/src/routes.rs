use std::time::Duration;

use axum::{
    extract::State,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use configs::ServerConfig;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::auth::{require_admin, require_auth};
use crate::errors::ApiError;
use crate::observability;
use crate::openapi::ApiDoc;
use crate::state::AppState;

pub mod auth;
pub mod contact;
pub mod services;
pub mod users;

#[utoipa::path(get, path = "/api/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health { status: "ok", backend: state.store.kind().as_str() })
}

async fn metrics() -> (axum::http::StatusCode, String) {
    observability::encode_metrics()
}

async fn api_not_found() -> ApiError {
    ApiError::NotFound("Route not found".into())
}

fn services_router(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(services::list))
        .route("/categories/list", get(services::categories))
        .route("/:id", get(services::get));
    // route_layer 后加的先执行：先认证，再校验管理员
    let admin = Router::new()
        .route("/", post(services::create))
        .route("/:id", put(services::update).delete(services::delete))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));
    public.merge(admin)
}

fn contact_router(state: &AppState) -> Router<AppState> {
    let public = Router::new().route("/", post(contact::submit));
    let admin = Router::new()
        .route("/", get(contact::list))
        .route("/:id", get(contact::get).delete(contact::delete))
        .route("/:id/status", put(contact::update_status))
        .route("/:id/reply", post(contact::reply))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));
    public.merge(admin)
}

fn auth_router(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout));
    let private = Router::new()
        .route("/me", get(auth::me))
        .route("/profile", put(auth::update_profile))
        .route("/change-password", put(auth::change_password))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));
    public.merge(private)
}

fn users_router(state: &AppState) -> Router<AppState> {
    let own = Router::new()
        .route("/dashboard", get(users::dashboard))
        .route("/profile", put(auth::update_profile))
        .route("/change-password", put(auth::change_password))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));
    let admin = Router::new()
        .route("/", get(users::list))
        .route("/:id", get(users::get).put(users::update).delete(users::delete))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));
    own.merge(admin)
}

/// Build the full application router: JSON API, metrics, docs and the static frontend
pub fn build_router(state: AppState, cors: CorsLayer, server: &ServerConfig) -> Router {
    let index = format!("{}/index.html", server.frontend_dir.trim_end_matches('/'));
    let static_dir = ServeDir::new(&server.frontend_dir).fallback(ServeFile::new(index));

    let api = Router::new()
        .route("/health", get(health))
        .nest("/services", services_router(&state))
        .nest("/contact", contact_router(&state))
        .nest("/auth", auth_router(&state))
        .nest("/users", users_router(&state))
        // /api 下未知路径返回 JSON 404，不落到前端页面
        .fallback(api_not_found);

    Router::new()
        .nest("/api", api)
        .route("/metrics", get(metrics))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route_layer(middleware::from_fn(observability::track))
        .fallback_service(static_dir)
        .with_state(state)
        .layer(cors)
        .layer(TimeoutLayer::new(Duration::from_secs(server.request_timeout_secs)))
        .layer(
            TraceLayer::new_for_http()
                // 每个请求一个 span，记录方法与路径
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // 响应时记录状态码与耗时
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
