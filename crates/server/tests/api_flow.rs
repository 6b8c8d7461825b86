use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use configs::ServerConfig;
use serde_json::{json, Value};
use server::routes;
use server::{AppState, AuthSettings};
use store::Store;
use tower::ServiceExt;
use tower_http::cors::CorsLayer;

const ADMIN: (&str, &str) = ("admin@geed.com", "admin123");
const JOHN: (&str, &str) = ("john@example.com", "password123");

async fn app() -> Router {
    let store = Store::seeded_memory().await.expect("seeded store");
    let state = AppState::new(store, AuthSettings { jwt_secret: "test-secret".into(), token_ttl_hours: 1 });
    routes::build_router(state, CorsLayer::very_permissive(), &ServerConfig::default())
}

struct Reply {
    status: StatusCode,
    body: Value,
    set_cookie: Option<String>,
}

async fn call(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Reply {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
        Some(b) => req.header(header::CONTENT_TYPE, "application/json").body(Body::from(b.to_string())),
        None => req.body(Body::empty()),
    }
    .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let set_cookie = res
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    Reply { status, body, set_cookie }
}

async fn login(app: &Router, (email, password): (&str, &str)) -> String {
    let r = call(app, Method::POST, "/api/auth/login", None, Some(json!({ "email": email, "password": password }))).await;
    assert_eq!(r.status, StatusCode::OK, "login failed: {}", r.body);
    r.body["token"].as_str().unwrap().to_string()
}

fn error_fields(body: &Value) -> Vec<String> {
    body["errors"]
        .as_array()
        .map(|a| a.iter().map(|e| e["field"].as_str().unwrap_or_default().to_string()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn health_reports_memory_backend() {
    let app = app().await;
    let r = call(&app, Method::GET, "/api/health", None, None).await;
    assert_eq!(r.status, StatusCode::OK);
    assert_eq!(r.body, json!({ "status": "ok", "backend": "memory" }));
}

#[tokio::test]
async fn contact_goes_new_then_read_then_closed() {
    let app = app().await;
    let form = json!({
        "name": "Jo Lee",
        "email": "jo@x.com",
        "subject": "Billing question here",
        "message": "Please clarify my invoice amount"
    });
    let r = call(&app, Method::POST, "/api/contact", None, Some(form)).await;
    assert_eq!(r.status, StatusCode::CREATED);
    assert_eq!(r.body["success"], true);
    assert_eq!(r.body["contact"]["status"], "new");
    assert_eq!(r.body["contact"]["email"], "jo@x.com");
    let id = r.body["contact"]["id"].as_i64().unwrap();

    let admin = login(&app, ADMIN).await;
    let list = call(&app, Method::GET, "/api/contact", Some(&admin), None).await;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(list.body["total"], 1);
    assert_eq!(list.body["statusCounts"], json!([{ "_id": "new", "count": 1 }]));

    let opened = call(&app, Method::GET, &format!("/api/contact/{id}"), Some(&admin), None).await;
    assert_eq!(opened.status, StatusCode::OK);
    assert_eq!(opened.body["contact"]["status"], "read");

    let closed = call(
        &app,
        Method::PUT,
        &format!("/api/contact/{id}/status"),
        Some(&admin),
        Some(json!({ "status": "closed", "priority": "high" })),
    )
    .await;
    assert_eq!(closed.status, StatusCode::OK);
    assert_eq!(closed.body["contact"]["status"], "closed");
    assert_eq!(closed.body["contact"]["priority"], "high");

    // viewing again leaves the status alone
    let again = call(&app, Method::GET, &format!("/api/contact/{id}"), Some(&admin), None).await;
    assert_eq!(again.body["contact"]["status"], "closed");
}

#[tokio::test]
async fn contact_validation_lists_every_bad_field() {
    let app = app().await;
    let r = call(
        &app,
        Method::POST,
        "/api/contact",
        None,
        Some(json!({ "name": "J", "email": "not-an-email", "subject": "Hi", "message": "short" })),
    )
    .await;
    assert_eq!(r.status, StatusCode::BAD_REQUEST);
    assert_eq!(r.body["message"], "Validation failed");
    assert_eq!(error_fields(&r.body), vec!["email", "message", "name", "subject"]);
}

#[tokio::test]
async fn reply_marks_contact_replied() {
    let app = app().await;
    let form = json!({
        "name": "Sam Roe",
        "email": "sam@x.com",
        "subject": "Partnership idea",
        "message": "Would you like to collaborate on a project?"
    });
    let id = call(&app, Method::POST, "/api/contact", None, Some(form)).await.body["contact"]["id"]
        .as_i64()
        .unwrap();
    let admin = login(&app, ADMIN).await;

    let short = call(&app, Method::POST, &format!("/api/contact/{id}/reply"), Some(&admin), Some(json!({ "message": "ok" }))).await;
    assert_eq!(short.status, StatusCode::BAD_REQUEST);

    let r = call(
        &app,
        Method::POST,
        &format!("/api/contact/{id}/reply"),
        Some(&admin),
        Some(json!({ "message": "Thanks, we will reach out tomorrow." })),
    )
    .await;
    assert_eq!(r.status, StatusCode::OK);
    assert_eq!(r.body["contact"]["status"], "replied");
    assert_eq!(r.body["contact"]["reply"]["message"], "Thanks, we will reach out tomorrow.");
    assert_eq!(r.body["contact"]["reply"]["repliedBy"]["email"], ADMIN.0);
    assert_eq!(r.body["contact"]["assignedTo"], Value::Null);

    let missing = call(&app, Method::POST, "/api/contact/9999/reply", Some(&admin), Some(json!({ "message": "Anybody there at all?" }))).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["message"], "Contact message not found");
}

#[tokio::test]
async fn bogus_category_is_rejected_and_nothing_is_created() {
    let app = app().await;
    let admin = login(&app, ADMIN).await;
    let r = call(
        &app,
        Method::POST,
        "/api/services",
        Some(&admin),
        Some(json!({
            "title": "Odd Service",
            "description": "A service in a category that does not exist",
            "shortDescription": "Nothing fits here",
            "category": "bogus"
        })),
    )
    .await;
    assert_eq!(r.status, StatusCode::BAD_REQUEST);
    assert_eq!(error_fields(&r.body), vec!["category"]);
    assert_eq!(r.body["errors"][0]["message"], "Invalid category");

    let list = call(&app, Method::GET, "/api/services", None, None).await;
    assert_eq!(list.body["total"], 3);
}

#[tokio::test]
async fn service_writes_need_an_admin() {
    let app = app().await;
    let body = json!({
        "title": "Cloud Hosting",
        "description": "Managed hosting with monitoring and backups",
        "shortDescription": "Hosting that just works",
        "category": "support",
        "price": 99.5,
        "currency": "EUR",
        "features": [" Backups ", "Monitoring", ""],
        "order": 4
    });

    let anon = call(&app, Method::POST, "/api/services", None, Some(body.clone())).await;
    assert_eq!(anon.status, StatusCode::UNAUTHORIZED);
    assert_eq!(anon.body["success"], false);

    let john = login(&app, JOHN).await;
    let user = call(&app, Method::POST, "/api/services", Some(&john), Some(body.clone())).await;
    assert_eq!(user.status, StatusCode::FORBIDDEN);

    let admin = login(&app, ADMIN).await;
    let created = call(&app, Method::POST, "/api/services", Some(&admin), Some(body)).await;
    assert_eq!(created.status, StatusCode::CREATED);
    let svc = &created.body["service"];
    assert_eq!(svc["currency"], "EUR");
    assert_eq!(svc["order"], 4);
    assert_eq!(svc["icon"], "service");
    assert_eq!(svc["features"], json!(["Backups", "Monitoring"]));
    let id = svc["id"].as_i64().unwrap();

    let hidden = call(&app, Method::PUT, &format!("/api/services/{id}"), Some(&admin), Some(json!({ "isActive": false }))).await;
    assert_eq!(hidden.status, StatusCode::OK);
    let public = call(&app, Method::GET, &format!("/api/services/{id}"), None, None).await;
    assert_eq!(public.status, StatusCode::NOT_FOUND);
    assert_eq!(public.body["message"], "Service not found");

    let deleted = call(&app, Method::DELETE, &format!("/api/services/{id}"), Some(&admin), None).await;
    assert_eq!(deleted.status, StatusCode::OK);
    let gone = call(&app, Method::DELETE, &format!("/api/services/{id}"), Some(&admin), None).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn service_pages_cover_the_set_once() {
    let app = app().await;
    let all = call(&app, Method::GET, "/api/services?limit=100", None, None).await;
    let expected: Vec<Value> = all.body["services"].as_array().unwrap().clone();
    assert_eq!(expected.len(), 3);

    let first = call(&app, Method::GET, "/api/services?page=1&limit=2", None, None).await;
    let second = call(&app, Method::GET, "/api/services?page=2&limit=2", None, None).await;
    assert_eq!(first.body["pages"], 2);
    assert_eq!(first.body["count"], 2);
    assert_eq!(second.body["count"], 1);
    let mut joined = first.body["services"].as_array().unwrap().clone();
    joined.extend(second.body["services"].as_array().unwrap().iter().cloned());
    assert_eq!(joined, expected);

    // malformed numbers fall back to the defaults
    let lenient = call(&app, Method::GET, "/api/services?page=abc&limit=zero", None, None).await;
    assert_eq!(lenient.status, StatusCode::OK);
    assert_eq!(lenient.body["page"], 1);
}

#[tokio::test]
async fn services_filter_by_category_and_search() {
    let app = app().await;
    let marketing = call(&app, Method::GET, "/api/services?category=marketing", None, None).await;
    assert_eq!(marketing.body["total"], 1);
    assert!(marketing.body["services"].as_array().unwrap().iter().all(|s| s["category"] == "marketing"));

    let search = call(&app, Method::GET, "/api/services?search=MOBILE", None, None).await;
    assert_eq!(search.body["total"], 1);
    assert_eq!(search.body["services"][0]["title"], "Mobile App Development");

    let bad = call(&app, Method::GET, "/api/services?category=bogus", None, None).await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);

    let cats = call(&app, Method::GET, "/api/services/categories/list", None, None).await;
    assert_eq!(cats.body["categories"].as_array().unwrap().len(), 6);
    assert_eq!(cats.body["categories"][1], json!({ "value": "technology", "label": "Technology Solutions" }));
}

#[tokio::test]
async fn unknown_ids_and_routes_are_json_404s() {
    let app = app().await;
    let r = call(&app, Method::GET, "/api/services/not-a-number", None, None).await;
    assert_eq!(r.status, StatusCode::NOT_FOUND);
    assert_eq!(r.body["message"], "Service not found");

    let r = call(&app, Method::GET, "/api/nothing/here", None, None).await;
    assert_eq!(r.status, StatusCode::NOT_FOUND);
    assert_eq!(r.body["success"], false);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = app().await;
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/contact")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&to_bytes(res.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body["message"], "Invalid JSON body");
}

#[tokio::test]
async fn register_then_use_the_cookie() {
    let app = app().await;
    let r = call(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "name": " Ana Diaz ", "email": "Ana@Example.com", "password": "secret1" })),
    )
    .await;
    assert_eq!(r.status, StatusCode::CREATED);
    assert_eq!(r.body["user"]["email"], "ana@example.com");
    assert_eq!(r.body["user"]["role"], "user");
    assert!(r.body["user"].get("passwordHash").is_none());
    let cookie = r.set_cookie.expect("auth cookie");
    assert!(cookie.starts_with("auth_token="));
    assert!(cookie.contains("HttpOnly"));

    let pair = cookie.split(';').next().unwrap().to_string();
    let req = Request::builder()
        .uri("/api/auth/me")
        .header(header::COOKIE, pair)
        .body(Body::empty())
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let dup = call(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "name": "Ana Again", "email": "ana@example.com", "password": "secret1" })),
    )
    .await;
    assert_eq!(dup.status, StatusCode::BAD_REQUEST);
    assert_eq!(dup.body["errors"][0], json!({ "field": "email", "message": "User already exists with this email" }));
}

#[tokio::test]
async fn bad_credentials_and_tokens_are_401() {
    let app = app().await;
    let r = call(&app, Method::POST, "/api/auth/login", None, Some(json!({ "email": ADMIN.0, "password": "wrong" }))).await;
    assert_eq!(r.status, StatusCode::UNAUTHORIZED);
    assert_eq!(r.body["message"], "Invalid credentials");

    let r = call(&app, Method::GET, "/api/auth/me", Some("garbage.token.value"), None).await;
    assert_eq!(r.status, StatusCode::UNAUTHORIZED);

    let r = call(&app, Method::GET, "/api/auth/me", None, None).await;
    assert_eq!(r.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deactivated_accounts_lose_access() {
    let app = app().await;
    let john = login(&app, JOHN).await;
    let me = call(&app, Method::GET, "/api/auth/me", Some(&john), None).await;
    let john_id = me.body["user"]["id"].as_i64().unwrap();

    let admin = login(&app, ADMIN).await;
    let r = call(&app, Method::PUT, &format!("/api/users/{john_id}"), Some(&admin), Some(json!({ "isActive": false }))).await;
    assert_eq!(r.status, StatusCode::OK);
    assert_eq!(r.body["user"]["isActive"], false);

    // the old token is rejected because the user is reloaded per request
    let stale = call(&app, Method::GET, "/api/auth/me", Some(&john), None).await;
    assert_eq!(stale.status, StatusCode::UNAUTHORIZED);

    let relogin = call(&app, Method::POST, "/api/auth/login", None, Some(json!({ "email": JOHN.0, "password": JOHN.1 }))).await;
    assert_eq!(relogin.status, StatusCode::UNAUTHORIZED);
    assert_eq!(relogin.body["message"], "Account is deactivated");
}

#[tokio::test]
async fn profile_and_password_changes() {
    let app = app().await;
    let john = login(&app, JOHN).await;

    let r = call(
        &app,
        Method::PUT,
        "/api/users/profile",
        Some(&john),
        Some(json!({ "name": "John Q. Doe", "location": " Rabat ", "bio": "Customer since 2020" })),
    )
    .await;
    assert_eq!(r.status, StatusCode::OK);
    assert_eq!(r.body["user"]["name"], "John Q. Doe");
    assert_eq!(r.body["user"]["location"], "Rabat");

    let wrong = call(
        &app,
        Method::PUT,
        "/api/auth/change-password",
        Some(&john),
        Some(json!({ "currentPassword": "nope", "newPassword": "newpass1" })),
    )
    .await;
    assert_eq!(wrong.status, StatusCode::BAD_REQUEST);
    assert_eq!(error_fields(&wrong.body), vec!["currentPassword"]);

    let ok = call(
        &app,
        Method::PUT,
        "/api/auth/change-password",
        Some(&john),
        Some(json!({ "currentPassword": JOHN.1, "newPassword": "newpass1" })),
    )
    .await;
    assert_eq!(ok.status, StatusCode::OK);
    login(&app, (JOHN.0, "newpass1")).await;
}

#[tokio::test]
async fn admin_user_management() {
    let app = app().await;
    let admin = login(&app, ADMIN).await;
    let john = login(&app, JOHN).await;

    let forbidden = call(&app, Method::GET, "/api/users", Some(&john), None).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let users = call(&app, Method::GET, "/api/users", Some(&admin), None).await;
    assert_eq!(users.status, StatusCode::OK);
    assert_eq!(users.body["total"], 2);

    let me = call(&app, Method::GET, "/api/auth/me", Some(&admin), None).await;
    let admin_id = me.body["user"]["id"].as_i64().unwrap();
    let selfdel = call(&app, Method::DELETE, &format!("/api/users/{admin_id}"), Some(&admin), None).await;
    assert_eq!(selfdel.status, StatusCode::BAD_REQUEST);

    let bad_role = call(&app, Method::PUT, &format!("/api/users/{admin_id}"), Some(&admin), Some(json!({ "role": "root" }))).await;
    assert_eq!(bad_role.status, StatusCode::BAD_REQUEST);
    assert_eq!(error_fields(&bad_role.body), vec!["role"]);

    let stats = call(&app, Method::GET, "/api/users/dashboard", Some(&john), None).await;
    assert_eq!(stats.status, StatusCode::OK);
    assert_eq!(stats.body["stats"], json!({ "totalServices": 3, "totalUsers": 2, "totalContacts": 0, "newContacts": 0 }));
}

#[tokio::test]
async fn assigning_to_unknown_user_is_rejected() {
    let app = app().await;
    let form = json!({
        "name": "Jo Lee",
        "email": "jo@x.com",
        "subject": "Billing question here",
        "message": "Please clarify my invoice amount"
    });
    let id = call(&app, Method::POST, "/api/contact", None, Some(form)).await.body["contact"]["id"]
        .as_i64()
        .unwrap();
    let admin = login(&app, ADMIN).await;
    let r = call(
        &app,
        Method::PUT,
        &format!("/api/contact/{id}/status"),
        Some(&admin),
        Some(json!({ "status": "read", "assignedTo": 4242 })),
    )
    .await;
    assert_eq!(r.status, StatusCode::BAD_REQUEST);
    assert_eq!(error_fields(&r.body), vec!["assignedTo"]);

    let bad_status = call(&app, Method::PUT, &format!("/api/contact/{id}/status"), Some(&admin), Some(json!({ "status": "lost" }))).await;
    assert_eq!(bad_status.status, StatusCode::BAD_REQUEST);
    assert_eq!(error_fields(&bad_status.body), vec!["status"]);
}

#[tokio::test]
async fn metrics_and_docs_are_served() {
    let app = app().await;
    call(&app, Method::GET, "/api/health", None, None).await;
    let req = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let text = String::from_utf8(to_bytes(res.into_body(), usize::MAX).await.unwrap().to_vec()).unwrap();
    assert!(text.contains("geed_http_requests_total"));

    let doc = call(&app, Method::GET, "/api-docs/openapi.json", None, None).await;
    assert_eq!(doc.status, StatusCode::OK);
    assert!(doc.body["paths"]["/api/contact"].is_object());
}

#[tokio::test]
async fn huge_page_numbers_return_an_empty_page() {
    let app = app().await;
    let r = call(&app, Method::GET, "/api/services?page=9223372036854775807", None, None).await;
    assert_eq!(r.status, StatusCode::OK);
    assert_eq!(r.body["count"], 0);
    assert_eq!(r.body["total"], 3);
    assert_eq!(r.body["services"], json!([]));

    let admin = login(&app, ADMIN).await;
    for uri in ["/api/contact?page=18446744073709551615", "/api/users?page=9223372036854775807&limit=100"] {
        let r = call(&app, Method::GET, uri, Some(&admin), None).await;
        assert_eq!(r.status, StatusCode::OK, "{uri}");
        assert_eq!(r.body["count"], 0, "{uri}");
    }
}

#[tokio::test]
async fn records_show_who_created_assigned_and_replied() {
    let app = app().await;
    let admin = login(&app, ADMIN).await;
    let john_id = {
        let john = login(&app, JOHN).await;
        call(&app, Method::GET, "/api/auth/me", Some(&john), None).await.body["user"]["id"].clone()
    };

    let list = call(&app, Method::GET, "/api/services", None, None).await;
    let first = &list.body["services"][0];
    assert_eq!(first["createdBy"]["name"], "Admin User");
    assert_eq!(first["createdBy"]["email"], ADMIN.0);
    assert!(first["createdBy"].get("passwordHash").is_none());

    let id = first["id"].as_i64().unwrap();
    let one = call(&app, Method::GET, &format!("/api/services/{id}"), None, None).await;
    assert_eq!(one.body["service"]["createdBy"], first["createdBy"]);

    let form = json!({
        "name": "Jo Lee",
        "email": "jo@x.com",
        "subject": "Billing question here",
        "message": "Please clarify my invoice amount"
    });
    let cid = call(&app, Method::POST, "/api/contact", None, Some(form)).await.body["contact"]["id"]
        .as_i64()
        .unwrap();
    let assigned = call(
        &app,
        Method::PUT,
        &format!("/api/contact/{cid}/status"),
        Some(&admin),
        Some(json!({ "status": "read", "assignedTo": john_id })),
    )
    .await;
    assert_eq!(assigned.status, StatusCode::OK);
    assert_eq!(assigned.body["contact"]["assignedTo"], json!({ "id": john_id, "name": "John Doe", "email": JOHN.0 }));

    let inbox = call(&app, Method::GET, "/api/contact", Some(&admin), None).await;
    assert_eq!(inbox.body["contacts"][0]["assignedTo"]["name"], "John Doe");
}

#[tokio::test]
async fn repeated_reads_return_identical_payloads() {
    let app = app().await;
    let list_uri = "/api/services?category=technology&limit=5";
    let a = call(&app, Method::GET, list_uri, None, None).await;
    let b = call(&app, Method::GET, list_uri, None, None).await;
    assert_eq!(a.status, StatusCode::OK);
    assert_eq!(a.body, b.body);

    let id = a.body["services"][0]["id"].as_i64().unwrap();
    let one_a = call(&app, Method::GET, &format!("/api/services/{id}"), None, None).await;
    let one_b = call(&app, Method::GET, &format!("/api/services/{id}"), None, None).await;
    assert_eq!(one_a.status, StatusCode::OK);
    assert_eq!(one_a.body, one_b.body);

    let form = json!({
        "name": "Sam Roe",
        "email": "sam@x.com",
        "subject": "Partnership idea",
        "message": "Would you like to collaborate on a project?"
    });
    let cid = call(&app, Method::POST, "/api/contact", None, Some(form)).await.body["contact"]["id"]
        .as_i64()
        .unwrap();
    let admin = login(&app, ADMIN).await;
    let before = call(&app, Method::GET, "/api/contact", Some(&admin), None).await.body["contacts"][0].clone();
    assert_eq!(before["status"], "new");

    // only the first view moves new -> read
    let first = call(&app, Method::GET, &format!("/api/contact/{cid}"), Some(&admin), None).await;
    let second = call(&app, Method::GET, &format!("/api/contact/{cid}"), Some(&admin), None).await;
    assert_eq!(first.body["contact"]["status"], "read");
    assert_ne!(first.body["contact"]["updatedAt"], before["updatedAt"]);
    assert_eq!(first.body, second.body);
}
