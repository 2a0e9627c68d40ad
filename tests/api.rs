use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use homefix_backend::{
    app::build_router,
    backend::{Backend, InMemoryBackend},
    config::Config,
    middleware::AppState,
    models::{GeoPoint, ServiceType, Technician, TechnicianStatus, UpsertProfile, UserRole},
    services::NotificationService,
};

const SECRET: &str = "integration-secret";

fn config() -> Config {
    Config {
        host: "127.0.0.1".into(),
        port: 0,
        supabase_url: "http://localhost:54321".into(),
        service_role_key: "service-key".into(),
        jwt_secret: Some(SECRET.into()),
        database_url: None,
    }
}

fn app() -> (Arc<InMemoryBackend>, Router) {
    let backend = Arc::new(InMemoryBackend::new());
    let state = AppState::new(
        config(),
        backend.clone(),
        Arc::new(NotificationService::new()),
    );
    (backend, build_router(state))
}

fn token(user_id: Uuid, role: &str) -> String {
    let claims = json!({
        "sub": user_id.to_string(),
        "exp": (Utc::now() + Duration::hours(1)).timestamp(),
        "aud": "authenticated",
        "app_metadata": {"role": role},
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn intake() -> Value {
    json!({
        "full_name": "Sara Ali",
        "mobile": "0551234567",
        "location": {"lat": 24.7136, "lng": 46.6753, "neighborhood": "Olaya"},
        "service_type": "plumbing",
        "issue_description": "Kitchen sink leaking",
        "preferred_time": "morning"
    })
}

#[tokio::test]
async fn health_and_root_respond() {
    let (_, app) = app();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&app, Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "HomeFix API");
}

#[tokio::test]
async fn customer_can_submit_and_track() {
    let (_, app) = app();
    let (status, created) =
        send(&app, Method::POST, "/api/v1/requests", None, Some(intake())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "pending");
    assert_eq!(created["reference"].as_str().unwrap().len(), 8);

    let uri = format!("/api/v1/requests/{}", created["id"].as_str().unwrap());
    let (status, tracked) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tracked["status"], "pending");
    assert!(tracked.get("admin_notes").is_none());
}

#[tokio::test]
async fn invalid_intake_is_unprocessable() {
    let (_, app) = app();
    let mut body = intake();
    body["mobile"] = json!("12345");
    let (status, error) = send(&app, Method::POST, "/api/v1/requests", None, Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["success"], false);
    assert_eq!(error["error"]["code"], "VALIDATION_ERROR");

    let mut body = intake();
    body["photo_urls"] = json!(["https://a", "https://b", "https://c", "https://d", "https://e", "https://f"]);
    let (status, _) = send(&app, Method::POST, "/api/v1/requests", None, Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unknown_request_is_not_found() {
    let (_, app) = app();
    let uri = format!("/api/v1/requests/{}", Uuid::new_v4());
    let (status, error) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn admin_routes_require_admin_token() {
    let (_, app) = app();
    let (status, _) = send(&app, Method::GET, "/api/v1/admin/requests", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/v1/admin/requests",
        Some("not-a-jwt"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let user = token(Uuid::new_v4(), "user");
    let (status, _) = send(&app, Method::GET, "/api/v1/admin/requests", Some(&user), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let tech = token(Uuid::new_v4(), "technician");
    let (status, _) = send(&app, Method::GET, "/api/v1/admin/dashboard", Some(&tech), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_dispatches_a_request() {
    let (backend, app) = app();
    let admin = token(Uuid::new_v4(), "admin");
    let tech_id = Uuid::new_v4();
    backend
        .add_technician(Technician {
            id: tech_id,
            full_name: "Omar".into(),
            phone: "0550000001".into(),
            skills: vec![ServiceType::Plumbing],
            location: GeoPoint {
                lat: 24.72,
                lng: 46.68,
            },
            status: TechnicianStatus::Available,
            created_at: Utc::now(),
        })
        .await;

    let (_, created) = send(&app, Method::POST, "/api/v1/requests", None, Some(intake())).await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, list) = send(
        &app,
        Method::GET,
        "/api/v1/admin/requests?status=pending",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, candidates) = send(
        &app,
        Method::GET,
        &format!("/api/v1/admin/requests/{}/candidates", id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(candidates[0]["technician"]["id"], tech_id.to_string());

    let (status, assigned) = send(
        &app,
        Method::POST,
        &format!("/api/v1/admin/requests/{}/assign", id),
        Some(&admin),
        Some(json!({"technician_id": tech_id})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(assigned["request"]["status"], "in_progress");
    assert_eq!(assigned["technician"]["status"], "busy");

    // Already started: back to pending is not allowed.
    let (status, error) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/admin/requests/{}/status", id),
        Some(&admin),
        Some(json!({"status": "pending"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["error"]["code"], "INVALID_TRANSITION");

    let (status, noted) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/admin/requests/{}/notes", id),
        Some(&admin),
        Some(json!({"admin_notes": "Customer prefers a call"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(noted["admin_notes"], "Customer prefers a call");
}

#[tokio::test]
async fn technician_accepts_and_completes() {
    let (backend, app) = app();
    let tech_id = Uuid::new_v4();
    backend
        .add_technician(Technician {
            id: tech_id,
            full_name: "Omar".into(),
            phone: "0550000001".into(),
            skills: vec![ServiceType::Plumbing],
            location: GeoPoint {
                lat: 24.72,
                lng: 46.68,
            },
            status: TechnicianStatus::Available,
            created_at: Utc::now(),
        })
        .await;
    let tech = token(tech_id, "technician");

    let (_, created) = send(&app, Method::POST, "/api/v1/requests", None, Some(intake())).await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, tasks) = send(&app, Method::GET, "/api/v1/technician/requests", Some(&tech), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tasks.as_array().unwrap().len(), 1);

    let status_uri = format!("/api/v1/technician/requests/{}/status", id);
    let (status, accepted) = send(
        &app,
        Method::PUT,
        &status_uri,
        Some(&tech),
        Some(json!({"status": "accepted"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accepted["status"], "confirmed");

    // Starting unassigned work claims it for the technician.
    let (status, started) = send(
        &app,
        Method::PUT,
        &status_uri,
        Some(&tech),
        Some(json!({"status": "in_progress"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["status"], "in_progress");
    assert_eq!(started["assigned_technician"], tech_id.to_string());

    let other = token(Uuid::new_v4(), "technician");
    let (status, _) = send(
        &app,
        Method::PUT,
        &status_uri,
        Some(&other),
        Some(json!({"status": "completed"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, done) = send(
        &app,
        Method::PUT,
        &status_uri,
        Some(&tech),
        Some(json!({"status": "completed"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["status"], "completed");

    let review_uri = format!("/api/v1/requests/{}/reviews", id);
    let (status, error) = send(
        &app,
        Method::POST,
        &review_uri,
        None,
        Some(json!({"rating": 4.5, "satisfaction": "satisfied"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["error"]["code"], "MISSING_RATING");

    let (status, review) = send(
        &app,
        Method::POST,
        &review_uri,
        None,
        Some(json!({"rating": "5", "satisfaction": "satisfied"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(review["rating"], 5);
    assert_eq!(review["technician_id"], tech_id.to_string());

    let user = token(Uuid::new_v4(), "user");
    let (status, _) = send(&app, Method::GET, "/api/v1/technician/requests", Some(&user), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn rating_errors_map_to_codes() {
    let (_, app) = app();
    let (_, created) = send(&app, Method::POST, "/api/v1/requests", None, Some(intake())).await;
    let uri = format!("/api/v1/requests/{}/reviews", created["id"].as_str().unwrap());

    let (status, error) = send(
        &app,
        Method::POST,
        &uri,
        None,
        Some(json!({"rating": 5, "satisfaction": "satisfied"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn parts_are_listed_by_category() {
    let (_, app) = app();
    let (status, parts) = send(&app, Method::GET, "/api/v1/parts?category=ac", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parts, json!([]));

    let (status, _) = send(&app, Method::GET, "/api/v1/parts?category=garden", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn event_stream_is_staff_only() {
    let (_, app) = app();
    let user = token(Uuid::new_v4(), "user");
    let (status, _) = send(&app, Method::GET, "/api/v1/events", Some(&user), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::GET, "/api/v1/events", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_role_overrides_token_metadata() {
    let (backend, app) = app();
    let id = Uuid::new_v4();
    backend
        .upsert_profile(&UpsertProfile {
            id,
            email: "ops@homefix.sa".into(),
            full_name: Some("Ops".into()),
            role: UserRole::Admin,
        })
        .await
        .unwrap();

    let (status, dashboard) = send(
        &app,
        Method::GET,
        "/api/v1/admin/dashboard",
        Some(&token(id, "user")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["by_status"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn self_declared_role_grants_nothing() {
    let (_, app) = app();
    let claims = json!({
        "sub": Uuid::new_v4().to_string(),
        "exp": (Utc::now() + Duration::hours(1)).timestamp(),
        "aud": "authenticated",
        "app_metadata": {"provider": "email"},
        "user_metadata": {"role": "admin"},
    });
    let forged = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();

    let (status, error) = send(&app, Method::GET, "/api/v1/admin/requests", Some(&forged), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn notes_on_unknown_request_are_not_found() {
    let (_, app) = app();
    let admin = token(Uuid::new_v4(), "admin");
    let (status, error) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/admin/requests/{}/notes", Uuid::new_v4()),
        Some(&admin),
        Some(json!({"admin_notes": "call first"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["error"]["code"], "NOT_FOUND");
}
