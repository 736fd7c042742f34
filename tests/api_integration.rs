//! Integration tests for all API endpoints.
//!
//! Each test boots the full Axum router (same assembly as `main.rs`)
//! using `tower::ServiceExt::oneshot` — no live server, live weather
//! API, or SMTP relay needed. `build_test_app()` wires together:
//! - a wiremocked weather endpoint behind the real `WeatherApiClient`
//! - an in-memory SQLite pool with the schema applied
//! - a `RecordingMailer` standing in for the SMTP relay
//! - an empty `TargetRegistry` plus Prometheus `AppMetrics`
//! - the complete `Router` returned ready for `oneshot`

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use weather_notifier::api::{self, ApiContext};
use weather_notifier::db;
use weather_notifier::metrics::AppMetrics;
use weather_notifier::notifier::types::Frequency;
use weather_notifier::repository::SubscriberRepository;
use weather_notifier::services::mock_mailer::RecordingMailer;
use weather_notifier::services::weather::WeatherApiClient;
use weather_notifier::store::TargetRegistry;

// ---- Helpers ----------------------------------------------------------------

/// Fake `current.json` payload served by the wiremock weather server.
const FAKE_KYIV_WEATHER: &str = r#"{
    "location": { "name": "Kyiv" },
    "current": {
        "temp_c": 21.6,
        "temp_f": 70.9,
        "humidity": 58,
        "condition": { "text": "Partly cloudy" }
    }
}"#;

struct TestApp {
    router: Router,
    registry: Arc<TargetRegistry>,
    mailer: Arc<RecordingMailer>,
    // Held so the mock weather server outlives the test body.
    _weather_server: MockServer,
}

async fn build_test_app() -> TestApp {
    let weather_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("q", "Kyiv"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(FAKE_KYIV_WEATHER, "application/json"))
        .mount(&weather_server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("q", "Nowhere"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&weather_server)
        .await;

    let pool = db::create_pool("sqlite::memory:").await.expect("pool");
    let repository = Arc::new(SubscriberRepository::new(pool));
    let registry = Arc::new(TargetRegistry::new());
    let mailer = Arc::new(RecordingMailer::new());
    let metrics = Arc::new(AppMetrics::new().expect("metrics"));

    let context = Arc::new(ApiContext {
        repository,
        registry: Arc::clone(&registry),
        weather: Arc::new(WeatherApiClient::new(
            weather_server.uri(),
            "test-key".to_string(),
        )),
        mailer: mailer.clone(),
    });

    TestApp {
        router: api::router(context, metrics),
        registry,
        mailer,
        _weather_server: weather_server,
    }
}

async fn send(app: &TestApp, request: Request<Body>) -> axum::response::Response {
    app.router
        .clone()
        .oneshot(request)
        .await
        .expect("router should answer")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request should build")
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request should build")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("body should be UTF-8")
}

/// Subscribe `email` and return the confirmation token, extracted from
/// the recorded confirmation email.
async fn subscribe(app: &TestApp, email: &str, city: &str, frequency: &str) -> String {
    let response = send(
        app,
        post_json(
            "/api/subscribe",
            &json!({ "email": email, "city": city, "frequency": frequency }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let confirmation = app
        .mailer
        .sent()
        .into_iter()
        .rev()
        .find(|sent| sent.to == email)
        .expect("confirmation email should have been recorded");

    confirmation
        .body
        .split("token: ")
        .nth(1)
        .expect("body should carry the token")
        .trim()
        .to_string()
}

// ---- Health & metrics -------------------------------------------------------

#[tokio::test]
async fn health_returns_ok() {
    let app = build_test_app().await;

    let response = send(&app, get("/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn metrics_endpoint_renders_prometheus_text() {
    let app = build_test_app().await;

    // One request beforehand so the HTTP counters have something to show.
    send(&app, get("/health")).await;

    let response = send(&app, get("/metrics")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("weather_notifier_"));
}

// ---- Subscribe --------------------------------------------------------------

#[tokio::test]
async fn subscribe_creates_subscription_and_sends_token() {
    let app = build_test_app().await;

    let response = send(
        &app,
        post_json(
            "/api/subscribe",
            &json!({ "email": "a@x", "city": "Kyiv", "frequency": "daily" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "a@x");
    assert_eq!(sent[0].subject, "Your confirmation token");
    assert!(sent[0].body.contains("token: "));

    // Not confirmed yet: nothing registered for dispatch.
    assert!(app.registry.snapshot(Frequency::Daily).await.is_empty());
}

#[tokio::test]
async fn subscribe_rejects_unknown_frequency() {
    let app = build_test_app().await;

    let response = send(
        &app,
        post_json(
            "/api/subscribe",
            &json!({ "email": "a@x", "city": "Kyiv", "frequency": "weekly" }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn subscribe_twice_with_same_email_conflicts() {
    let app = build_test_app().await;
    subscribe(&app, "a@x", "Kyiv", "daily").await;

    let response = send(
        &app,
        post_json(
            "/api/subscribe",
            &json!({ "email": "a@x", "city": "Lviv", "frequency": "hourly" }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["error"], "email already subscribed");
}

// ---- Confirm ----------------------------------------------------------------

#[tokio::test]
async fn confirm_registers_the_subscriber_for_dispatch() {
    let app = build_test_app().await;
    let token = subscribe(&app, "a@x", "Kyiv", "daily").await;

    let response = send(&app, get(&format!("/api/confirm/{token}"))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let targets = app.registry.snapshot(Frequency::Daily).await;
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].email, "a@x");
    assert_eq!(targets[0].city, "Kyiv");

    // The other bucket is untouched.
    assert!(app.registry.snapshot(Frequency::Hourly).await.is_empty());
}

#[tokio::test]
async fn confirm_twice_registers_only_once() {
    let app = build_test_app().await;
    let token = subscribe(&app, "a@x", "Kyiv", "hourly").await;

    send(&app, get(&format!("/api/confirm/{token}"))).await;
    let response = send(&app, get(&format!("/api/confirm/{token}"))).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(app.registry.snapshot(Frequency::Hourly).await.len(), 1);
}

#[tokio::test]
async fn confirm_with_unknown_token_is_not_found() {
    let app = build_test_app().await;

    let response = send(&app, get("/api/confirm/bogus")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    for frequency in Frequency::ALL {
        assert!(app.registry.snapshot(frequency).await.is_empty());
    }
}

// ---- Unsubscribe ------------------------------------------------------------

#[tokio::test]
async fn unsubscribe_removes_the_dispatch_target() {
    let app = build_test_app().await;
    let token = subscribe(&app, "a@x", "Kyiv", "daily").await;
    send(&app, get(&format!("/api/confirm/{token}"))).await;
    assert_eq!(app.registry.snapshot(Frequency::Daily).await.len(), 1);

    let response = send(&app, get(&format!("/api/unsubscribe/{token}"))).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert!(app.registry.snapshot(Frequency::Daily).await.is_empty());
}

#[tokio::test]
async fn unsubscribe_with_unknown_token_is_not_found() {
    let app = build_test_app().await;

    let response = send(&app, get("/api/unsubscribe/bogus")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---- Weather ----------------------------------------------------------------

#[tokio::test]
async fn weather_endpoint_returns_current_conditions() {
    let app = build_test_app().await;

    let response = send(&app, get("/api/weather?city=Kyiv")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["temperature"], 21);
    assert_eq!(body["humidity"], 58);
    assert_eq!(body["description"], "Partly cloudy");
}

#[tokio::test]
async fn weather_endpoint_maps_unknown_city_to_not_found() {
    let app = build_test_app().await;

    let response = send(&app, get("/api/weather?city=Nowhere")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn weather_endpoint_requires_a_city() {
    let app = build_test_app().await;

    let response = send(&app, get("/api/weather")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
