//! HTTP API assembly.
//!
//! `router()` builds the complete application router; `main.rs` and the
//! integration tests use the same assembly. Handlers reach the
//! repository, the target registry, and the external collaborators
//! through [`ApiContext`].

pub mod health;
pub mod subscriptions;
pub mod weather;

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use crate::metrics::AppMetrics;
use crate::notifier::provider::{EmailSender, WeatherProvider};
use crate::repository::SubscriberRepository;
use crate::store::TargetRegistry;

/// Everything the API handlers need, shared across requests.
pub struct ApiContext {
    pub repository: Arc<SubscriberRepository>,
    pub registry: Arc<TargetRegistry>,
    pub weather: Arc<dyn WeatherProvider>,
    pub mailer: Arc<dyn EmailSender>,
}

/// Error tuple produced by all handlers: a status code plus a JSON body
/// of the shape `{"error": "..."}`.
pub type ApiError = (StatusCode, Json<serde_json::Value>);

pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(serde_json::json!({ "error": message.into() })),
    )
}

/// Build the full application router.
pub fn router(context: Arc<ApiContext>, metrics: Arc<AppMetrics>) -> Router {
    let api = Router::new()
        .route("/api/subscribe", post(subscriptions::subscribe))
        .route("/api/confirm/:token", get(subscriptions::confirm))
        .route("/api/unsubscribe/:token", get(subscriptions::unsubscribe))
        .route("/api/weather", get(weather::city_weather))
        .with_state(context);

    let observability = Router::new()
        .route("/metrics", get(render_metrics))
        .with_state(Arc::clone(&metrics));

    Router::new()
        .route("/health", get(health::health))
        .merge(api)
        .merge(observability)
        .layer(middleware::from_fn_with_state(metrics, track_http_metrics))
        .layer(CorsLayer::permissive())
}

/// `GET /metrics` — Prometheus text exposition.
async fn render_metrics(State(metrics): State<Arc<AppMetrics>>) -> Response {
    match metrics.render() {
        Ok(body) => (StatusCode::OK, body).into_response(),
        Err(err) => {
            tracing::error!("failed to render metrics: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Count and time every request. Uses the matched route template as the
/// path label to keep the cardinality bounded.
async fn track_http_metrics(
    State(metrics): State<Arc<AppMetrics>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    metrics
        .http_requests_total
        .with_label_values(&[method.as_str(), &path, &status])
        .inc();
    metrics
        .http_request_duration
        .observe(start.elapsed().as_secs_f64());

    response
}
