//! Subscription lifecycle endpoints.
//!
//! Routes:
//! - `POST /api/subscribe`            — create a subscription, email the token
//! - `GET  /api/confirm/:token`       — confirm and register for dispatch
//! - `GET  /api/unsubscribe/:token`   — withdraw and deregister
//!
//! The registry mutation happens synchronously in the handler, after the
//! store transaction commits; a subscriber confirmed mid-cycle is picked
//! up no later than the next cycle.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{error_response, ApiContext, ApiError};
use crate::notifier::error::InvalidFrequency;
use crate::notifier::types::Frequency;
use crate::repository::{NewSubscription, RepositoryError};

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub email: String,
    pub city: String,
    pub frequency: String,
}

/// `POST /api/subscribe` — create an unconfirmed subscription and email
/// the confirmation token to the subscriber.
pub async fn subscribe(
    State(context): State<Arc<ApiContext>>,
    Json(body): Json<SubscribeRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let frequency: Frequency = body.frequency.parse().map_err(|err: InvalidFrequency| {
        error_response(StatusCode::BAD_REQUEST, err.to_string())
    })?;

    let new = NewSubscription {
        email: body.email,
        city: body.city,
        frequency,
        token: generate_token(),
    };

    let subscription = context.repository.create(&new).await.map_err(|err| match err {
        RepositoryError::AlreadyExists => {
            error_response(StatusCode::CONFLICT, "email already subscribed")
        }
        other => {
            tracing::error!("failed to create subscription: {}", other);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to create subscription",
            )
        }
    })?;

    let confirmation = format!(
        "Hello,\n\nConfirm your weather subscription with this token: {}\n",
        subscription.token
    );
    if let Err(err) = context
        .mailer
        .send_email(&subscription.email, "Your confirmation token", &confirmation)
        .await
    {
        tracing::error!("confirmation email to {} failed: {}", subscription.email, err);
        return Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "failed to send confirmation email",
        ));
    }

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "subscription created, confirmation email sent" })),
    ))
}

/// `GET /api/confirm/:token` — mark the subscription confirmed and add
/// it to the dispatch registry.
pub async fn confirm(
    State(context): State<Arc<ApiContext>>,
    Path(token): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let subscription = context.repository.confirm(&token).await.map_err(|err| match err {
        RepositoryError::NotFound => {
            error_response(StatusCode::NOT_FOUND, "unknown confirmation token")
        }
        other => {
            tracing::error!("failed to confirm subscription: {}", other);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to confirm subscription",
            )
        }
    })?;

    context.registry.add(subscription).await;

    Ok(Json(json!({ "message": "subscription confirmed" })))
}

/// `GET /api/unsubscribe/:token` — withdraw the subscription and remove
/// it from the dispatch registry.
pub async fn unsubscribe(
    State(context): State<Arc<ApiContext>>,
    Path(token): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let subscription = context
        .repository
        .unsubscribe(&token)
        .await
        .map_err(|err| match err {
            RepositoryError::NotFound => {
                error_response(StatusCode::NOT_FOUND, "unknown subscription token")
            }
            other => {
                tracing::error!("failed to cancel subscription: {}", other);
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "failed to cancel subscription",
                )
            }
        })?;

    context
        .registry
        .remove(&subscription.email, subscription.frequency)
        .await;

    Ok(Json(json!({ "message": "unsubscribed" })))
}

/// Random 32-character alphanumeric confirmation token.
fn generate_token() -> String {
    use rand::distributions::Alphanumeric;
    use rand::Rng;

    rand::thread_rng()
        .sample_iter(Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}
