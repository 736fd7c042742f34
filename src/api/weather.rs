//! Current weather endpoint.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::{error_response, ApiContext, ApiError};
use crate::notifier::error::WeatherError;
use crate::notifier::types::Weather;

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub city: Option<String>,
}

/// `GET /api/weather?city=…` — current weather for a city, straight from
/// the upstream provider.
pub async fn city_weather(
    State(context): State<Arc<ApiContext>>,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<Weather>, ApiError> {
    let city = query
        .city
        .filter(|city| !city.is_empty())
        .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "missing city parameter"))?;

    match context.weather.get_city_weather(&city).await {
        Ok(weather) => Ok(Json(weather)),
        Err(WeatherError::CityNotFound { city }) => Err(error_response(
            StatusCode::NOT_FOUND,
            format!("city not found: {city}"),
        )),
        Err(err) => {
            tracing::error!("weather lookup failed for {:?}: {}", city, err);
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "weather lookup failed",
            ))
        }
    }
}
