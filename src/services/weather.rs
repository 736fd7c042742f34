//! HTTP client for the external weather API.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::notifier::error::WeatherError;
use crate::notifier::provider::WeatherProvider;
use crate::notifier::types::Weather;

/// Client for a `current.json`-style weather endpoint
/// (`GET {base_url}?key={api_key}&q={city}`).
#[derive(Clone)]
pub struct WeatherApiClient {
    base_url: String,
    api_key: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct WeatherApiResponse {
    current: CurrentConditions,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    temp_c: f32,
    humidity: i32,
    condition: Condition,
}

#[derive(Debug, Deserialize)]
struct Condition {
    text: String,
}

impl WeatherApiClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            base_url,
            api_key,
            http: Client::new(),
        }
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiClient {
    async fn get_city_weather(&self, city: &str) -> Result<Weather, WeatherError> {
        let response = self
            .http
            .get(&self.base_url)
            .query(&[("key", self.api_key.as_str()), ("q", city)])
            .send()
            .await
            .map_err(|err| WeatherError::Network {
                message: err.to_string(),
            })?;

        // The upstream answers 400 for unknown locations.
        if response.status() == StatusCode::BAD_REQUEST {
            return Err(WeatherError::CityNotFound {
                city: city.to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(WeatherError::Network {
                message: format!("weather API returned HTTP {}", response.status()),
            });
        }

        let decoded = response
            .json::<WeatherApiResponse>()
            .await
            .map_err(|err| WeatherError::Format {
                message: err.to_string(),
            })?;

        Ok(Weather {
            temperature: decoded.current.temp_c as i32,
            humidity: decoded.current.humidity,
            description: decoded.current.condition.text,
        })
    }
}
