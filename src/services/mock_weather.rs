//! Scripted weather provider for tests.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::notifier::error::WeatherError;
use crate::notifier::provider::WeatherProvider;
use crate::notifier::types::Weather;

/// Test double returning canned weather per city. Cities without an
/// entry fail with `CityNotFound`, which is how tests script per-city
/// lookup failures.
#[derive(Debug, Default)]
pub struct MockWeatherClient {
    cities: HashMap<String, Weather>,
}

impl MockWeatherClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_city(mut self, city: &str, weather: Weather) -> Self {
        self.cities.insert(city.to_string(), weather);
        self
    }
}

#[async_trait]
impl WeatherProvider for MockWeatherClient {
    async fn get_city_weather(&self, city: &str) -> Result<Weather, WeatherError> {
        self.cities
            .get(city)
            .cloned()
            .ok_or_else(|| WeatherError::CityNotFound {
                city: city.to_string(),
            })
    }
}
