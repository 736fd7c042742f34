//! Forecast resolution for a batch of dispatch targets.

use std::sync::Arc;

use super::provider::WeatherProvider;
use super::types::{Forecast, Subscriber};

/// Resolves current weather for each subscriber in a batch.
///
/// A failed lookup drops that subscriber from the output and never aborts
/// the rest of the batch; the failure is logged, not retried. The fetcher
/// holds no mutable state of its own: its output is a function of the
/// input batch and the external weather state.
#[derive(Clone)]
pub struct ForecastFetcher {
    weather: Arc<dyn WeatherProvider>,
}

impl ForecastFetcher {
    pub fn new(weather: Arc<dyn WeatherProvider>) -> Self {
        Self { weather }
    }

    /// Produce one [`Forecast`] per subscriber whose city resolves.
    /// Output length is at most `subscribers.len()`; each surviving input
    /// appears exactly once.
    pub async fn resolve(&self, subscribers: &[Subscriber]) -> Vec<Forecast> {
        let mut forecasts = Vec::with_capacity(subscribers.len());

        for subscriber in subscribers {
            match self.weather.get_city_weather(&subscriber.city).await {
                Ok(weather) => forecasts.push(Forecast {
                    email: subscriber.email.clone(),
                    city: subscriber.city.clone(),
                    weather,
                }),
                Err(err) => {
                    tracing::warn!(
                        "weather fetch failed for {:?} ({}): {}",
                        subscriber.city,
                        subscriber.email,
                        err
                    );
                }
            }
        }

        forecasts
    }
}
