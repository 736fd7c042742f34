//! Collaborator interfaces for the notification dispatch subsystem.
//!
//! The core never talks to concrete weather or mail services directly:
//! the forecast fetcher, the dispatcher, and the HTTP handlers all go
//! through these traits, so tests can substitute scripted
//! implementations.

use async_trait::async_trait;

use super::error::{MailError, WeatherError};
use super::types::Weather;

/// A source of current weather data, keyed by city name.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Fetch the current weather for `city`.
    async fn get_city_weather(&self, city: &str) -> Result<Weather, WeatherError>;
}

/// An outbound mail transport.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver a single plain-text message.
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError>;
}
