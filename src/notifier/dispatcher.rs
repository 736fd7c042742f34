//! Email rendering and fire-and-forget delivery.

use std::sync::Arc;

use chrono::Local;

use super::provider::EmailSender;
use super::types::{Forecast, Frequency};

/// Renders and dispatches notification emails, one concurrent send per
/// recipient.
///
/// Every record in a batch is dispatched immediately as its own task, so
/// a slow or stuck recipient never delays the others. Outcomes are only
/// logged; nothing is returned to the caller and nothing is retried.
#[derive(Clone)]
pub struct EmailDispatcher {
    sender: Arc<dyn EmailSender>,
}

impl EmailDispatcher {
    pub fn new(sender: Arc<dyn EmailSender>) -> Self {
        Self { sender }
    }

    /// Issue one independent delivery per forecast.
    pub fn dispatch(&self, forecasts: Vec<Forecast>, frequency: Frequency) {
        for forecast in forecasts {
            let sender = Arc::clone(&self.sender);
            let subject = render_subject(frequency, &forecast.city);
            let body = render_body(&forecast);

            tokio::spawn(async move {
                if let Err(err) = sender.send_email(&forecast.email, &subject, &body).await {
                    tracing::error!("{} email to {} failed: {}", frequency, forecast.email, err);
                }
            });
        }
    }
}

fn render_subject(frequency: Frequency, city: &str) -> String {
    let now = Local::now();
    let date = match frequency {
        Frequency::Hourly => now.format("%Y-%m-%d %H:%M").to_string(),
        Frequency::Daily => now.format("%Y-%m-%d").to_string(),
    };
    format!("{} for {} – {}", frequency.subject_prefix(), city, date)
}

fn render_body(forecast: &Forecast) -> String {
    format!(
        "Hello {},\n\nCurrent weather in {}:\n- {}\n- Temperature: {}°C\n- Humidity: {}%\n",
        forecast.email,
        forecast.city,
        forecast.weather.description,
        forecast.weather.temperature,
        forecast.weather.humidity,
    )
}
