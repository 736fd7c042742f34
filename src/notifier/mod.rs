//! Notification dispatch subsystem.
//!
//! Turns the current registry contents into delivered emails: forecast
//! resolution for a batch of targets and fire-and-forget delivery per
//! recipient. The scheduler in `crate::scheduler` drives these parts; the
//! target registry itself lives in `crate::store`.

pub mod dispatcher;
pub mod error;
pub mod forecast;
pub mod provider;
pub mod types;

pub use dispatcher::EmailDispatcher;
pub use error::{InvalidFrequency, MailError, WeatherError};
pub use forecast::ForecastFetcher;
pub use provider::{EmailSender, WeatherProvider};
pub use types::*;
