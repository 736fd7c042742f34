//! Error types for the notification dispatch subsystem.

use thiserror::Error;

/// Errors from weather lookups.
#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("city not found: {city}")]
    CityNotFound { city: String },

    #[error("weather request failed: {message}")]
    Network { message: String },

    #[error("malformed weather response: {message}")]
    Format { message: String },
}

/// Errors from building or delivering an email.
#[derive(Error, Debug)]
pub enum MailError {
    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    #[error("failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// A frequency string that is neither `hourly` nor `daily`.
#[derive(Error, Debug)]
#[error("invalid frequency '{0}', expected 'hourly' or 'daily'")]
pub struct InvalidFrequency(pub String);
