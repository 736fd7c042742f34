use std::error::Error;
use std::fmt;

/// Unified application error.
///
/// This ensures all layers (config, database, startup)
/// fail in a predictable and debuggable way.
#[derive(Debug)]
pub enum AppError {
    Config(String),
    Database(String),
    Startup(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "Config error: {}", msg),
            AppError::Database(msg) => write!(f, "Database error: {}", msg),
            AppError::Startup(msg) => write!(f, "Startup error: {}", msg),
        }
    }
}

impl Error for AppError {}
