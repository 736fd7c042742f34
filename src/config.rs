use std::env;
use std::fmt;

/// Runtime configuration, read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub app_port: u16,
    pub database_url: String,
    pub weather: WeatherApiConfig,
    pub smtp: SmtpConfig,
}

#[derive(Debug, Clone)]
pub struct WeatherApiConfig {
    pub base_url: String,
    pub api_key: String,
}

/// SMTP relay credentials. Implements `Debug` manually to redact the
/// password.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let app_port = env_or("APP_PORT", "8080")
            .parse::<u16>()
            .map_err(|_| "APP_PORT must be a valid port number")?;

        let database_url = env_or("DATABASE_URL", "sqlite:weather.db");

        let weather = WeatherApiConfig {
            base_url: env_or(
                "WEATHER_API_URL",
                "http://api.weatherapi.com/v1/current.json",
            ),
            api_key: env::var("WEATHER_API_KEY").map_err(|_| "WEATHER_API_KEY is required")?,
        };

        let smtp = SmtpConfig {
            host: env::var("SMTP_HOST").map_err(|_| "SMTP_HOST is required")?,
            port: env_or("SMTP_PORT", "465")
                .parse::<u16>()
                .map_err(|_| "SMTP_PORT must be a valid port number")?,
            user: env::var("SMTP_USER").map_err(|_| "SMTP_USER is required")?,
            password: env::var("SMTP_PASS").map_err(|_| "SMTP_PASS is required")?,
        };

        Ok(Self {
            app_port,
            database_url,
            weather,
            smtp,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
