use clap::Parser;

/// Weather notifier CLI arguments
#[derive(Debug, Parser)]
#[command(
    name = "weather-notifier",
    version,
    about = "Periodic weather updates by email for subscribed cities"
)]
pub struct Cli {
    /// HTTP listen port
    #[arg(long)]
    pub port: Option<u16>,

    /// Database URL (SQLite)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Weather API base URL
    #[arg(long)]
    pub weather_url: Option<String>,
}
