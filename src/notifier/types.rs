//! Core data types for the notification dispatch subsystem.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::InvalidFrequency;

/// How often a subscriber receives weather updates. Partitions both the
/// target registry and the scheduler's background tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Hourly,
    Daily,
}

impl Frequency {
    /// Both frequency classes, in scheduling order.
    pub const ALL: [Frequency; 2] = [Frequency::Hourly, Frequency::Daily];

    /// Canonical string form, as stored in the database and accepted by
    /// the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Hourly => "hourly",
            Frequency::Daily => "daily",
        }
    }

    /// Fixed repeat period between dispatch cycles after the first
    /// boundary-aligned fire.
    pub fn period(&self) -> Duration {
        match self {
            Frequency::Hourly => Duration::from_secs(60 * 60),
            Frequency::Daily => Duration::from_secs(24 * 60 * 60),
        }
    }

    /// Subject prefix for notification emails of this class.
    pub fn subject_prefix(&self) -> &'static str {
        match self {
            Frequency::Hourly => "Hourly Weather",
            Frequency::Daily => "Daily Weather",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = InvalidFrequency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hourly" => Ok(Frequency::Hourly),
            "daily" => Ok(Frequency::Daily),
            other => Err(InvalidFrequency(other.to_string())),
        }
    }
}

/// A subscription as held by the dispatch subsystem. The database is the
/// system of record; the registry holds copies used only for targeting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: i64,
    pub email: String,
    pub city: String,
    pub frequency: Frequency,
    pub token: String,
    pub confirmed: bool,
    pub subscribed: bool,
}

/// Current weather for a single city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weather {
    pub temperature: i32,
    pub humidity: i32,
    pub description: String,
}

/// One notification to deliver: a recipient paired with the weather for
/// their city. Produced fresh each dispatch cycle, never persisted or
/// cached across cycles.
#[derive(Debug, Clone)]
pub struct Forecast {
    pub email: String,
    pub city: String,
    pub weather: Weather,
}
