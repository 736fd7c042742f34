//! Database repository for subscriptions.
//!
//! All SQLite read/write logic lives here. The HTTP handlers call
//! [`SubscriberRepository::create`], [`SubscriberRepository::confirm`]
//! and [`SubscriberRepository::unsubscribe`];
//! [`SubscriberRepository::get_confirmed`] runs once at startup to seed
//! the in-memory `TargetRegistry` and is never polled again.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use thiserror::Error;

use crate::notifier::types::{Frequency, Subscriber};

/// Errors surfaced by subscription persistence.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("email already subscribed")]
    AlreadyExists,

    #[error("subscription not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A subscription awaiting insertion.
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub email: String,
    pub city: String,
    pub frequency: Frequency,
    pub token: String,
}

const SUBSCRIBER_COLUMNS: &str = "id, email, city, frequency, token, confirmed, subscribed";

/// Repository for reading and writing subscriptions.
pub struct SubscriberRepository {
    pool: SqlitePool,
}

impl SubscriberRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new unconfirmed subscription. A second subscription for
    /// the same email maps to [`RepositoryError::AlreadyExists`].
    pub async fn create(&self, new: &NewSubscription) -> Result<Subscriber, RepositoryError> {
        let query = format!(
            "INSERT INTO subscriptions (email, city, frequency, token, confirmed, subscribed)
             VALUES (?, ?, ?, ?, 0, 1)
             RETURNING {SUBSCRIBER_COLUMNS}"
        );

        let row = sqlx::query(&query)
            .bind(&new.email)
            .bind(&new.city)
            .bind(new.frequency.as_str())
            .bind(&new.token)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| match &err {
                sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                    RepositoryError::AlreadyExists
                }
                _ => RepositoryError::Database(err),
            })?;

        subscriber_from_row(&row)
    }

    /// Mark the subscription matching `token` as confirmed, returning the
    /// updated row.
    pub async fn confirm(&self, token: &str) -> Result<Subscriber, RepositoryError> {
        let query = format!(
            "UPDATE subscriptions SET confirmed = 1 WHERE token = ?
             RETURNING {SUBSCRIBER_COLUMNS}"
        );

        let row = sqlx::query(&query)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        subscriber_from_row(&row)
    }

    /// Withdraw the subscription matching `token`, returning the updated
    /// row. The row is kept (with its confirmation history) but excluded
    /// from dispatch loading.
    pub async fn unsubscribe(&self, token: &str) -> Result<Subscriber, RepositoryError> {
        let query = format!(
            "UPDATE subscriptions SET subscribed = 0 WHERE token = ?
             RETURNING {SUBSCRIBER_COLUMNS}"
        );

        let row = sqlx::query(&query)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        subscriber_from_row(&row)
    }

    /// All subscriptions eligible for dispatch: confirmed and not
    /// withdrawn.
    pub async fn get_confirmed(&self) -> Result<Vec<Subscriber>, RepositoryError> {
        let query = format!(
            "SELECT {SUBSCRIBER_COLUMNS} FROM subscriptions
             WHERE confirmed = 1 AND subscribed = 1"
        );

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(subscriber_from_row).collect()
    }
}

fn subscriber_from_row(row: &SqliteRow) -> Result<Subscriber, RepositoryError> {
    let frequency: String = row.try_get("frequency")?;
    let frequency = frequency
        .parse::<Frequency>()
        .map_err(|err| RepositoryError::Database(sqlx::Error::Decode(Box::new(err))))?;

    Ok(Subscriber {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        city: row.try_get("city")?,
        frequency,
        token: row.try_get("token")?,
        confirmed: row.try_get("confirmed")?,
        subscribed: row.try_get("subscribed")?,
    })
}
