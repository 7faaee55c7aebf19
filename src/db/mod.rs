pub mod courses;
pub mod enrollments;
pub mod events;
pub mod grades;
pub mod libraries;
pub mod profiles;

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use uuid::Uuid;

use crate::error::AppError;

pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, AppError> {
    let options = SqliteConnectOptions::from_str(database_url)?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;
    Ok(pool)
}

pub async fn migrate(db: &SqlitePool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations").run(db).await?;
    Ok(())
}

/// A migrated single-connection in-memory database.
///
/// One connection only: every SQLite `:memory:` connection is its own database.
pub async fn connect_in_memory() -> Result<SqlitePool, AppError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    migrate(&pool).await?;
    Ok(pool)
}

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current time in the fixed-width UTC form every stored timestamp uses,
/// so that string order equals time order.
pub fn now() -> String {
    format_timestamp(Utc::now())
}

/// Parses any RFC 3339 timestamp into the stored UTC form.
pub fn normalize_timestamp(value: &str) -> Result<String, AppError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| format_timestamp(dt.with_timezone(&Utc)))
        .map_err(|e| AppError::BadRequest(format!("invalid timestamp {:?}: {}", value, e)))
}
