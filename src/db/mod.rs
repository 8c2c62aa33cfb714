//! Persistence for rooms and markers.
//!
//! Every operation here is a single statement against the pool; callers get
//! typed rows back and never hold entities across requests.

pub mod markers;
pub mod rooms;

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    FromRow, SqlitePool,
};
use thiserror::Error;
use time::OffsetDateTime;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// A map session. `id` is chosen by the client and doubles as the share key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    pub title: String,
    pub default_location: String,
    pub zoom: i32,
    pub extra_fields_allowed: bool,
    #[sqlx(json)]
    pub predefined_fields: Vec<String>,
    #[sqlx(json)]
    pub mandatory_fields: Vec<String>,
    #[serde(with = "timestamp")]
    pub expires_on: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Marker {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    #[sqlx(json)]
    pub data: Map<String, Value>,
    pub room_id: String,
}

/// Axis-aligned lat/lng rectangle, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BBox {
    pub min_lat: f64,
    pub min_lng: f64,
    pub max_lat: f64,
    pub max_lng: f64,
}

/// RFC 3339 out; in, RFC 3339 or an ISO local time without offset, read as UTC.
mod timestamp {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{
        format_description::{well_known::Rfc3339, BorrowedFormatItem},
        macros::format_description,
        OffsetDateTime, PrimitiveDateTime,
    };

    const LOCAL_ISO: &[BorrowedFormatItem<'_>] = format_description!(
        "[year]-[month]-[day]T[hour]:[minute][optional [:[second][optional [.[subsecond]]]]]"
    );

    pub fn serialize<S: Serializer>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        time::serde::rfc3339::serialize(value, serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<OffsetDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse(raw: &str) -> Result<OffsetDateTime, String> {
        if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
            return Ok(value);
        }
        PrimitiveDateTime::parse(raw, LOCAL_ISO)
            .map(PrimitiveDateTime::assume_utc)
            .map_err(|_| format!("invalid timestamp {raw:?}, expected RFC 3339 or YYYY-MM-DDTHH:MM[:SS[.fff]]"))
    }

}

pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, DbError> {
    tracing::info!(max_connections, "connecting to database");
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let db_pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;
    Ok(db_pool)
}

pub async fn migrate(db_pool: &SqlitePool) -> Result<(), DbError> {
    tracing::info!("running database migrations");
    sqlx::migrate!("./migrations").run(db_pool).await?;
    Ok(())
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    // one connection: every `:memory:` connection is its own database
    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    migrate(&db_pool).await.unwrap();
    db_pool
}

#[cfg(test)]
pub(crate) fn sample_room(id: &str) -> Room {
    Room {
        id: id.to_owned(),
        title: "Tree survey".to_owned(),
        default_location: "52.52,13.405".to_owned(),
        zoom: 12,
        extra_fields_allowed: true,
        predefined_fields: vec!["species".to_owned(), "height".to_owned()],
        mandatory_fields: vec!["species".to_owned()],
        expires_on: time::macros::datetime!(2030-01-01 00:00 UTC),
    }
}
