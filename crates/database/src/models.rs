//! Row types and timestamp conventions.
//!
//! Timestamps are stored as UTC RFC3339 TEXT with microsecond precision
//! (`2026-08-24T09:00:00.000000Z`), a fixed-width form that compares
//! correctly as a string in SQL. Calendar dates are stored as `YYYY-MM-DD`.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use notify_core::{NotificationRecord, Subscriber};
use sqlx::FromRow;

use crate::error::DatabaseError;

/// Format a timestamp for storage.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp.
pub fn parse_timestamp(table: &'static str, s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::Corrupt {
            table,
            detail: format!("bad timestamp {:?}: {}", s, e),
        })
}

/// Format a calendar date for storage.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// A `notifications` row as stored. Converted to [`NotificationRecord`]
/// via [`NotificationRow::into_record`].
#[derive(Debug, Clone, FromRow)]
pub struct NotificationRow {
    pub id: String,
    pub phone: String,
    pub subscriber_name: String,
    pub category: String,
    pub body: String,
    pub priority: i64,
    pub attempts: i64,
    pub max_attempts: i64,
    pub status: String,
    pub scheduled_for: Option<String>,
    pub last_error: Option<String>,
    pub dedupe_key: Option<String>,
    pub created_at: String,
    pub delivered_at: Option<String>,
}

impl NotificationRow {
    /// Decode the stored row into the domain type.
    pub fn into_record(self) -> Result<NotificationRecord, DatabaseError> {
        let corrupt = |detail: String| DatabaseError::Corrupt {
            table: "notifications",
            detail,
        };

        let category = self.category.parse().map_err(corrupt)?;
        let status = self.status.parse().map_err(corrupt)?;
        let scheduled_for = self
            .scheduled_for
            .as_deref()
            .map(|s| parse_timestamp("notifications", s))
            .transpose()?;
        let delivered_at = self
            .delivered_at
            .as_deref()
            .map(|s| parse_timestamp("notifications", s))
            .transpose()?;
        let created_at = parse_timestamp("notifications", &self.created_at)?;

        Ok(NotificationRecord {
            id: self.id,
            phone: self.phone,
            subscriber_name: self.subscriber_name,
            category,
            body: self.body,
            priority: self.priority,
            attempts: self.attempts,
            max_attempts: self.max_attempts,
            status,
            scheduled_for,
            last_error: self.last_error,
            dedupe_key: self.dedupe_key,
            created_at,
            delivered_at,
        })
    }
}

/// A `subscribers` row as stored.
#[derive(Debug, Clone, FromRow)]
pub struct SubscriberRow {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub package: String,
    pub price: f64,
    pub server: String,
    pub due_date: String,
    pub active: i64,
}

impl SubscriberRow {
    /// Decode the stored row into the domain type.
    pub fn into_subscriber(self) -> Result<Subscriber, DatabaseError> {
        let due_date =
            NaiveDate::parse_from_str(&self.due_date, "%Y-%m-%d").map_err(|e| {
                DatabaseError::Corrupt {
                    table: "subscribers",
                    detail: format!("bad due_date {:?}: {}", self.due_date, e),
                }
            })?;
        Ok(Subscriber {
            id: self.id,
            name: self.name,
            phone: self.phone,
            package: self.package,
            price: self.price,
            server: self.server,
            due_date,
            active: self.active != 0,
        })
    }
}

/// A `delivery_log` row.
#[derive(Debug, Clone, FromRow)]
pub struct DeliveryLogRow {
    pub id: i64,
    pub record_id: String,
    pub phone: String,
    pub category: String,
    pub status: String,
    pub attempts: i64,
    pub error: Option<String>,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_are_fixed_width_and_ordered() {
        let a = Utc.with_ymd_and_hms(2026, 8, 24, 9, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2026, 8, 24, 9, 0, 1).unwrap();
        let (sa, sb) = (format_timestamp(a), format_timestamp(b));
        assert_eq!(sa, "2026-08-24T09:00:00.000000Z");
        assert!(sa < sb, "string order must match time order");
    }

    #[test]
    fn timestamps_round_trip() {
        let now = Utc::now();
        let parsed = parse_timestamp("notifications", &format_timestamp(now)).unwrap();
        // Micros precision: compare at the stored resolution.
        assert_eq!(format_timestamp(now), format_timestamp(parsed));
    }

    #[test]
    fn bad_timestamp_is_corrupt() {
        assert!(matches!(
            parse_timestamp("notifications", "yesterday"),
            Err(DatabaseError::Corrupt { .. })
        ));
    }
}
