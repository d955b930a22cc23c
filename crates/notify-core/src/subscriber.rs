//! Subscriber model, as read from the subscriber store.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A billing subscriber with a fixed-term plan and a due date.
///
/// Owned by the subscriber store; the delivery core only reads these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscriber {
    /// Auto-incrementing store id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Canonical phone (`55` + national number). Unique per subscriber.
    pub phone: String,
    /// Billing package label (e.g. "1 mês", "3 meses").
    pub package: String,
    /// Monthly plan price in BRL.
    pub price: f64,
    /// Server/product label.
    pub server: String,
    /// Calendar date the current billing period ends. No time component.
    pub due_date: NaiveDate,
    /// Inactive subscribers are excluded from due-date scans.
    pub active: bool,
}
