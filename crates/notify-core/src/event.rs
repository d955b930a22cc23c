//! Audit events emitted on delivery transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{NotificationCategory, NotificationStatus};

/// A delivery outcome reported to the audit sink.
///
/// Emitted fire-and-forget by the delivery worker on every transition so
/// operators can see delivery history without the worker ever blocking on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryEvent {
    /// Id of the notification record.
    pub record_id: String,
    /// Canonical phone the message was addressed to.
    pub phone: String,
    /// Notification category.
    pub category: NotificationCategory,
    /// Status the record transitioned to.
    pub status: NotificationStatus,
    /// Attempts made when the event was emitted.
    pub attempts: i64,
    /// Failure reason, if the transition was a failure.
    pub error: Option<String>,
    /// When the transition happened.
    pub timestamp: DateTime<Utc>,
}

impl DeliveryEvent {
    /// Build an event for a record that just reached `status`.
    pub fn new(
        record_id: impl Into<String>,
        phone: impl Into<String>,
        category: NotificationCategory,
        status: NotificationStatus,
        attempts: i64,
        error: Option<String>,
    ) -> Self {
        Self {
            record_id: record_id.into(),
            phone: phone.into(),
            category,
            status,
            attempts,
            error,
            timestamp: Utc::now(),
        }
    }
}
