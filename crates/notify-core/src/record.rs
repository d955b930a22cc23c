//! The notification record and its state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Default ceiling on delivery attempts per record.
pub const DEFAULT_MAX_ATTEMPTS: i64 = 3;

/// The kind of notification being sent. Determines template selection and
/// default queue priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    /// Plan expires in exactly 2 days.
    DueIn2Days,
    /// Plan expires tomorrow.
    DueIn1Day,
    /// Plan expires today.
    DueToday,
    /// Plan expired yesterday.
    Overdue1Day,
    /// Plan was renewed.
    Renewal,
    /// New subscriber greeting.
    Welcome,
    /// Payment/billing reminder outside the due-date buckets.
    Billing,
    /// Promotional broadcast.
    Promotional,
    /// Operator-provided free-form message.
    Custom,
}

impl NotificationCategory {
    /// All categories, in template-table order.
    pub const ALL: [NotificationCategory; 9] = [
        NotificationCategory::DueIn2Days,
        NotificationCategory::DueIn1Day,
        NotificationCategory::DueToday,
        NotificationCategory::Overdue1Day,
        NotificationCategory::Renewal,
        NotificationCategory::Welcome,
        NotificationCategory::Billing,
        NotificationCategory::Promotional,
        NotificationCategory::Custom,
    ];

    /// Stable string form used in the database and in audit events.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::DueIn2Days => "due_in_2_days",
            NotificationCategory::DueIn1Day => "due_in_1_day",
            NotificationCategory::DueToday => "due_today",
            NotificationCategory::Overdue1Day => "overdue_1_day",
            NotificationCategory::Renewal => "renewal",
            NotificationCategory::Welcome => "welcome",
            NotificationCategory::Billing => "billing",
            NotificationCategory::Promotional => "promotional",
            NotificationCategory::Custom => "custom",
        }
    }

    /// Default queue priority: overdue and due-today send first.
    pub fn default_priority(&self) -> i64 {
        match self {
            NotificationCategory::Overdue1Day | NotificationCategory::DueToday => 3,
            NotificationCategory::DueIn1Day | NotificationCategory::Billing => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "due_in_2_days" => Ok(NotificationCategory::DueIn2Days),
            "due_in_1_day" => Ok(NotificationCategory::DueIn1Day),
            "due_today" => Ok(NotificationCategory::DueToday),
            "overdue_1_day" => Ok(NotificationCategory::Overdue1Day),
            "renewal" => Ok(NotificationCategory::Renewal),
            "welcome" => Ok(NotificationCategory::Welcome),
            "billing" => Ok(NotificationCategory::Billing),
            "promotional" => Ok(NotificationCategory::Promotional),
            "custom" => Ok(NotificationCategory::Custom),
            other => Err(format!("unknown notification category: {}", other)),
        }
    }
}

/// Delivery status of a queued notification.
///
/// ```text
/// Pending --dequeue--> InFlight --success--> Delivered (terminal)
/// InFlight --failure, attempts < max--> Retrying --scheduled_for elapses--> (eligible again)
/// InFlight --failure, attempts >= max--> Failed (terminal)
/// (restart) InFlight --> Pending
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Pending,
    InFlight,
    Delivered,
    Retrying,
    Failed,
}

impl NotificationStatus {
    /// Stable string form used in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Pending => "pending",
            NotificationStatus::InFlight => "in_flight",
            NotificationStatus::Delivered => "delivered",
            NotificationStatus::Retrying => "retrying",
            NotificationStatus::Failed => "failed",
        }
    }

    /// Whether no further transitions may leave this status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            NotificationStatus::Delivered | NotificationStatus::Failed
        )
    }
}

impl fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(NotificationStatus::Pending),
            "in_flight" => Ok(NotificationStatus::InFlight),
            "delivered" => Ok(NotificationStatus::Delivered),
            "retrying" => Ok(NotificationStatus::Retrying),
            "failed" => Ok(NotificationStatus::Failed),
            other => Err(format!("unknown notification status: {}", other)),
        }
    }
}

/// A single outbound notification: the unit of work in the delivery queue.
///
/// The body is fully rendered at enqueue time so that later template edits
/// never mutate in-flight messages, and the subscriber name is denormalized
/// so the queue survives subscriber edits and deletes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Opaque unique identifier, assigned at creation.
    pub id: String,
    /// Canonical transport-ready phone (`55` + national number).
    pub phone: String,
    /// Display name captured at enqueue time.
    pub subscriber_name: String,
    /// Notification category.
    pub category: NotificationCategory,
    /// Fully rendered message text.
    pub body: String,
    /// Higher sends first.
    pub priority: i64,
    /// Delivery attempts made so far.
    pub attempts: i64,
    /// Ceiling on attempts.
    pub max_attempts: i64,
    /// Current delivery status.
    pub status: NotificationStatus,
    /// Earliest time the record becomes eligible for (another) attempt.
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Last failure reason, if any.
    pub last_error: Option<String>,
    /// Scanner idempotency key; `None` for manual enqueues.
    pub dedupe_key: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Set when the record reaches Delivered.
    pub delivered_at: Option<DateTime<Utc>>,
}

impl NotificationRecord {
    /// Create a fresh Pending record with a generated id and the category's
    /// default priority. `phone` must already be normalized.
    pub fn new(
        phone: impl Into<String>,
        subscriber_name: impl Into<String>,
        category: NotificationCategory,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            phone: phone.into(),
            subscriber_name: subscriber_name.into(),
            category,
            body: body.into(),
            priority: category.default_priority(),
            attempts: 0,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            status: NotificationStatus::Pending,
            scheduled_for: None,
            last_error: None,
            dedupe_key: None,
            created_at: Utc::now(),
            delivered_at: None,
        }
    }

    /// Attach a scanner idempotency key.
    pub fn with_dedupe_key(mut self, key: impl Into<String>) -> Self {
        self.dedupe_key = Some(key.into());
        self
    }

    /// Override the default priority.
    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }
}
