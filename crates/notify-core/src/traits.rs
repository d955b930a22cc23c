//! Trait seams between the delivery core and its external collaborators.

use async_trait::async_trait;
use thiserror::Error;

use crate::event::DeliveryEvent;
use crate::subscriber::Subscriber;

/// Errors returned by a [`MessageTransport`].
///
/// The delivery worker treats every transport error as retryable, bounded by
/// the record's `max_attempts`.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be performed (connection refused, DNS, TLS...).
    #[error("send request failed: {0}")]
    Request(String),

    /// The gateway answered but refused the send.
    #[error("gateway rejected send ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    /// The send did not complete within the configured timeout.
    #[error("send timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// An opaque `send(phone, text)` capability: the WhatsApp-style gateway that
/// actually delivers message text to a phone number.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Deliver `body` to the canonical `phone`. Any error is retryable.
    async fn send(&self, phone: &str, body: &str) -> Result<(), TransportError>;

    /// Human-readable transport name, for logs.
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: MessageTransport + ?Sized> MessageTransport for std::sync::Arc<T> {
    async fn send(&self, phone: &str, body: &str) -> Result<(), TransportError> {
        (**self).send(phone, body).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Read-only access to subscription records, bucketed by due date.
///
/// The delivery core never writes through this trait.
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    /// Active subscribers whose due date is exactly `days` whole calendar
    /// days after `today` (`days = 0` means due today).
    async fn list_due_in_days(
        &self,
        today: chrono::NaiveDate,
        days: i64,
    ) -> Result<Vec<Subscriber>, Box<dyn std::error::Error + Send + Sync>>;

    /// Active subscribers whose due date is exactly `days` whole calendar
    /// days before `today`.
    async fn list_overdue_by_days(
        &self,
        today: chrono::NaiveDate,
        days: i64,
    ) -> Result<Vec<Subscriber>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Sink for delivery history events.
///
/// `record` must not block: implementations buffer internally (e.g. through a
/// channel drained by a background task) and drop events rather than stall
/// the delivery loop.
pub trait AuditSink: Send + Sync {
    /// Report a delivery transition. Fire-and-forget.
    fn record(&self, event: DeliveryEvent);
}
