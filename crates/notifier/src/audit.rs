//! Audit sink implementations.
//!
//! The delivery worker reports transitions through [`notify_core::AuditSink`]
//! without ever blocking on the report. [`ChannelAudit`] is the production
//! sink: events go through an unbounded channel to a background task that
//! writes the delivery log.

use avisa_database::{delivery_log, Database};
use notify_core::{AuditSink, DeliveryEvent};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Audit sink that persists events to the `delivery_log` table.
#[derive(Clone)]
pub struct ChannelAudit {
    tx: mpsc::UnboundedSender<DeliveryEvent>,
}

impl ChannelAudit {
    /// Spawn the background writer. The task drains remaining events and
    /// exits once every [`ChannelAudit`] handle is dropped.
    pub fn spawn(db: Database) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<DeliveryEvent>();
        let handle = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Err(e) = delivery_log::insert(db.pool(), &event).await {
                    warn!("Failed to write delivery log entry: {}", e);
                }
            }
        });
        (Self { tx }, handle)
    }
}

impl AuditSink for ChannelAudit {
    fn record(&self, event: DeliveryEvent) {
        if self.tx.send(event).is_err() {
            warn!("Delivery log writer is gone, dropping audit event");
        }
    }
}

/// Audit sink that only emits tracing events.
#[derive(Debug, Clone, Default)]
pub struct TracingAudit;

impl AuditSink for TracingAudit {
    fn record(&self, event: DeliveryEvent) {
        info!(
            "Delivery event: {} -> {} (attempts: {})",
            event.record_id, event.status, event.attempts
        );
    }
}

/// Audit sink that discards everything.
#[derive(Debug, Clone, Default)]
pub struct NullAudit;

impl AuditSink for NullAudit {
    fn record(&self, _event: DeliveryEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify_core::{NotificationCategory, NotificationStatus};

    #[tokio::test]
    async fn channel_audit_persists_events() {
        let db = Database::connect_with_pool_size("sqlite::memory:", 1)
            .await
            .unwrap();
        db.migrate().await.unwrap();

        let (audit, writer) = ChannelAudit::spawn(db.clone());
        audit.record(DeliveryEvent::new(
            "rec-1",
            "5511999998888",
            NotificationCategory::DueToday,
            NotificationStatus::Delivered,
            1,
            None,
        ));
        audit.record(DeliveryEvent::new(
            "rec-2",
            "5511999997777",
            NotificationCategory::Billing,
            NotificationStatus::Failed,
            3,
            Some("gateway 500".to_string()),
        ));

        // Closing the channel lets the writer drain and exit.
        drop(audit);
        writer.await.unwrap();

        let rows = delivery_log::list_recent(db.pool(), 10).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].record_id, "rec-2");
        assert_eq!(rows[1].record_id, "rec-1");
    }
}
