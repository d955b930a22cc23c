//! Delivery history, written by the audit sink.
//!
//! Append-only: one row per delivery transition. Nothing in the delivery
//! path reads this table; it exists for operators.

use notify_core::DeliveryEvent;
use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::{format_timestamp, DeliveryLogRow};

/// Append a delivery event.
pub async fn insert(pool: &SqlitePool, event: &DeliveryEvent) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO delivery_log (record_id, phone, category, status, attempts, error, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&event.record_id)
    .bind(&event.phone)
    .bind(event.category.as_str())
    .bind(event.status.as_str())
    .bind(event.attempts)
    .bind(&event.error)
    .bind(format_timestamp(event.timestamp))
    .execute(pool)
    .await?;

    Ok(())
}

/// The most recent `limit` events, newest first.
pub async fn list_recent(pool: &SqlitePool, limit: i64) -> Result<Vec<DeliveryLogRow>> {
    let rows = sqlx::query_as::<_, DeliveryLogRow>(
        r#"
        SELECT id, record_id, phone, category, status, attempts, error, created_at
        FROM delivery_log
        ORDER BY id DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Every event recorded for one notification, oldest first.
pub async fn list_for_record(pool: &SqlitePool, record_id: &str) -> Result<Vec<DeliveryLogRow>> {
    let rows = sqlx::query_as::<_, DeliveryLogRow>(
        r#"
        SELECT id, record_id, phone, category, status, attempts, error, created_at
        FROM delivery_log
        WHERE record_id = ?
        ORDER BY id ASC
        "#,
    )
    .bind(record_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use notify_core::{NotificationCategory, NotificationStatus};

    async fn test_db() -> Database {
        let db = Database::connect_with_pool_size("sqlite::memory:", 1)
            .await
            .unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn events_append_and_read_back() {
        let db = test_db().await;
        let delivered = DeliveryEvent::new(
            "rec-1",
            "5511999998888",
            NotificationCategory::DueToday,
            NotificationStatus::Delivered,
            1,
            None,
        );
        let failed = DeliveryEvent::new(
            "rec-2",
            "5511999997777",
            NotificationCategory::Overdue1Day,
            NotificationStatus::Failed,
            3,
            Some("gateway 500".to_string()),
        );
        insert(db.pool(), &delivered).await.unwrap();
        insert(db.pool(), &failed).await.unwrap();

        let recent = list_recent(db.pool(), 10).await.unwrap();
        assert_eq!(recent.len(), 2);
        // Newest first.
        assert_eq!(recent[0].record_id, "rec-2");
        assert_eq!(recent[0].status, "failed");
        assert_eq!(recent[0].error.as_deref(), Some("gateway 500"));
        assert_eq!(recent[1].record_id, "rec-1");
        assert_eq!(recent[1].status, "delivered");
    }

    #[tokio::test]
    async fn list_for_record_filters_and_orders() {
        let db = test_db().await;
        for status in [NotificationStatus::Retrying, NotificationStatus::Failed] {
            let event = DeliveryEvent::new(
                "rec-1",
                "5511999998888",
                NotificationCategory::Billing,
                status,
                1,
                Some("timeout".to_string()),
            );
            insert(db.pool(), &event).await.unwrap();
        }
        let other = DeliveryEvent::new(
            "rec-2",
            "5511999997777",
            NotificationCategory::Billing,
            NotificationStatus::Delivered,
            1,
            None,
        );
        insert(db.pool(), &other).await.unwrap();

        let events = list_for_record(db.pool(), "rec-1").await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].status, "retrying");
        assert_eq!(events[1].status, "failed");
    }
}
