//! The durable delivery queue.
//!
//! One row per outbound notification. The queue is the single source of
//! truth for delivery state; all transitions here are single SQL statements,
//! so they are atomic with respect to each other and the at-most-one
//! in-flight owner invariant holds across concurrent consumers.
//!
//! A record in `retrying` does not change rows when its timer elapses - it
//! simply becomes eligible for [`dequeue`] again once `scheduled_for` is in
//! the past.

use chrono::{DateTime, Utc};
use notify_core::{NotificationRecord, NotificationStatus};
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{format_timestamp, NotificationRow};

/// Insert a new Pending record.
///
/// The caller is responsible for normalizing the phone first; the queue
/// stores whatever it is given. A duplicate `dedupe_key` means the scanner
/// already enqueued this notification today and maps to `AlreadyExists`.
pub async fn enqueue(pool: &SqlitePool, rec: &NotificationRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO notifications (
            id, phone, subscriber_name, category, body, priority,
            attempts, max_attempts, status, scheduled_for, last_error,
            dedupe_key, created_at, delivered_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&rec.id)
    .bind(&rec.phone)
    .bind(&rec.subscriber_name)
    .bind(rec.category.as_str())
    .bind(&rec.body)
    .bind(rec.priority)
    .bind(rec.attempts)
    .bind(rec.max_attempts)
    .bind(rec.status.as_str())
    .bind(rec.scheduled_for.map(format_timestamp))
    .bind(&rec.last_error)
    .bind(&rec.dedupe_key)
    .bind(format_timestamp(rec.created_at))
    .bind(rec.delivered_at.map(format_timestamp))
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Notification",
                    id: rec
                        .dedupe_key
                        .clone()
                        .unwrap_or_else(|| rec.id.clone()),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}

/// Atomically claim the next eligible record.
///
/// Eligible means status Pending or Retrying with `scheduled_for` unset or
/// in the past. The highest-priority, earliest-created record is flipped to
/// InFlight and returned in one statement, so no two consumers can claim
/// the same row. Returns `None` when nothing is eligible.
pub async fn dequeue(pool: &SqlitePool) -> Result<Option<NotificationRecord>> {
    let now = format_timestamp(Utc::now());

    let row = sqlx::query_as::<_, NotificationRow>(
        r#"
        UPDATE notifications
        SET status = 'in_flight'
        WHERE id = (
            SELECT id FROM notifications
            WHERE status IN ('pending', 'retrying')
              AND (scheduled_for IS NULL OR scheduled_for <= ?)
            ORDER BY priority DESC, created_at ASC
            LIMIT 1
        )
        RETURNING id, phone, subscriber_name, category, body, priority,
                  attempts, max_attempts, status, scheduled_for, last_error,
                  dedupe_key, created_at, delivered_at
        "#,
    )
    .bind(&now)
    .fetch_optional(pool)
    .await?;

    row.map(NotificationRow::into_record).transpose()
}

/// Fetch a record by id.
pub async fn get(pool: &SqlitePool, id: &str) -> Result<NotificationRecord> {
    let row = sqlx::query_as::<_, NotificationRow>(
        r#"
        SELECT id, phone, subscriber_name, category, body, priority,
               attempts, max_attempts, status, scheduled_for, last_error,
               dedupe_key, created_at, delivered_at
        FROM notifications
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Notification",
        id: id.to_string(),
    })?;

    row.into_record()
}

/// Terminal success: InFlight -> Delivered. Counts the attempt that
/// succeeded.
pub async fn mark_delivered(pool: &SqlitePool, id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE notifications
        SET status = 'delivered', delivered_at = ?, last_error = NULL,
            attempts = attempts + 1
        WHERE id = ? AND status = 'in_flight'
        "#,
    )
    .bind(format_timestamp(Utc::now()))
    .bind(id)
    .execute(pool)
    .await?;

    guard_transition(pool, id, result.rows_affected()).await
}

/// Terminal failure: InFlight -> Failed, recording the last error and the
/// attempt that exhausted the budget.
pub async fn mark_failed(pool: &SqlitePool, id: &str, error: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE notifications
        SET status = 'failed', last_error = ?, attempts = attempts + 1
        WHERE id = ? AND status = 'in_flight'
        "#,
    )
    .bind(error)
    .bind(id)
    .execute(pool)
    .await?;

    guard_transition(pool, id, result.rows_affected()).await
}

/// Retry path: InFlight -> Retrying with one more attempt on the counter and
/// a future `scheduled_for`.
pub async fn requeue(
    pool: &SqlitePool,
    id: &str,
    scheduled_for: DateTime<Utc>,
    error: &str,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE notifications
        SET status = 'retrying', attempts = attempts + 1,
            scheduled_for = ?, last_error = ?
        WHERE id = ? AND status = 'in_flight'
        "#,
    )
    .bind(format_timestamp(scheduled_for))
    .bind(error)
    .bind(id)
    .execute(pool)
    .await?;

    guard_transition(pool, id, result.rows_affected()).await
}

/// Restart recovery: any InFlight record is returned to Pending.
///
/// "In flight" means no durable confirmation exists, so after a crash the
/// send may or may not have happened; re-queueing accepts at most one
/// duplicate send rather than silently losing work. Returns the number of
/// recovered records.
pub async fn recover_in_flight(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE notifications
        SET status = 'pending', scheduled_for = NULL
        WHERE status = 'in_flight'
        "#,
    )
    .execute(pool)
    .await?;

    let recovered = result.rows_affected();
    if recovered > 0 {
        tracing::warn!("Recovered {} in-flight notification(s) to pending", recovered);
    }
    Ok(recovered)
}

/// Per-status record counts, for operator reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub pending: i64,
    pub in_flight: i64,
    pub retrying: i64,
    pub delivered: i64,
    pub failed: i64,
}

/// Count records per status.
pub async fn stats(pool: &SqlitePool) -> Result<QueueStats> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT status, COUNT(*) FROM notifications GROUP BY status
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut stats = QueueStats::default();
    for (status, count) in rows {
        match status.parse::<NotificationStatus>() {
            Ok(NotificationStatus::Pending) => stats.pending = count,
            Ok(NotificationStatus::InFlight) => stats.in_flight = count,
            Ok(NotificationStatus::Retrying) => stats.retrying = count,
            Ok(NotificationStatus::Delivered) => stats.delivered = count,
            Ok(NotificationStatus::Failed) => stats.failed = count,
            Err(detail) => {
                return Err(DatabaseError::Corrupt {
                    table: "notifications",
                    detail,
                })
            }
        }
    }
    Ok(stats)
}

/// Delete terminal records, keeping everything still deliverable.
/// Returns the number of purged rows.
pub async fn purge_terminal(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM notifications WHERE status IN ('delivered', 'failed')
        "#,
    )
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Explain a guarded UPDATE that touched nothing: the row is missing,
/// already terminal, or was simply never claimed.
async fn guard_transition(pool: &SqlitePool, id: &str, rows_affected: u64) -> Result<()> {
    if rows_affected > 0 {
        return Ok(());
    }
    let status = sqlx::query_scalar::<_, String>("SELECT status FROM notifications WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    match status {
        None => Err(DatabaseError::NotFound {
            entity: "Notification",
            id: id.to_string(),
        }),
        Some(status) => match status.parse::<NotificationStatus>() {
            Ok(parsed) if parsed.is_terminal() => {
                Err(DatabaseError::Terminal { id: id.to_string() })
            }
            Ok(_) => Err(DatabaseError::NotInFlight {
                id: id.to_string(),
                status,
            }),
            Err(detail) => Err(DatabaseError::Corrupt {
                table: "notifications",
                detail,
            }),
        },
    }
}
