//! Daily due-date scanner.
//!
//! Once a day the scanner walks four due-date buckets (due in 2 days, due
//! tomorrow, due today, expired yesterday) and enqueues the matching
//! notification for every active subscriber in each. Re-running a scan for
//! the same day is harmless: each enqueue carries a dedupe key of the form
//! `<category>:<subscriber-id>:<scan-date>`.

use std::time::Duration;

use avisa_database::DatabaseError;
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use notify_core::{NotificationCategory, Subscriber, SubscriberStore};
use tracing::{debug, error, info, warn};

use crate::error::{NotifyError, Result};
use crate::service::NotificationService;

/// Scan buckets: day offset from today, and the category to enqueue.
const BUCKETS: [(i64, NotificationCategory); 4] = [
    (2, NotificationCategory::DueIn2Days),
    (1, NotificationCategory::DueIn1Day),
    (0, NotificationCategory::DueToday),
    (-1, NotificationCategory::Overdue1Day),
];

/// Counts from one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Notifications enqueued.
    pub enqueued: usize,
    /// Skipped: already enqueued for this day (dedupe key hit).
    pub duplicates: usize,
    /// Skipped: subscriber phone could not be normalized.
    pub invalid_phones: usize,
}

/// Walks subscriber due-date buckets and feeds the delivery queue.
pub struct DueDateScanner<S: SubscriberStore> {
    store: S,
    service: NotificationService,
}

impl<S: SubscriberStore> DueDateScanner<S> {
    pub fn new(store: S, service: NotificationService) -> Self {
        Self { store, service }
    }

    /// Scan every bucket for `today` and enqueue what's due.
    ///
    /// A subscriber with an invalid phone is skipped with a warning rather
    /// than failing the whole scan.
    pub async fn scan(&self, today: NaiveDate) -> Result<ScanSummary> {
        let mut summary = ScanSummary::default();

        for (offset, category) in BUCKETS {
            let subscribers = self.bucket(today, offset).await?;
            for subscriber in subscribers {
                let key = format!(
                    "{}:{}:{}",
                    category.as_str(),
                    subscriber.id,
                    today.format("%Y-%m-%d")
                );
                match self
                    .service
                    .enqueue_for_subscriber(&subscriber, category, Some(key))
                    .await
                {
                    Ok(rec) => {
                        debug!(
                            "Scan enqueued {} for subscriber {} ({})",
                            rec.id, subscriber.id, category
                        );
                        summary.enqueued += 1;
                    }
                    Err(NotifyError::Database(DatabaseError::AlreadyExists { .. })) => {
                        debug!(
                            "Subscriber {} already notified for {} today",
                            subscriber.id, category
                        );
                        summary.duplicates += 1;
                    }
                    Err(NotifyError::InvalidPhone(raw)) => {
                        warn!(
                            "Skipping subscriber {} ({}): invalid phone {:?}",
                            subscriber.id, subscriber.name, raw
                        );
                        summary.invalid_phones += 1;
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        info!(
            "Due-date scan for {}: {} enqueued, {} duplicate(s), {} invalid phone(s)",
            today, summary.enqueued, summary.duplicates, summary.invalid_phones
        );
        Ok(summary)
    }

    async fn bucket(&self, today: NaiveDate, offset: i64) -> Result<Vec<Subscriber>> {
        let result = if offset >= 0 {
            self.store.list_due_in_days(today, offset).await
        } else {
            self.store.list_overdue_by_days(today, -offset).await
        };
        result.map_err(|e| NotifyError::Store(e.to_string()))
    }

    /// Run one scan every day at `scan_time` (local time) until the
    /// shutdown signal fires. Scan failures are logged and the next day's
    /// scan still happens.
    pub async fn run_daily<F>(self, scan_time: NaiveTime, shutdown_signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send,
    {
        info!("Starting due-date scanner (daily at {})", scan_time);

        tokio::pin!(shutdown_signal);

        loop {
            let delay = delay_until_next(Local::now().naive_local(), scan_time);
            debug!("Next due-date scan in {:?}", delay);

            tokio::select! {
                biased;

                () = &mut shutdown_signal => {
                    info!("Shutdown signal received, stopping due-date scanner");
                    return Ok(());
                }

                () = tokio::time::sleep(delay) => {
                    let today = Local::now().date_naive();
                    if let Err(e) = self.scan(today).await {
                        error!("Due-date scan for {} failed: {}", today, e);
                    }
                }
            }
        }
    }
}

/// Time until the next daily occurrence of `scan_time` after `now`.
fn delay_until_next(now: NaiveDateTime, scan_time: NaiveTime) -> Duration {
    let today_run = now.date().and_time(scan_time);
    let next = if today_run > now {
        today_run
    } else {
        today_run + chrono::Duration::days(1)
    };
    (next - now).to_std().unwrap_or(Duration::ZERO)
}
