//! The delivery worker: queue consumer and retry loop.

use std::sync::Arc;
use std::time::Duration;

use avisa_database::{queue, Database};
use chrono::Utc;
use notify_core::{
    AuditSink, DeliveryEvent, MessageTransport, NotificationRecord, NotificationStatus,
    TransportError,
};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::rate_limit::RateLimiter;

/// Default timeout for a single send.
const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(15);

/// Default sleep between polls when the queue has nothing eligible.
const DEFAULT_IDLE_POLL: Duration = Duration::from_secs(1);

/// Default base delay for the retry backoff.
const DEFAULT_RETRY_BASE: Duration = Duration::from_secs(30);

/// Default backoff ceiling.
const DEFAULT_RETRY_MAX_BACKOFF: Duration = Duration::from_secs(300);

/// Configuration for the delivery worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Timeout for a single transport send.
    pub send_timeout: Duration,

    /// Sleep between polls when no record is eligible.
    pub idle_poll: Duration,

    /// Base delay for retry backoff; doubles per failed attempt.
    pub retry_base: Duration,

    /// Ceiling on the retry backoff.
    pub retry_max_backoff: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            send_timeout: DEFAULT_SEND_TIMEOUT,
            idle_poll: DEFAULT_IDLE_POLL,
            retry_base: DEFAULT_RETRY_BASE,
            retry_max_backoff: DEFAULT_RETRY_MAX_BACKOFF,
        }
    }
}

/// Result of one delivery cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The send succeeded.
    Delivered { id: String, attempts: i64 },
    /// The send failed and the record was re-queued.
    Retrying {
        id: String,
        attempts: i64,
        delay: Duration,
    },
    /// The send failed and the attempt budget is spent.
    Failed { id: String, attempts: i64 },
}

/// Exponential retry delay: `base * 2^prior_attempts`, capped.
pub fn compute_backoff(base: Duration, cap: Duration, prior_attempts: u32) -> Duration {
    let factor = 1u32 << prior_attempts.min(16);
    base.saturating_mul(factor).min(cap)
}

/// Consumes the delivery queue: claims eligible records, pushes them through
/// the rate limiter and transport, and records the outcome.
pub struct DeliveryWorker<T: MessageTransport, A: AuditSink> {
    db: Database,
    transport: T,
    limiter: Arc<RateLimiter>,
    audit: A,
    config: WorkerConfig,
}

impl<T: MessageTransport, A: AuditSink> DeliveryWorker<T, A> {
    pub fn new(
        db: Database,
        transport: T,
        limiter: Arc<RateLimiter>,
        audit: A,
        config: WorkerConfig,
    ) -> Self {
        Self {
            db,
            transport,
            limiter,
            audit,
            config,
        }
    }

    /// Run one delivery cycle: claim the next eligible record and attempt to
    /// send it. Returns `None` when the queue has nothing eligible.
    pub async fn run_once(&self) -> Result<Option<DeliveryOutcome>> {
        // Capacity first, claim second: nothing sits in flight while the
        // window is exhausted, and a higher-priority record enqueued during
        // the wait is the one claimed when a slot opens.
        self.limiter.wait_until_available().await;

        let Some(rec) = queue::dequeue(self.db.pool()).await? else {
            return Ok(None);
        };

        // The slot is recorded only just before the actual send; idle polls
        // above never consume one.
        loop {
            if self.limiter.try_acquire().await {
                break;
            }
            self.limiter.wait_until_available().await;
        }

        let send = timeout(
            self.config.send_timeout,
            self.transport.send(&rec.phone, &rec.body),
        )
        .await;

        let outcome = match send {
            Ok(Ok(())) => {
                queue::mark_delivered(self.db.pool(), &rec.id).await?;
                let attempts = rec.attempts + 1;
                info!(
                    "Delivered {} to {} via {} (attempt {})",
                    rec.id,
                    rec.phone,
                    self.transport.name(),
                    attempts
                );
                self.audit.record(DeliveryEvent::new(
                    &rec.id,
                    &rec.phone,
                    rec.category,
                    NotificationStatus::Delivered,
                    attempts,
                    None,
                ));
                DeliveryOutcome::Delivered {
                    id: rec.id.clone(),
                    attempts,
                }
            }
            Ok(Err(e)) => self.handle_failure(&rec, e.to_string()).await?,
            Err(_) => {
                let e = TransportError::Timeout(self.config.send_timeout);
                self.handle_failure(&rec, e.to_string()).await?
            }
        };

        Ok(Some(outcome))
    }

    /// Failed send: either schedule a retry or give up for good.
    async fn handle_failure(
        &self,
        rec: &NotificationRecord,
        error: String,
    ) -> Result<DeliveryOutcome> {
        let attempts = rec.attempts + 1;

        if attempts >= rec.max_attempts {
            queue::mark_failed(self.db.pool(), &rec.id, &error).await?;
            warn!(
                "Giving up on {} to {} after {} attempt(s): {}",
                rec.id, rec.phone, attempts, error
            );
            self.audit.record(DeliveryEvent::new(
                &rec.id,
                &rec.phone,
                rec.category,
                NotificationStatus::Failed,
                attempts,
                Some(error),
            ));
            return Ok(DeliveryOutcome::Failed {
                id: rec.id.clone(),
                attempts,
            });
        }

        let delay = compute_backoff(
            self.config.retry_base,
            self.config.retry_max_backoff,
            rec.attempts as u32,
        );
        let eligible_at = Utc::now()
            + chrono::Duration::from_std(delay)
                .unwrap_or_else(|_| chrono::Duration::seconds(delay.as_secs() as i64));
        queue::requeue(self.db.pool(), &rec.id, eligible_at, &error).await?;
        warn!(
            "Send of {} to {} failed (attempt {}/{}), retrying in {:?}: {}",
            rec.id, rec.phone, attempts, rec.max_attempts, delay, error
        );
        self.audit.record(DeliveryEvent::new(
            &rec.id,
            &rec.phone,
            rec.category,
            NotificationStatus::Retrying,
            attempts,
            Some(error),
        ));
        Ok(DeliveryOutcome::Retrying {
            id: rec.id.clone(),
            attempts,
            delay,
        })
    }

    /// Run the worker with graceful shutdown support.
    ///
    /// Persistence errors are logged and the loop continues; the claimed
    /// record (if any) is recovered to Pending on the next restart.
    pub async fn run_with_shutdown<S>(self, shutdown_signal: S) -> Result<()>
    where
        S: std::future::Future<Output = ()> + Send,
    {
        info!(
            "Starting delivery worker (transport: {})",
            self.transport.name()
        );

        tokio::pin!(shutdown_signal);

        loop {
            tokio::select! {
                biased;

                () = &mut shutdown_signal => {
                    info!("Shutdown signal received, stopping delivery worker");
                    return Ok(());
                }

                result = self.run_once() => {
                    match result {
                        Ok(Some(outcome)) => {
                            debug!("Delivery cycle: {:?}", outcome);
                        }
                        Ok(None) => {
                            tokio::time::sleep(self.config.idle_poll).await;
                        }
                        Err(e) => {
                            warn!("Delivery cycle failed: {}", e);
                            tokio::time::sleep(self.config.idle_poll).await;
                        }
                    }
                }
            }
        }
    }
}
