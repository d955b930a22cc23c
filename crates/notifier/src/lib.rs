//! Notification delivery engine for Avisa.
//!
//! Ties the pieces together: the enqueue API ([`NotificationService`]),
//! the queue consumer ([`DeliveryWorker`]) with its sliding-window
//! [`RateLimiter`] and bounded retry, and the daily [`DueDateScanner`]
//! that turns subscriber due dates into queued notifications.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use avisa_database::Database;
//! use notifier::{
//!     BusinessProfile, DeliveryWorker, NotificationService, NotifierConfig, RateLimiter,
//! };
//! use notifier::audit::TracingAudit;
//! use templates::TemplateRenderer;
//! use whatsapp_gateway::{GatewayConfig, WhatsAppClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = NotifierConfig::from_env()?;
//! let db = Database::connect("sqlite:avisa.db?mode=rwc").await?;
//! db.migrate().await?;
//!
//! let transport = WhatsAppClient::connect(GatewayConfig::from_env()?).await?;
//! let limiter = Arc::new(RateLimiter::new(
//!     config.rate_max_per_window,
//!     config.rate_window,
//! ));
//!
//! let worker = DeliveryWorker::new(
//!     db.clone(),
//!     transport,
//!     limiter,
//!     TracingAudit,
//!     config.worker_config(),
//! );
//! worker
//!     .run_with_shutdown(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod audit;
pub mod config;
pub mod error;
pub mod rate_limit;
pub mod scanner;
pub mod service;
pub mod worker;

pub use config::NotifierConfig;
pub use error::{NotifyError, Result};
pub use rate_limit::RateLimiter;
pub use scanner::{DueDateScanner, ScanSummary};
pub use service::{BusinessProfile, NotificationService};
pub use worker::{compute_backoff, DeliveryOutcome, DeliveryWorker, WorkerConfig};
