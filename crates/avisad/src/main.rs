//! Avisa delivery daemon.
//!
//! Connects the database, the Evolution API gateway, the delivery worker,
//! and the daily due-date scanner, then runs until Ctrl+C.

use std::env;
use std::sync::Arc;

use avisa_database::{queue, Database, SqliteSubscriberStore};
use notifier::audit::ChannelAudit;
use notifier::{
    DeliveryWorker, DueDateScanner, NotificationService, NotifierConfig, RateLimiter,
};
use templates::TemplateRenderer;
use tracing::info;
use whatsapp_gateway::{GatewayConfig, WhatsAppClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = NotifierConfig::from_env()?;

    let db_url =
        env::var("AVISA_DB_URL").unwrap_or_else(|_| "sqlite:avisa.db?mode=rwc".to_string());
    let db = Database::connect(&db_url).await?;
    db.migrate().await?;

    // Anything claimed when we last stopped goes back to pending.
    queue::recover_in_flight(db.pool()).await?;

    // Refuses to start when the WhatsApp instance is not connected.
    let gateway = WhatsAppClient::connect(GatewayConfig::from_env()?).await?;

    let limiter = Arc::new(RateLimiter::new(
        config.rate_max_per_window,
        config.rate_window,
    ));
    let service = NotificationService::new(
        db.clone(),
        TemplateRenderer::with_builtins(),
        config.business.clone(),
    )
    .with_max_attempts(config.max_attempts);

    let (audit, audit_writer) = ChannelAudit::spawn(db.clone());

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let scanner = DueDateScanner::new(SqliteSubscriberStore::new(db.pool().clone()), service);
    let scan_time = config.scan_time;
    let mut scanner_rx = shutdown_rx.clone();
    let scanner_task = tokio::spawn(async move {
        scanner
            .run_daily(scan_time, async move {
                let _ = scanner_rx.changed().await;
            })
            .await
    });

    let worker = DeliveryWorker::new(db.clone(), gateway, limiter, audit, config.worker_config());
    let mut worker_rx = shutdown_rx;
    let worker_task = tokio::spawn(async move {
        worker
            .run_with_shutdown(async move {
                let _ = worker_rx.changed().await;
            })
            .await
    });

    info!("Avisa daemon running (scan at {}, db: {})", scan_time, db_url);
    tokio::signal::ctrl_c().await?;
    info!("Ctrl+C received, shutting down");

    let _ = shutdown_tx.send(true);
    worker_task.await??;
    scanner_task.await??;

    // Dropping the worker closed the audit channel; the writer drains what
    // is left before exiting.
    audit_writer.await?;
    db.close().await;

    Ok(())
}
