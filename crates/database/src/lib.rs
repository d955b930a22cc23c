//! SQLite persistence layer for Avisa.
//!
//! This crate provides async database operations for the notification
//! delivery queue, subscriber due-date lookups, and the delivery audit log,
//! using SQLx with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{queue, Database};
//! use notify_core::{NotificationCategory, NotificationRecord};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:avisa.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Re-queue anything that was in flight when we last stopped
//!     queue::recover_in_flight(db.pool()).await?;
//!
//!     let rec = NotificationRecord::new(
//!         "5511999998888",
//!         "Carlos",
//!         NotificationCategory::DueToday,
//!         "Seu plano vence hoje!",
//!     );
//!     queue::enqueue(db.pool(), &rec).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod delivery_log;
pub mod error;
pub mod models;
pub mod queue;
pub mod subscriber;

pub use error::{DatabaseError, Result};
pub use queue::QueueStats;
pub use subscriber::SqliteSubscriberStore;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    /// Sized for one delivery worker plus the scanner and the audit writer.
    const DEFAULT_POOL_SIZE: u32 = 10;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/avisa.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let db = database::Database::connect("sqlite::memory:").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!("Connected to database: {} (pool size: {})", url, pool_size);

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
