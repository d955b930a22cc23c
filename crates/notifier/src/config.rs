//! Configuration for the delivery engine.

use std::env;
use std::time::Duration;

use chrono::NaiveTime;

use crate::error::NotifyError;
use crate::service::BusinessProfile;
use crate::worker::WorkerConfig;

/// Configuration for the delivery engine.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Maximum sends per rate window.
    pub rate_max_per_window: usize,

    /// Rate limiter window.
    pub rate_window: Duration,

    /// Base delay for retry backoff.
    pub retry_base: Duration,

    /// Ceiling on retry backoff.
    pub retry_max_backoff: Duration,

    /// Delivery attempts per notification.
    pub max_attempts: i64,

    /// Timeout for a single send.
    pub send_timeout: Duration,

    /// Sleep between polls when the queue is idle.
    pub idle_poll: Duration,

    /// Local time of the daily due-date scan.
    pub scan_time: NaiveTime,

    /// Business fields substituted into billing templates.
    pub business: BusinessProfile,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            rate_max_per_window: 30,
            rate_window: Duration::from_secs(60),
            retry_base: Duration::from_secs(30),
            retry_max_backoff: Duration::from_secs(300),
            max_attempts: 3,
            send_timeout: Duration::from_secs(15),
            idle_poll: Duration::from_secs(1),
            scan_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            business: BusinessProfile::default(),
        }
    }
}

impl NotifierConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `AVISA_RATE_MAX_PER_WINDOW` - Max sends per window (default: 30)
    /// - `AVISA_RATE_WINDOW_SECS` - Rate window in seconds (default: 60)
    /// - `AVISA_RETRY_BASE_SECS` - Retry backoff base in seconds (default: 30)
    /// - `AVISA_RETRY_MAX_BACKOFF_SECS` - Retry backoff ceiling in seconds (default: 300)
    /// - `AVISA_MAX_ATTEMPTS` - Delivery attempts per notification (default: 3)
    /// - `AVISA_SEND_TIMEOUT_SECS` - Per-send timeout in seconds (default: 15)
    /// - `AVISA_IDLE_POLL_SECS` - Idle poll interval in seconds (default: 1)
    /// - `AVISA_SCAN_TIME` - Daily scan time, `HH:MM` local (default: 09:00)
    /// - `AVISA_COMPANY` - Company name shown in templates (default: empty)
    /// - `AVISA_PIX_KEY` - PIX key shown in templates (default: empty)
    /// - `AVISA_CONTACT` - Support contact shown in templates (default: empty)
    pub fn from_env() -> Result<Self, NotifyError> {
        let defaults = Self::default();

        let scan_time = match env::var("AVISA_SCAN_TIME") {
            Ok(raw) => NaiveTime::parse_from_str(&raw, "%H:%M").map_err(|_| {
                NotifyError::Config(format!("AVISA_SCAN_TIME must be HH:MM, got {:?}", raw))
            })?,
            Err(_) => defaults.scan_time,
        };

        Ok(Self {
            rate_max_per_window: env_parse(
                "AVISA_RATE_MAX_PER_WINDOW",
                defaults.rate_max_per_window,
            ),
            rate_window: env_secs("AVISA_RATE_WINDOW_SECS", defaults.rate_window),
            retry_base: env_secs("AVISA_RETRY_BASE_SECS", defaults.retry_base),
            retry_max_backoff: env_secs(
                "AVISA_RETRY_MAX_BACKOFF_SECS",
                defaults.retry_max_backoff,
            ),
            max_attempts: env_parse("AVISA_MAX_ATTEMPTS", defaults.max_attempts),
            send_timeout: env_secs("AVISA_SEND_TIMEOUT_SECS", defaults.send_timeout),
            idle_poll: env_secs("AVISA_IDLE_POLL_SECS", defaults.idle_poll),
            scan_time,
            business: BusinessProfile {
                company: env::var("AVISA_COMPANY").unwrap_or_default(),
                pix_key: env::var("AVISA_PIX_KEY").unwrap_or_default(),
                contact: env::var("AVISA_CONTACT").unwrap_or_default(),
            },
        })
    }

    /// The worker slice of this configuration.
    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            send_timeout: self.send_timeout,
            idle_poll: self.idle_poll,
            retry_base: self.retry_base,
            retry_max_backoff: self.retry_max_backoff,
        }
    }
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> T {
    env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_secs(var: &str, default: Duration) -> Duration {
    env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = NotifierConfig::default();
        assert_eq!(config.rate_max_per_window, 30);
        assert_eq!(config.rate_window, Duration::from_secs(60));
        assert_eq!(config.retry_base, Duration::from_secs(30));
        assert_eq!(config.retry_max_backoff, Duration::from_secs(300));
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.send_timeout, Duration::from_secs(15));
        assert_eq!(config.idle_poll, Duration::from_secs(1));
        assert_eq!(config.scan_time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    }

    // Environment-based tests are combined into a single test to avoid
    // race conditions when tests run in parallel (env vars are process-global).
    #[test]
    fn from_env_scenarios() {
        use std::sync::Mutex;
        static ENV_LOCK: Mutex<()> = Mutex::new(());
        let _guard = ENV_LOCK.lock().unwrap();

        fn clear_all_avisa_vars() {
            for var in [
                "AVISA_RATE_MAX_PER_WINDOW",
                "AVISA_RATE_WINDOW_SECS",
                "AVISA_RETRY_BASE_SECS",
                "AVISA_RETRY_MAX_BACKOFF_SECS",
                "AVISA_MAX_ATTEMPTS",
                "AVISA_SEND_TIMEOUT_SECS",
                "AVISA_IDLE_POLL_SECS",
                "AVISA_SCAN_TIME",
                "AVISA_COMPANY",
                "AVISA_PIX_KEY",
                "AVISA_CONTACT",
            ] {
                std::env::remove_var(var);
            }
        }

        // Scenario 1: nothing set, defaults apply
        clear_all_avisa_vars();
        let config = NotifierConfig::from_env().unwrap();
        assert_eq!(config.rate_max_per_window, 30);
        assert_eq!(config.scan_time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert!(config.business.company.is_empty());

        // Scenario 2: everything set
        clear_all_avisa_vars();
        std::env::set_var("AVISA_RATE_MAX_PER_WINDOW", "10");
        std::env::set_var("AVISA_RATE_WINDOW_SECS", "30");
        std::env::set_var("AVISA_RETRY_BASE_SECS", "5");
        std::env::set_var("AVISA_RETRY_MAX_BACKOFF_SECS", "60");
        std::env::set_var("AVISA_MAX_ATTEMPTS", "5");
        std::env::set_var("AVISA_SEND_TIMEOUT_SECS", "10");
        std::env::set_var("AVISA_IDLE_POLL_SECS", "2");
        std::env::set_var("AVISA_SCAN_TIME", "07:30");
        std::env::set_var("AVISA_COMPANY", "Genial TV");
        std::env::set_var("AVISA_PIX_KEY", "chave-pix");
        std::env::set_var("AVISA_CONTACT", "(11) 4002-8922");

        let config = NotifierConfig::from_env().unwrap();
        assert_eq!(config.rate_max_per_window, 10);
        assert_eq!(config.rate_window, Duration::from_secs(30));
        assert_eq!(config.retry_base, Duration::from_secs(5));
        assert_eq!(config.retry_max_backoff, Duration::from_secs(60));
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.send_timeout, Duration::from_secs(10));
        assert_eq!(config.idle_poll, Duration::from_secs(2));
        assert_eq!(config.scan_time, NaiveTime::from_hms_opt(7, 30, 0).unwrap());
        assert_eq!(config.business.company, "Genial TV");

        let worker = config.worker_config();
        assert_eq!(worker.send_timeout, Duration::from_secs(10));
        assert_eq!(worker.retry_base, Duration::from_secs(5));

        // Scenario 3: malformed scan time errors out
        clear_all_avisa_vars();
        std::env::set_var("AVISA_SCAN_TIME", "morning");
        let result = NotifierConfig::from_env();
        assert!(matches!(result, Err(NotifyError::Config(_))));

        clear_all_avisa_vars();
    }
}
