//! Client configuration.

use std::time::Duration;

/// Default number of conflict retries for `update`.
pub const DEFAULT_UPDATE_RETRIES: u32 = 6;

/// Default subscription poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default name of the global data store.
pub const DEFAULT_GLOBAL_STORE_NAME: &str = "__global__";

/// Default routing hint handed to remote stores.
pub const DEFAULT_TABLE_NAME: &str = "datastore_entries";

/// Page size used when a listing does not request one.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Largest page size a listing may request; larger requests are clamped.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Configuration for a [`crate::DataStoreClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Table the remote store routes entries to. Opaque to the core.
    pub table_name: String,
    /// How often subscriptions re-fetch their entries.
    pub on_update_poll_interval: Duration,
    /// How many times `update` retries after a version conflict.
    pub update_retries: u32,
    /// Store name bound by `get_global_data_store`.
    pub global_data_store_name: String,
    /// Page size used when a listing does not request one.
    pub default_page_size: u32,
    /// Delay schedule between conflict retries.
    pub backoff: BackoffConfig,
}

impl ClientConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            on_update_poll_interval: DEFAULT_POLL_INTERVAL,
            update_retries: DEFAULT_UPDATE_RETRIES,
            global_data_store_name: DEFAULT_GLOBAL_STORE_NAME.to_string(),
            default_page_size: DEFAULT_PAGE_SIZE,
            backoff: BackoffConfig::default(),
        }
    }

    /// Sets the table name.
    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    /// Sets the subscription poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.on_update_poll_interval = interval;
        self
    }

    /// Sets the number of conflict retries.
    pub fn with_update_retries(mut self, retries: u32) -> Self {
        self.update_retries = retries;
        self
    }

    /// Sets the global data store name.
    pub fn with_global_data_store_name(mut self, name: impl Into<String>) -> Self {
        self.global_data_store_name = name.into();
        self
    }

    /// Sets the default page size.
    pub fn with_default_page_size(mut self, page_size: u32) -> Self {
        self.default_page_size = page_size;
        self
    }

    /// Sets the retry backoff.
    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    /// Total attempts `update` makes before giving up.
    pub fn max_update_attempts(&self) -> u32 {
        self.update_retries.saturating_add(1)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Exponential backoff between `update` conflict retries.
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Multiplier applied per retry.
    pub backoff_multiplier: f64,
    /// Whether to add up to 25% jitter.
    pub add_jitter: bool,
}

impl BackoffConfig {
    /// Creates a backoff starting at `initial_delay`.
    pub fn new(initial_delay: Duration) -> Self {
        Self {
            initial_delay,
            max_delay: Duration::from_secs(2),
            backoff_multiplier: 2.0,
            add_jitter: true,
        }
    }

    /// Retries immediately.
    pub fn none() -> Self {
        Self {
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            add_jitter: false,
        }
    }

    /// Sets the maximum delay.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier.
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Enables or disables jitter.
    pub fn with_jitter(mut self, add_jitter: bool) -> Self {
        self.add_jitter = add_jitter;
        self
    }

    /// Calculates the delay before a given attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let base_delay = self.initial_delay.as_secs_f64()
            * self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);

        let delay_secs = base_delay.min(self.max_delay.as_secs_f64());

        if self.add_jitter {
            let jitter = delay_secs * 0.25 * rand_jitter();
            Duration::from_secs_f64(delay_secs + jitter)
        } else {
            Duration::from_secs_f64(delay_secs)
        }
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self::new(Duration::from_millis(25))
    }
}

/// Cheap jitter in `[0, 1)` derived from the clock's sub-second nanos.
fn rand_jitter() -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    (nanos % 1000) as f64 / 1000.0
}
