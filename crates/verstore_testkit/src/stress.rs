//! Concurrency stress helpers.
//!
//! These drive many tasks against one store to exercise the conflict
//! retry path under contention.

use std::time::{Duration, Instant};
use tracing::debug;
use verstore_core::{CoreError, DataStore};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Operations that gave up after exhausting their retries.
    pub exhausted_ops: usize,
    /// Operations that failed for any other reason.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
}

impl StressTestResult {
    /// Operations per second.
    pub fn ops_per_second(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.total_ops as f64 / secs
        } else {
            0.0
        }
    }
}

/// Configuration for stress runs.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of concurrent tasks.
    pub tasks: usize,
    /// Increments issued by each task.
    pub increments_per_task: usize,
    /// Key every task increments.
    pub key: String,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            tasks: 8,
            increments_per_task: 25,
            key: "counter".to_string(),
        }
    }
}

/// Runs concurrent `increment(key, 1)` calls from `config.tasks` tasks.
///
/// With enough retries every increment lands, so the counter ends at
/// `successful_ops`.
pub async fn stress_concurrent_increments(store: &DataStore, config: &StressConfig) -> StressTestResult {
    let start = Instant::now();

    let handles: Vec<_> = (0..config.tasks)
        .map(|_| {
            let store = store.clone();
            let key = config.key.clone();
            let count = config.increments_per_task;
            tokio::spawn(async move {
                let mut outcomes = Vec::with_capacity(count);
                for _ in 0..count {
                    outcomes.push(store.increment(&key, 1).await);
                    tokio::task::yield_now().await;
                }
                outcomes
            })
        })
        .collect();

    let mut successful = 0;
    let mut exhausted = 0;
    let mut failed = 0;
    for handle in handles {
        for outcome in handle.await.expect("stress task panicked") {
            match outcome {
                Ok(_) => successful += 1,
                Err(CoreError::ConcurrencyExhausted { .. }) => exhausted += 1,
                Err(_) => failed += 1,
            }
        }
    }

    let result = StressTestResult {
        total_ops: successful + exhausted + failed,
        successful_ops: successful,
        exhausted_ops: exhausted,
        failed_ops: failed,
        duration: start.elapsed(),
    };
    debug!(
        tasks = config.tasks,
        total = result.total_ops,
        exhausted = result.exhausted_ops,
        ops_per_second = result.ops_per_second(),
        "stress run finished"
    );
    result
}
