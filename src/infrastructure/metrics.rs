use super::http::{Metric, RestClient};
use crate::types::METRICS_SERVICE_TAG;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Request figures accumulated since the buffer was created.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceSummary {
    pub generation_count: u64,
    pub requests: u64,
    pub errors: u64,
    pub avg_response_time: Option<Duration>,
}

impl PerformanceSummary {
    /// Failed share of timed requests, `0.0` before the first one.
    pub fn error_rate(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.errors as f64 / self.requests as f64
        }
    }
}

#[derive(Default)]
struct Counters {
    generation_count: u64,
    requests: u64,
    errors: u64,
    total_response_time: Duration,
}

/// In-memory metric buffer, flushed in batches to the backend.
///
/// A flush happens as soon as `batch_size` samples are buffered, and on every
/// tick of [`spawn_periodic_flush`](Self::spawn_periodic_flush), which also
/// records a performance summary first. A failed upload is logged and the
/// batch is discarded.
pub struct MetricsBuffer {
    rest: Arc<RestClient>,
    batch_size: usize,
    environment: String,
    buffer: Mutex<Vec<Metric>>,
    counters: Mutex<Counters>,
}

impl MetricsBuffer {
    pub fn new(rest: Arc<RestClient>, batch_size: usize, environment: impl Into<String>) -> Self {
        Self {
            rest,
            batch_size: batch_size.max(1),
            environment: environment.into(),
            buffer: Mutex::new(Vec::new()),
            counters: Mutex::new(Counters::default()),
        }
    }

    /// Buffers a sample; flushes if the batch is full.
    pub async fn record(
        &self,
        name: impl Into<String>,
        value: impl Into<String>,
        tags: impl IntoIterator<Item = (String, String)>,
    ) {
        let mut all_tags = BTreeMap::from([
            ("service".to_string(), METRICS_SERVICE_TAG.to_string()),
            ("environment".to_string(), self.environment.clone()),
        ]);
        all_tags.extend(tags);

        let metric = Metric {
            name: name.into(),
            value: value.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            tags: all_tags,
        };

        let full = {
            let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
            buffer.push(metric);
            buffer.len() >= self.batch_size
        };

        if full {
            self.flush().await;
        }
    }

    /// Uploads whatever is buffered. Returns the number of samples sent.
    pub async fn flush(&self) -> usize {
        let batch = std::mem::take(&mut *self.buffer.lock().unwrap_or_else(PoisonError::into_inner));
        if batch.is_empty() {
            return 0;
        }

        match self.rest.post_metrics(&batch).await {
            Ok(()) => {
                tracing::debug!("Flushed {} metrics", batch.len());
                batch.len()
            }
            Err(e) => {
                tracing::warn!("Failed to store metrics: {}", e);
                0
            }
        }
    }

    pub fn track_generation(&self) {
        self.counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .generation_count += 1;
    }

    /// Counts one timed backend request.
    pub fn track_request(&self, elapsed: Duration, ok: bool) {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        counters.requests += 1;
        counters.total_response_time += elapsed;
        if !ok {
            counters.errors += 1;
        }
    }

    pub fn performance(&self) -> PerformanceSummary {
        let counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        let avg_response_time = u32::try_from(counters.requests)
            .ok()
            .filter(|requests| *requests > 0)
            .map(|requests| counters.total_response_time / requests);
        PerformanceSummary {
            generation_count: counters.generation_count,
            requests: counters.requests,
            errors: counters.errors,
            avg_response_time,
        }
    }

    /// Buffers the current performance summary as metric samples. Does
    /// nothing before the first generation or request.
    pub async fn record_performance(&self) {
        let summary = self.performance();
        if summary.generation_count == 0 && summary.requests == 0 {
            return;
        }
        tracing::info!(
            generations = summary.generation_count,
            requests = summary.requests,
            error_rate = summary.error_rate(),
            "Performance metrics"
        );

        self.record(
            "generation_count",
            summary.generation_count.to_string(),
            std::iter::empty(),
        )
        .await;
        self.record("error_rate", summary.error_rate().to_string(), std::iter::empty())
            .await;
        if let Some(avg) = summary.avg_response_time {
            self.record(
                "avg_response_time_ms",
                avg.as_millis().to_string(),
                std::iter::empty(),
            )
            .await;
        }
    }

    pub fn pending(&self) -> usize {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn spawn_periodic_flush(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let metrics = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // First tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(metrics) = metrics.upgrade() else {
                    break;
                };
                metrics.record_performance().await;
                metrics.flush().await;
            }
            tracing::debug!("Metrics flush task finished");
        })
    }
}
