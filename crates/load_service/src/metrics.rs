//! Request counters and Prometheus text rendering

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Counters shared by every handler
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    // Request metrics
    pub total_requests: Arc<AtomicU64>,
    pub successful_requests: Arc<AtomicU64>,
    pub failed_requests: Arc<AtomicU64>,
    pub request_duration_ms: Arc<AtomicU64>,

    // Route metrics
    pub predict_requests: Arc<AtomicU64>,
    pub products_predicted: Arc<AtomicU64>,
    pub metadata_requests: Arc<AtomicU64>,
    pub health_requests: Arc<AtomicU64>,

    start_time: Instant,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            total_requests: Arc::new(AtomicU64::new(0)),
            successful_requests: Arc::new(AtomicU64::new(0)),
            failed_requests: Arc::new(AtomicU64::new(0)),
            request_duration_ms: Arc::new(AtomicU64::new(0)),
            predict_requests: Arc::new(AtomicU64::new(0)),
            products_predicted: Arc::new(AtomicU64::new(0)),
            metadata_requests: Arc::new(AtomicU64::new(0)),
            health_requests: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    /// Record a finished request
    pub fn record_request(&self, success: bool, duration_ms: u64) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
        self.request_duration_ms
            .fetch_add(duration_ms, Ordering::Relaxed);
    }

    pub fn record_predict(&self, products: usize) {
        self.predict_requests.fetch_add(1, Ordering::Relaxed);
        self.products_predicted
            .fetch_add(products as u64, Ordering::Relaxed);
    }

    pub fn record_metadata(&self) {
        self.metadata_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_health(&self) {
        self.health_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn get_snapshot(&self) -> MetricsSnapshot {
        let total_requests = self.total_requests.load(Ordering::Relaxed);
        let successful_requests = self.successful_requests.load(Ordering::Relaxed);
        let failed_requests = self.failed_requests.load(Ordering::Relaxed);
        let request_duration_ms = self.request_duration_ms.load(Ordering::Relaxed);

        let success_rate = if total_requests > 0 {
            successful_requests as f64 / total_requests as f64
        } else {
            0.0
        };

        let avg_duration_ms = if total_requests > 0 {
            request_duration_ms as f64 / total_requests as f64
        } else {
            0.0
        };

        MetricsSnapshot {
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            uptime_seconds: self.uptime_seconds(),
            total_requests,
            successful_requests,
            failed_requests,
            success_rate,
            avg_duration_ms,
            predict_requests: self.predict_requests.load(Ordering::Relaxed),
            products_predicted: self.products_predicted.load(Ordering::Relaxed),
            metadata_requests: self.metadata_requests.load(Ordering::Relaxed),
            health_requests: self.health_requests.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: u64,
    pub uptime_seconds: u64,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub success_rate: f64,
    pub avg_duration_ms: f64,
    pub predict_requests: u64,
    pub products_predicted: u64,
    pub metadata_requests: u64,
    pub health_requests: u64,
}

impl MetricsSnapshot {
    /// Prometheus text exposition format
    pub fn render_prometheus(&self) -> String {
        let mut out = String::new();
        let counters = [
            ("loadcast_requests_total", "Total HTTP requests", self.total_requests),
            (
                "loadcast_requests_successful_total",
                "Requests answered with a non-error status",
                self.successful_requests,
            ),
            (
                "loadcast_requests_failed_total",
                "Requests answered with an error status",
                self.failed_requests,
            ),
            (
                "loadcast_predict_requests_total",
                "Prediction requests",
                self.predict_requests,
            ),
            (
                "loadcast_products_predicted_total",
                "Products scored across all prediction requests",
                self.products_predicted,
            ),
            (
                "loadcast_metadata_requests_total",
                "Metadata requests",
                self.metadata_requests,
            ),
            (
                "loadcast_health_requests_total",
                "Health check requests",
                self.health_requests,
            ),
        ];
        for (name, help, value) in counters {
            let _ = writeln!(out, "# HELP {name} {help}");
            let _ = writeln!(out, "# TYPE {name} counter");
            let _ = writeln!(out, "{name} {value}");
        }

        let gauges = [
            (
                "loadcast_uptime_seconds",
                "Seconds since the service started",
                self.uptime_seconds as f64,
            ),
            (
                "loadcast_request_success_rate",
                "Share of requests answered without error",
                self.success_rate,
            ),
            (
                "loadcast_request_duration_avg_ms",
                "Average request duration in milliseconds",
                self.avg_duration_ms,
            ),
        ];
        for (name, help, value) in gauges {
            let _ = writeln!(out, "# HELP {name} {help}");
            let _ = writeln!(out, "# TYPE {name} gauge");
            let _ = writeln!(out, "{name} {value}");
        }
        out
    }
}
