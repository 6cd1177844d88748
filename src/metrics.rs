//! Prometheus-compatible metrics endpoint

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::state::AppState;

/// Metrics collector
#[derive(Debug)]
pub struct Metrics {
    /// Server start time
    start_time: Instant,
    requests: AtomicU64,
    scans_completed: AtomicU64,
    scans_rejected: AtomicU64,
    streams_full: AtomicU64,
    streams_partial: AtomicU64,
    downloads: AtomicU64,
    range_rejections: AtomicU64,
    not_found: AtomicU64,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            requests: AtomicU64::new(0),
            scans_completed: AtomicU64::new(0),
            scans_rejected: AtomicU64::new(0),
            streams_full: AtomicU64::new(0),
            streams_partial: AtomicU64::new(0),
            downloads: AtomicU64::new(0),
            range_rejections: AtomicU64::new(0),
            not_found: AtomicU64::new(0),
        }
    }

    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_scan_completed(&self) {
        self.scans_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_scan_rejected(&self) {
        self.scans_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stream(&self, partial: bool) {
        if partial {
            self.streams_partial.fetch_add(1, Ordering::Relaxed);
        } else {
            self.streams_full.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_download(&self) {
        self.downloads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_range_rejected(&self) {
        self.range_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_not_found(&self) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn scans_completed(&self) -> u64 {
        self.scans_completed.load(Ordering::Relaxed)
    }

    pub fn scans_rejected(&self) -> u64 {
        self.scans_rejected.load(Ordering::Relaxed)
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Export metrics in Prometheus format
    pub fn export_prometheus(&self) -> String {
        let mut output = String::new();

        let start_unix = std::time::SystemTime::UNIX_EPOCH
            .elapsed()
            .unwrap_or(Duration::ZERO)
            .as_secs()
            .saturating_sub(self.uptime_secs());

        let series: [(&str, &str, &str, u64); 10] = [
            ("vidshelf_uptime_seconds", "counter", "Server uptime in seconds", self.uptime_secs()),
            ("vidshelf_start_time_seconds", "gauge", "Server start time as Unix timestamp", start_unix),
            ("vidshelf_requests_total", "counter", "Total number of HTTP requests", self.requests.load(Ordering::Relaxed)),
            ("vidshelf_scans_completed_total", "counter", "Completed catalog scans", self.scans_completed()),
            ("vidshelf_scans_rejected_total", "counter", "Scan triggers refused because a scan was running", self.scans_rejected()),
            ("vidshelf_streams_full_total", "counter", "Streams served without a Range header", self.streams_full.load(Ordering::Relaxed)),
            ("vidshelf_streams_partial_total", "counter", "Partial content responses", self.streams_partial.load(Ordering::Relaxed)),
            ("vidshelf_downloads_total", "counter", "Attachment downloads", self.downloads.load(Ordering::Relaxed)),
            ("vidshelf_range_rejections_total", "counter", "Range headers answered with 416", self.range_rejections.load(Ordering::Relaxed)),
            ("vidshelf_not_found_total", "counter", "Unknown identifiers or missing files", self.not_found.load(Ordering::Relaxed)),
        ];

        for (i, (name, kind, help, value)) in series.iter().enumerate() {
            if i > 0 {
                output.push('\n');
            }
            let _ = writeln!(output, "# HELP {} {}", name, help);
            let _ = writeln!(output, "# TYPE {} {}", name, kind);
            let _ = writeln!(output, "{} {}", name, value);
        }

        output
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Metrics endpoint handler
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    let prometheus_output = state.metrics.export_prometheus();

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        prometheus_output,
    )
        .into_response()
}
