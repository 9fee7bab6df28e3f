//! Per-route request statistics.
//!
//! Counters are lock-free atomics inside a concurrent map so recording
//! never blocks a request. Snapshots are best-effort consistent.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;

use crate::routing::RouteKey;

#[derive(Debug, Default)]
struct RouteCounters {
    total: AtomicU64,
    successful: AtomicU64,
    failed: AtomicU64,
    total_micros: AtomicU64,
}

/// Aggregated request statistics for one gateway.
#[derive(Debug)]
pub struct GatewayStats {
    routes: DashMap<RouteKey, RouteCounters>,
    errors: DashMap<String, AtomicU64>,
    total: AtomicU64,
    started: Instant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteStatsEntry {
    pub route: String,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub success_rate_percent: f64,
    pub average_response_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub uptime_secs: u64,
    pub total_requests: u64,
    pub routes: Vec<RouteStatsEntry>,
    pub errors: BTreeMap<String, u64>,
}

impl GatewayStats {
    pub fn new() -> Self {
        Self {
            routes: DashMap::new(),
            errors: DashMap::new(),
            total: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// Record one routed call. `route` is `None` when the request never
    /// matched a registration; `error_code` is `None` on success.
    pub fn record(&self, route: Option<&RouteKey>, error_code: Option<&str>, elapsed: Duration) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if let Some(key) = route {
            let counters = self.routes.entry(key.clone()).or_default();
            counters.total.fetch_add(1, Ordering::Relaxed);
            if error_code.is_some() {
                counters.failed.fetch_add(1, Ordering::Relaxed);
            } else {
                counters.successful.fetch_add(1, Ordering::Relaxed);
            }
            counters
                .total_micros
                .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
        }

        if let Some(code) = error_code {
            self.errors
                .entry(code.to_string())
                .or_default()
                .fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let mut routes: Vec<RouteStatsEntry> = self
            .routes
            .iter()
            .map(|entry| {
                let c = entry.value();
                let total = c.total.load(Ordering::Relaxed);
                let successful = c.successful.load(Ordering::Relaxed);
                let micros = c.total_micros.load(Ordering::Relaxed);
                let (success_rate_percent, average_response_ms) = if total == 0 {
                    (0.0, 0.0)
                } else {
                    (
                        successful as f64 * 100.0 / total as f64,
                        micros as f64 / total as f64 / 1000.0,
                    )
                };
                RouteStatsEntry {
                    route: entry.key().to_string(),
                    total_requests: total,
                    successful_requests: successful,
                    failed_requests: c.failed.load(Ordering::Relaxed),
                    success_rate_percent,
                    average_response_ms,
                }
            })
            .collect();
        routes.sort_by(|a, b| a.route.cmp(&b.route));

        let errors: BTreeMap<String, u64> = self
            .errors
            .iter()
            .map(|e| (e.key().clone(), e.value().load(Ordering::Relaxed)))
            .collect();

        StatsSnapshot {
            uptime_secs: self.started.elapsed().as_secs(),
            total_requests: self.total.load(Ordering::Relaxed),
            routes,
            errors,
        }
    }

    /// Drop every counter. Uptime keeps counting from process start.
    pub fn reset(&self) {
        self.routes.clear();
        self.errors.clear();
        self.total.store(0, Ordering::Relaxed);
    }
}

impl Default for GatewayStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{ApiMethod, Pillar};

    #[test]
    fn test_route_counters() {
        let stats = GatewayStats::new();
        let key = RouteKey::new(Pillar::Content, "upload-file", ApiMethod::Post);

        stats.record(Some(&key), None, Duration::from_millis(10));
        stats.record(Some(&key), None, Duration::from_millis(30));
        stats.record(Some(&key), Some("BAD_REQUEST"), Duration::from_millis(2));
        stats.record(None, Some("PILLAR_NOT_FOUND"), Duration::from_millis(1));

        let snap = stats.snapshot();
        assert_eq!(snap.total_requests, 4);
        assert_eq!(snap.routes.len(), 1);

        let entry = &snap.routes[0];
        assert_eq!(entry.route, "POST content/upload-file");
        assert_eq!(entry.total_requests, 3);
        assert_eq!(entry.successful_requests, 2);
        assert_eq!(entry.failed_requests, 1);
        assert!((entry.average_response_ms - 14.0).abs() < 0.01);
        assert!((entry.success_rate_percent - 66.67).abs() < 0.01);

        assert_eq!(snap.errors.get("BAD_REQUEST"), Some(&1));
        assert_eq!(snap.errors.get("PILLAR_NOT_FOUND"), Some(&1));
    }

    #[test]
    fn test_reset_clears_counters() {
        let stats = GatewayStats::new();
        let key = RouteKey::new(Pillar::Insights, "analyze", ApiMethod::Post);
        stats.record(Some(&key), Some("DATASET_EMPTY"), Duration::from_millis(4));

        stats.reset();
        let snap = stats.snapshot();
        assert_eq!(snap.total_requests, 0);
        assert!(snap.routes.is_empty());
        assert!(snap.errors.is_empty());

        stats.record(Some(&key), None, Duration::from_millis(4));
        let snap = stats.snapshot();
        assert_eq!(snap.total_requests, 1);
        assert_eq!(snap.routes[0].success_rate_percent, 100.0);
    }
}
