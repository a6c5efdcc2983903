//! Cluster health and capacity
//!
//! Capacity figures come from the metrics backend first. Any figure that
//! extracts to zero falls back to `ceph df`, which is the secondary source.

use crate::access::metrics::{extract_range, extract_scalar};
use crate::domain::ports::{CephDf, CephStatus, MetricsBackend};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

pub const TOTAL_BYTES_QUERY: &str = "ceph_cluster_total_bytes";
pub const USED_RAW_BYTES_QUERY: &str = "ceph_cluster_total_used_raw_bytes";
pub const STORED_BYTES_QUERY: &str = "sum(ceph_pool_stored)";

/// Which source produced a capacity figure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacitySource {
    Metrics,
    AdminDf,
    Unavailable,
}

/// Health and capacity block of the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub fsid: String,
    pub health: String,
    pub raw_bytes: u64,
    pub used_bytes: u64,
    pub stored_bytes: u64,
    /// stored / used; `0` when nothing is used
    pub efficiency: f64,
    pub raw_source: CapacitySource,
    pub used_source: CapacitySource,
    pub stored_source: CapacitySource,
    #[serde(default)]
    pub trend: Option<CapacityTrend>,
}

/// Raw usage over the trend window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityTrend {
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub samples: usize,
    pub first_used_bytes: u64,
    pub last_used_bytes: u64,
    /// Signed change across the window
    pub growth_bytes: i64,
}

/// Efficiency ratio, guarded against a zero denominator
pub fn efficiency(stored: u64, used: u64) -> f64 {
    if used == 0 {
        0.0
    } else {
        stored as f64 / used as f64
    }
}

fn pick(metric: f64, fallback: Option<u64>) -> (u64, CapacitySource) {
    if metric > 0.0 {
        return (metric as u64, CapacitySource::Metrics);
    }
    match fallback {
        Some(value) if value > 0 => (value, CapacitySource::AdminDf),
        _ => (0, CapacitySource::Unavailable),
    }
}

/// Gather health and capacity. Metric query exhaustion is fatal; a missing
/// `ceph df` only removes the fallback.
pub async fn collect_cluster_summary(
    metrics: &dyn MetricsBackend,
    status: &CephStatus,
    df: Option<&CephDf>,
    stored_from_pools: Option<u64>,
) -> Result<ClusterSummary> {
    let raw = extract_scalar(&metrics.query_instant(TOTAL_BYTES_QUERY).await?, None);
    let used = extract_scalar(&metrics.query_instant(USED_RAW_BYTES_QUERY).await?, None);
    let stored = extract_scalar(&metrics.query_instant(STORED_BYTES_QUERY).await?, None);
    debug!("Capacity metrics: raw={} used={} stored={}", raw, used, stored);

    let (raw_bytes, raw_source) = pick(raw, df.map(|d| d.stats.total_bytes));
    let (used_bytes, used_source) = pick(used, df.map(|d| d.stats.total_used_raw_bytes));
    let (stored_bytes, stored_source) = pick(stored, stored_from_pools);

    info!(
        "Cluster {}: health {}, {} of {} raw bytes used",
        status.fsid, status.health.status, used_bytes, raw_bytes
    );

    Ok(ClusterSummary {
        fsid: status.fsid.clone(),
        health: status.health.status.clone(),
        raw_bytes,
        used_bytes,
        stored_bytes,
        efficiency: efficiency(stored_bytes, used_bytes),
        raw_source,
        used_source,
        stored_source,
        trend: None,
    })
}

/// Raw usage trend over `window` ending at `now`. A failed range query is
/// fatal; an empty series yields `None`.
pub async fn collect_capacity_trend(
    metrics: &dyn MetricsBackend,
    now: DateTime<Utc>,
    window: Duration,
    step: Duration,
) -> Result<Option<CapacityTrend>> {
    let span = chrono::Duration::from_std(window).unwrap_or_else(|_| chrono::Duration::days(7));
    let start = now - span;

    let result = metrics
        .query_range(USED_RAW_BYTES_QUERY, start, now, step)
        .await?;
    Ok(summarize_trend(&extract_range(&result), start, now))
}

/// First/last sample and growth of a range series
pub fn summarize_trend(
    samples: &[(i64, f64)],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Option<CapacityTrend> {
    let first = samples.first()?.1.max(0.0) as u64;
    let last = samples.last()?.1.max(0.0) as u64;
    Some(CapacityTrend {
        window_start,
        window_end,
        samples: samples.len(),
        first_used_bytes: first,
        last_used_bytes: last,
        growth_bytes: last as i64 - first as i64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_efficiency() {
        assert_eq!(efficiency(50, 100), 0.5);
        assert_eq!(efficiency(50, 0), 0.0);
    }

    #[test]
    fn test_pick_fallback() {
        assert_eq!(pick(10.0, Some(99)), (10, CapacitySource::Metrics));
        assert_eq!(pick(0.0, Some(99)), (99, CapacitySource::AdminDf));
        assert_eq!(pick(0.0, Some(0)), (0, CapacitySource::Unavailable));
        assert_eq!(pick(0.0, None), (0, CapacitySource::Unavailable));
    }

    #[test]
    fn test_summarize_trend() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 5, 8, 0, 0, 0).unwrap();

        let trend = summarize_trend(&[(1, 1000.0), (2, 1500.0), (3, 900.0)], start, end).unwrap();
        assert_eq!(trend.samples, 3);
        assert_eq!(trend.first_used_bytes, 1000);
        assert_eq!(trend.last_used_bytes, 900);
        assert_eq!(trend.growth_bytes, -100);

        assert!(summarize_trend(&[], start, end).is_none());
    }
}
