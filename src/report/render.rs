//! Human-readable renderings of an [`AuditReport`]
//!
//! Pure functions of the report, so re-rendering a saved `report.json`
//! reproduces the same bytes.

use crate::classification::{FlaggedBucket, FlaggedImage};
use crate::normalize::{human_readable, human_readable_opt};
use crate::report::model::{AuditReport, DataSources};
use std::fmt::Write;

const RULE: &str = "================================================================";

// =============================================================================
// Verification Commands
// =============================================================================

/// Commands to run by hand before acting on a flagged image
pub fn image_verify_commands(sources: &DataSources, image: &FlaggedImage) -> Vec<String> {
    vec![
        format!("{} rbd status {}", sources.admin_command_prefix, image.spec()),
        format!(
            "{} get pv -o json | grep -c '{}'",
            sources.control_plane_cli, image.name
        ),
    ]
}

/// Commands to run by hand before acting on a flagged bucket
pub fn bucket_verify_commands(sources: &DataSources, bucket: &FlaggedBucket) -> Vec<String> {
    vec![
        format!(
            "{} radosgw-admin bucket stats --bucket {}",
            sources.admin_command_prefix, bucket.name
        ),
        format!(
            "{} get obc -A -o json | grep -c '{}'",
            sources.control_plane_cli, bucket.name
        ),
    ]
}

// =============================================================================
// Summary
// =============================================================================

/// One-page summary
pub fn render_summary(report: &AuditReport) -> String {
    let mut out = String::new();
    let cluster = &report.cluster;
    let counts = &report.counts;
    let summary = &report.classification.summary;

    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "CEPH STORAGE ORPHAN AUDIT - SUMMARY");
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "Generated:      {}", report.generated_at.to_rfc3339());
    let _ = writeln!(out, "Output:         {}", report.output_location);
    let _ = writeln!(
        out,
        "Metrics:        {} ({})",
        report.data_sources.metrics_endpoint, report.data_sources.metrics_source
    );
    let _ = writeln!(out, "Admin access:   {}", report.data_sources.admin_command_prefix);
    let _ = writeln!(out);

    let _ = writeln!(out, "CLUSTER");
    let _ = writeln!(out, "  Health:       {}", cluster.health);
    let _ = writeln!(out, "  Raw capacity: {}", human_readable(cluster.raw_bytes));
    let _ = writeln!(out, "  Raw used:     {}", human_readable(cluster.used_bytes));
    let _ = writeln!(out, "  Stored:       {}", human_readable(cluster.stored_bytes));
    let _ = writeln!(out, "  Efficiency:   {:.2}", cluster.efficiency);
    if let Some(trend) = &cluster.trend {
        let direction = if trend.growth_bytes < 0 { "-" } else { "+" };
        let _ = writeln!(
            out,
            "  Trend:        {}{} over {} samples since {}",
            direction,
            human_readable(trend.growth_bytes.unsigned_abs()),
            trend.samples,
            trend.window_start.to_rfc3339()
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "INVENTORY");
    let _ = writeln!(out, "  Block images:     {}", counts.images);
    let _ = writeln!(out, "  Buckets:          {}", counts.buckets);
    let _ = writeln!(out, "  Subvolumes:       {}", counts.subvolumes);
    let _ = writeln!(out, "  Pools:            {}", counts.pools);
    let _ = writeln!(
        out,
        "  RBD volumes:      {} ({} released)",
        counts.bindings.rbd_volumes, counts.bindings.released_volumes
    );
    let _ = writeln!(out, "  Bound bucket names: {}", counts.bindings.bound_bucket_names);
    let _ = writeln!(out);

    let _ = writeln!(out, "ORPHAN CANDIDATES");
    let _ = writeln!(out, "  High confidence images:    {}", summary.high_confidence_images);
    let _ = writeln!(out, "  High confidence buckets:   {}", summary.high_confidence_buckets);
    let _ = writeln!(out, "  Review images:             {}", summary.medium_confidence_images);
    let _ = writeln!(out, "  Review buckets:            {}", summary.medium_confidence_buckets);
    let _ = writeln!(out, "  Test-pattern images:       {}", summary.test_pattern_images);
    let _ = writeln!(out, "  Suspected test pools:      {}", summary.suspected_test_pools);
    let _ = writeln!(
        out,
        "  Reclaimable (high only):   {}",
        human_readable(summary.reclaimable_bytes)
    );

    if !report.source_failures.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "INCOMPLETE SECTIONS");
        for failure in &report.source_failures {
            let _ = writeln!(out, "  {}: {}", failure.section, failure.reason);
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Nothing has been deleted. Verify every candidate and re-run in 7 days before acting."
    );
    out
}

// =============================================================================
// Detailed Listing
// =============================================================================

fn write_images(out: &mut String, title: &str, sources: &DataSources, images: &[FlaggedImage]) {
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "{} ({})", title, images.len());
    let _ = writeln!(out, "{}", RULE);
    if images.is_empty() {
        let _ = writeln!(out, "  none");
    }
    for image in images {
        let _ = writeln!(
            out,
            "{}  size={}  watchers={}  bound={}",
            image.spec(),
            if image.size_resolved {
                human_readable(image.size_bytes)
            } else {
                "unknown".to_string()
            },
            if image.status_resolved {
                image.watcher_count.to_string()
            } else {
                "unknown".to_string()
            },
            image.has_binding
        );
        let _ = writeln!(out, "  reason: {}", image.reason);
        for note in &image.notes {
            let _ = writeln!(out, "  note: {}", note);
        }
        for cmd in image_verify_commands(sources, image) {
            let _ = writeln!(out, "  verify: {}", cmd);
        }
    }
    let _ = writeln!(out);
}

fn write_buckets(out: &mut String, title: &str, sources: &DataSources, buckets: &[FlaggedBucket]) {
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "{} ({})", title, buckets.len());
    let _ = writeln!(out, "{}", RULE);
    if buckets.is_empty() {
        let _ = writeln!(out, "  none");
    }
    for bucket in buckets {
        let _ = writeln!(
            out,
            "{}  owner={}  objects={}  size={}",
            bucket.name,
            bucket.owner,
            bucket.object_count,
            human_readable(bucket.size_bytes)
        );
        let _ = writeln!(out, "  reason: {}", bucket.reason);
        for cmd in bucket_verify_commands(sources, bucket) {
            let _ = writeln!(out, "  verify: {}", cmd);
        }
    }
    let _ = writeln!(out);
}

/// Per-tier listing with verification commands
pub fn render_orphans(report: &AuditReport) -> String {
    let sources = &report.data_sources;
    let prefix = &sources.admin_command_prefix;
    let tiers = &report.classification;
    let mut out = String::new();

    let _ = writeln!(out, "Orphan candidates as of {}", report.generated_at.to_rfc3339());
    let _ = writeln!(out);

    write_images(&mut out, "HIGH CONFIDENCE: BLOCK IMAGES", sources, &tiers.high_confidence_images);
    write_buckets(&mut out, "HIGH CONFIDENCE: BUCKETS", sources, &tiers.high_confidence_buckets);
    write_images(&mut out, "REVIEW: BLOCK IMAGES", sources, &tiers.medium_confidence_images);
    write_buckets(&mut out, "REVIEW: BUCKETS", sources, &tiers.medium_confidence_buckets);
    write_images(&mut out, "TEST PATTERN: BLOCK IMAGES", sources, &tiers.test_pattern_images);

    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "SUSPECTED TEST POOLS ({})", tiers.suspected_test_pools.len());
    let _ = writeln!(out, "{}", RULE);
    for pool in &report.datasets.pools {
        if pool.suspected_test_pool {
            let _ = writeln!(
                out,
                "{}  used={}  stored={}",
                pool.name,
                human_readable(pool.used_bytes),
                human_readable(pool.stored_bytes)
            );
            let _ = writeln!(out, "  verify: {} rbd ls --pool {}", prefix, pool.name);
        }
    }
    let _ = writeln!(out);

    let subvolumes = &report.datasets.filesystems.subvolumes;
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "FILESYSTEM SUBVOLUMES ({}, inventory only)", subvolumes.len());
    let _ = writeln!(out, "{}", RULE);
    for sv in subvolumes {
        let _ = writeln!(
            out,
            "{}:{}/{}  used={}  quota={}",
            sv.filesystem,
            sv.group,
            sv.name,
            human_readable(sv.used_bytes),
            if sv.quota_bytes.is_some() {
                human_readable_opt(sv.quota_bytes)
            } else {
                "none".to_string()
            }
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::test_support::sample_report;

    #[test]
    fn test_summary_contents() {
        let text = render_summary(&sample_report());
        assert!(text.contains("High confidence images:    1"));
        assert!(text.contains("Health:       HEALTH_OK"));
        assert!(text.contains("Raw capacity: 1.00 TiB"));
        assert!(text.contains("INCOMPLETE SECTIONS"));
        assert!(text.contains("pools: ceph df unavailable"));
    }

    #[test]
    fn test_orphans_carry_verify_commands() {
        let text = render_orphans(&sample_report());
        assert!(text.contains(
            "verify: kubectl -n openshift-storage exec deploy/rook-ceph-tools -- rbd status rbdpool/csi-vol-dead"
        ));
        assert!(text.contains("watchers=unknown"));
        assert!(text.contains("note: rbd status: Admin command failed"));
        assert!(text.contains("verify: oc get pv -o json | grep -c 'csi-vol-dead'"));
        assert!(text.contains("verify: oc get obc -A -o json | grep -c 'stale-uploads'"));
        assert!(!text.contains("verify: kubectl get"));
        assert!(text.contains("quota=none"));
        assert!(text.contains("quota=10.00 GiB"));
    }

    #[test]
    fn test_rendering_reproducible_from_json() {
        let report = sample_report();
        let reloaded: AuditReport = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(render_summary(&report), render_summary(&reloaded));
        assert_eq!(render_orphans(&report), render_orphans(&reloaded));
    }
}
