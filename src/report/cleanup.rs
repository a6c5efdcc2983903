//! Inert cleanup suggestions
//!
//! Every destructive line is emitted commented out. The file is a worklist
//! for a human, not a script to run.

use crate::report::model::AuditReport;
use crate::report::render::{bucket_verify_commands, image_verify_commands};
use std::fmt::Write;

/// Render `cleanup-suggestions.sh`
pub fn render_cleanup_suggestions(report: &AuditReport) -> String {
    let sources = &report.data_sources;
    let prefix = &sources.admin_command_prefix;
    let tiers = &report.classification;
    let mut out = String::new();

    let _ = writeln!(out, "#!/bin/sh");
    let _ = writeln!(out, "# Cleanup suggestions generated {}", report.generated_at.to_rfc3339());
    let _ = writeln!(out, "#");
    let _ = writeln!(out, "# NOTHING IN THIS FILE IS EXECUTED. Every removal is commented out.");
    let _ = writeln!(out, "# Run each verify command, confirm with the owning team, then");
    let _ = writeln!(out, "# uncomment a single line at a time.");
    let _ = writeln!(out, "exit 0");
    let _ = writeln!(out);

    let _ = writeln!(out, "# --- High confidence block images ---");
    for image in &tiers.high_confidence_images {
        let _ = writeln!(out);
        let _ = writeln!(out, "# {} ({})", image.spec(), image.reason);
        for cmd in image_verify_commands(sources, image) {
            let _ = writeln!(out, "# verify: {}", cmd);
        }
        let _ = writeln!(out, "# {} rbd rm {}", prefix, image.spec());
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "# --- High confidence buckets ---");
    for bucket in &tiers.high_confidence_buckets {
        let _ = writeln!(out);
        let _ = writeln!(out, "# {} (owner {}, {})", bucket.name, bucket.owner, bucket.reason);
        for cmd in bucket_verify_commands(sources, bucket) {
            let _ = writeln!(out, "# verify: {}", cmd);
        }
        let _ = writeln!(
            out,
            "# {} radosgw-admin bucket rm --bucket {} --purge-objects",
            prefix, bucket.name
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "# --- Review only: no removal suggested ---");
    for image in &tiers.medium_confidence_images {
        let _ = writeln!(out, "# {} ({})", image.spec(), image.reason);
        for cmd in image_verify_commands(sources, image) {
            let _ = writeln!(out, "# verify: {}", cmd);
        }
    }
    for bucket in &tiers.medium_confidence_buckets {
        let _ = writeln!(out, "# {} ({})", bucket.name, bucket.reason);
        for cmd in bucket_verify_commands(sources, bucket) {
            let _ = writeln!(out, "# verify: {}", cmd);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::test_support::sample_report;

    #[test]
    fn test_no_live_destructive_lines() {
        let script = render_cleanup_suggestions(&sample_report());

        for line in script.lines() {
            let trimmed = line.trim();
            if trimmed.contains(" rm ") {
                assert!(trimmed.starts_with('#'), "live removal: {}", line);
            }
        }
        assert!(script.contains("# kubectl -n openshift-storage exec deploy/rook-ceph-tools -- rbd rm rbdpool/csi-vol-dead"));
        assert!(script.contains("radosgw-admin bucket rm --bucket stale-uploads"));
    }

    #[test]
    fn test_review_tier_has_no_removal() {
        let script = render_cleanup_suggestions(&sample_report());
        assert!(script.contains("rbd status rbdpool/csi-vol-busy"));
        assert!(!script.contains("rbd rm rbdpool/csi-vol-busy"));
        assert!(script.contains("# verify: oc get pv -o json | grep -c 'csi-vol-busy'"));
    }
}
