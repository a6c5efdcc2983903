//! Orphan Classification Engine
//!
//! Pure functions over finished records. Tiers are evidence tags rather
//! than exclusive states: an image can be both a high-confidence orphan and
//! a test-pattern match, and both appear in the output. Summary counts only
//! use the strict high-confidence definition.
//!
//! Missing evidence never pushes a resource toward orphan-hood. An image
//! whose watcher status could not be read is at most a review candidate,
//! and an unbound idle image of size zero is left alone.

use crate::domain::records::{BucketRecord, ImageRecord, PoolUsageEntry};
use serde::{Deserialize, Serialize};

// =============================================================================
// Classification Tags
// =============================================================================

/// Evidence tag attached to a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrphanClassification {
    /// No binding and no sign of use; removable after verification
    HighConfidenceOrphan,
    /// No binding but something suggests it is in use
    MediumConfidenceReview,
    /// Name matches test/benchmark/temporary conventions
    TestPatternFlag,
    /// Bound or otherwise not actionable
    Bound,
}

impl std::fmt::Display for OrphanClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrphanClassification::HighConfidenceOrphan => write!(f, "high-confidence-orphan"),
            OrphanClassification::MediumConfidenceReview => write!(f, "medium-confidence-review"),
            OrphanClassification::TestPatternFlag => write!(f, "test-pattern-flag"),
            OrphanClassification::Bound => write!(f, "bound"),
        }
    }
}

/// Tags for one image, sorted. `Bound` appears only without an orphan tier.
pub fn classify_image(image: &ImageRecord) -> Vec<OrphanClassification> {
    let mut tags = vec![image_tier(image).1];
    if image.looks_like_test_artifact {
        tags.push(OrphanClassification::TestPatternFlag);
    }
    tags.sort();
    tags
}

/// Tags for one bucket
pub fn classify_bucket(bucket: &BucketRecord) -> Vec<OrphanClassification> {
    vec![bucket_tier(bucket).1]
}

fn image_tier(image: &ImageRecord) -> (&'static str, OrphanClassification) {
    use OrphanClassification::*;

    if image.has_binding {
        return ("bound", Bound);
    }
    if !image.status_resolved {
        return ("no binding, watcher status unavailable", MediumConfidenceReview);
    }
    if image.watcher_count > 0 {
        return ("no binding, active watchers", MediumConfidenceReview);
    }
    if !image.size_resolved {
        return ("no binding, size unavailable", MediumConfidenceReview);
    }
    if image.size_bytes > 0 {
        return ("no binding, no watchers", HighConfidenceOrphan);
    }
    ("no binding, no watchers, size unknown or zero", Bound)
}

fn bucket_tier(bucket: &BucketRecord) -> (&'static str, OrphanClassification) {
    use OrphanClassification::*;

    match (bucket.has_binding, bucket.logging_related) {
        (true, _) => ("bound", Bound),
        (false, false) => ("no claim, no provisioner secret", HighConfidenceOrphan),
        (false, true) => ("no claim, logging retention bucket", MediumConfidenceReview),
    }
}

// =============================================================================
// Orphan Report
// =============================================================================

/// An image listed under one of the tiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedImage {
    pub pool: String,
    pub name: String,
    pub size_bytes: u64,
    pub size_resolved: bool,
    pub watcher_count: u32,
    pub status_resolved: bool,
    pub has_binding: bool,
    pub reason: String,
    /// Detail queries that failed for this image
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl FlaggedImage {
    fn from_record(image: &ImageRecord, reason: &str) -> Self {
        Self {
            pool: image.pool.clone(),
            name: image.name.clone(),
            size_bytes: image.size_bytes,
            size_resolved: image.size_resolved,
            watcher_count: image.watcher_count,
            status_resolved: image.status_resolved,
            has_binding: image.has_binding,
            reason: reason.to_string(),
            notes: image.detail_errors.clone(),
        }
    }

    pub fn spec(&self) -> String {
        format!("{}/{}", self.pool, self.name)
    }
}

/// A bucket listed under one of the tiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedBucket {
    pub name: String,
    pub owner: String,
    pub object_count: u64,
    pub size_bytes: u64,
    pub logging_related: bool,
    pub reason: String,
}

impl FlaggedBucket {
    fn from_record(bucket: &BucketRecord, reason: &str) -> Self {
        Self {
            name: bucket.name.clone(),
            owner: bucket.owner.clone(),
            object_count: bucket.object_count,
            size_bytes: bucket.size_bytes,
            logging_related: bucket.logging_related,
            reason: reason.to_string(),
        }
    }
}

/// Strict per-tier counts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrphanSummary {
    pub high_confidence_images: usize,
    pub medium_confidence_images: usize,
    pub test_pattern_images: usize,
    pub high_confidence_buckets: usize,
    pub medium_confidence_buckets: usize,
    pub suspected_test_pools: usize,
    /// Bytes held by high-confidence orphans only
    pub reclaimable_bytes: u64,
}

/// Classification breakdown for a whole run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrphanReport {
    pub high_confidence_images: Vec<FlaggedImage>,
    pub medium_confidence_images: Vec<FlaggedImage>,
    pub test_pattern_images: Vec<FlaggedImage>,
    pub high_confidence_buckets: Vec<FlaggedBucket>,
    pub medium_confidence_buckets: Vec<FlaggedBucket>,
    pub suspected_test_pools: Vec<String>,
    pub summary: OrphanSummary,
}

/// Classify every record. Output order follows input order, which the
/// builders keep sorted.
pub fn classify_inventory(
    images: &[ImageRecord],
    buckets: &[BucketRecord],
    pools: &[PoolUsageEntry],
) -> OrphanReport {
    let mut report = OrphanReport::default();

    for image in images {
        let (reason, tier) = image_tier(image);
        match tier {
            OrphanClassification::HighConfidenceOrphan => {
                report.summary.reclaimable_bytes =
                    report.summary.reclaimable_bytes.saturating_add(image.size_bytes);
                report
                    .high_confidence_images
                    .push(FlaggedImage::from_record(image, reason));
            }
            OrphanClassification::MediumConfidenceReview => report
                .medium_confidence_images
                .push(FlaggedImage::from_record(image, reason)),
            _ => {}
        }
        if image.looks_like_test_artifact {
            report
                .test_pattern_images
                .push(FlaggedImage::from_record(image, "name matches test pattern"));
        }
    }

    for bucket in buckets {
        let (reason, tier) = bucket_tier(bucket);
        match tier {
            OrphanClassification::HighConfidenceOrphan => {
                report.summary.reclaimable_bytes =
                    report.summary.reclaimable_bytes.saturating_add(bucket.size_bytes);
                report
                    .high_confidence_buckets
                    .push(FlaggedBucket::from_record(bucket, reason));
            }
            OrphanClassification::MediumConfidenceReview => report
                .medium_confidence_buckets
                .push(FlaggedBucket::from_record(bucket, reason)),
            _ => {}
        }
    }

    report.suspected_test_pools = pools
        .iter()
        .filter(|p| p.suspected_test_pool)
        .map(|p| p.name.clone())
        .collect();

    report.summary.high_confidence_images = report.high_confidence_images.len();
    report.summary.medium_confidence_images = report.medium_confidence_images.len();
    report.summary.test_pattern_images = report.test_pattern_images.len();
    report.summary.high_confidence_buckets = report.high_confidence_buckets.len();
    report.summary.medium_confidence_buckets = report.medium_confidence_buckets.len();
    report.summary.suspected_test_pools = report.suspected_test_pools.len();
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::records::{BindingKind, BindingRef};
    use OrphanClassification::*;

    fn image(name: &str, bound: bool, watchers: u32, size: u64) -> ImageRecord {
        ImageRecord {
            pool: "rbdpool".into(),
            name: name.into(),
            size_bytes: size,
            size_resolved: true,
            watcher_count: watchers,
            status_resolved: true,
            has_binding: bound,
            looks_like_test_artifact: name.contains("fio") || name.contains("test"),
            bindings: if bound {
                vec![BindingRef {
                    kind: BindingKind::PersistentVolume,
                    namespace: None,
                    name: format!("pv-{}", name),
                    claim: None,
                    claim_missing: false,
                }]
            } else {
                Vec::new()
            },
            detail_errors: Vec::new(),
        }
    }

    fn bucket(name: &str, bound: bool, logging: bool) -> BucketRecord {
        BucketRecord {
            name: name.into(),
            owner: "owner".into(),
            object_count: 10,
            size_bytes: 1000,
            stats_resolved: true,
            has_binding: bound,
            logging_related: logging,
            bindings: Vec::new(),
        }
    }

    #[test]
    fn test_image_tiers() {
        assert_eq!(classify_image(&image("a", false, 0, 10)), [HighConfidenceOrphan]);
        assert_eq!(classify_image(&image("b", false, 2, 10)), [MediumConfidenceReview]);
        assert_eq!(classify_image(&image("c", true, 0, 10)), [Bound]);
        assert_eq!(classify_image(&image("d", false, 0, 0)), [Bound]);
    }

    #[test]
    fn test_unresolved_status_is_never_high() {
        let mut img = image("e", false, 0, 10);
        img.status_resolved = false;
        assert_eq!(classify_image(&img), [MediumConfidenceReview]);
    }

    #[test]
    fn test_unresolved_size_is_review() {
        let mut img = image("f", false, 0, 0);
        img.size_resolved = false;
        img.detail_errors = vec!["rbd info: timeout".into()];
        assert_eq!(classify_image(&img), [MediumConfidenceReview]);

        let report = classify_inventory(&[img], &[], &[]);
        let flagged = &report.medium_confidence_images[0];
        assert_eq!(flagged.reason, "no binding, size unavailable");
        assert_eq!(flagged.notes, ["rbd info: timeout"]);
        assert_eq!(report.summary.high_confidence_images, 0);
    }

    #[test]
    fn test_test_pattern_independent_of_binding() {
        let bound = image("fio-bench-1", true, 1, 10);
        let tags = classify_image(&bound);
        assert!(bound.has_binding);
        assert_eq!(tags, [TestPatternFlag, Bound]);

        let report = classify_inventory(&[bound], &[], &[]);
        assert_eq!(report.test_pattern_images.len(), 1);
        assert!(report.test_pattern_images[0].has_binding);
        assert!(report.high_confidence_images.is_empty());

        let orphan = image("test-scratch", false, 0, 10);
        assert_eq!(classify_image(&orphan), [HighConfidenceOrphan, TestPatternFlag]);
    }

    #[test]
    fn test_high_confidence_implies_unbound() {
        let mut images = Vec::new();
        for bound in [true, false] {
            for watchers in [0, 1, 3] {
                for size in [0, 1, 1 << 30] {
                    for resolved in [true, false] {
                        let mut img = image(&format!("img-{}-{}-{}", bound, watchers, size), bound, watchers, size);
                        img.status_resolved = resolved;
                        images.push(img);
                    }
                }
            }
        }
        let buckets: Vec<_> = [true, false]
            .iter()
            .flat_map(|&b| [true, false].map(|l| bucket(&format!("bkt-{}-{}", b, l), b, l)))
            .collect();

        for img in &images {
            if classify_image(img).contains(&HighConfidenceOrphan) {
                assert!(!img.has_binding && img.bindings.is_empty());
            }
        }
        for b in &buckets {
            if classify_bucket(b).contains(&HighConfidenceOrphan) {
                assert!(!b.has_binding);
            }
        }

        let report = classify_inventory(&images, &buckets, &[]);
        assert!(report.high_confidence_images.iter().all(|i| !i.has_binding));
        assert_eq!(report.summary.high_confidence_images, 2);
        assert_eq!(report.summary.high_confidence_buckets, 1);
    }

    #[test]
    fn test_bucket_tiers() {
        assert_eq!(classify_bucket(&bucket("uploads", false, false)), [HighConfidenceOrphan]);
        assert_eq!(classify_bucket(&bucket("loki-chunks", false, true)), [MediumConfidenceReview]);
        assert_eq!(classify_bucket(&bucket("loki-chunks", true, true)), [Bound]);
    }

    #[test]
    fn test_summary_counts_and_determinism() {
        let images = vec![
            image("fio-orphan", false, 0, 100),
            image("busy", false, 1, 100),
            image("bound", true, 1, 100),
        ];
        let buckets = vec![bucket("stale", false, false), bucket("app-logs", false, true)];
        let pools = vec![PoolUsageEntry {
            name: "bench-pool".into(),
            used_bytes: 0,
            stored_bytes: 0,
            max_avail_bytes: 0,
            suspected_test_pool: true,
        }];

        let first = classify_inventory(&images, &buckets, &pools);
        let second = classify_inventory(&images, &buckets, &pools);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );

        assert_eq!(first.summary.high_confidence_images, 1);
        assert_eq!(first.summary.medium_confidence_images, 1);
        assert_eq!(first.summary.test_pattern_images, 1);
        assert_eq!(first.summary.high_confidence_buckets, 1);
        assert_eq!(first.summary.medium_confidence_buckets, 1);
        assert_eq!(first.summary.reclaimable_bytes, 1100);
        assert_eq!(first.suspected_test_pools, ["bench-pool"]);
    }
}
