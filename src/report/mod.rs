//! Report assembly
//!
//! - [`model`]: the structured report and its counts
//! - [`render`]: summary and per-tier listings
//! - [`cleanup`]: commented-out removal suggestions
//! - [`writer`]: artifact files

pub mod cleanup;
pub mod model;
pub mod render;
pub mod writer;

pub use cleanup::render_cleanup_suggestions;
pub use model::{AuditCounts, AuditReport, DataSources, Datasets, SourceFailure};
pub use render::{render_orphans, render_summary};
pub use writer::{rerender, write_artifacts, write_renderings};

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::classification::classify_inventory;
    use crate::domain::ports::EndpointSource;
    use crate::domain::records::*;
    use crate::inventory::{BindingStats, CapacitySource, ClusterSummary, FilesystemInventory};
    use crate::normalize::units::{GIB, TIB};
    use chrono::{TimeZone, Utc};

    fn image(name: &str, bound: bool, resolved: bool, test: bool) -> ImageRecord {
        ImageRecord {
            pool: "rbdpool".into(),
            name: name.into(),
            size_bytes: 10 * GIB,
            size_resolved: true,
            watcher_count: 0,
            status_resolved: resolved,
            has_binding: bound,
            looks_like_test_artifact: test,
            bindings: Vec::new(),
            detail_errors: if resolved {
                Vec::new()
            } else {
                vec!["rbd status: Admin command failed".into()]
            },
        }
    }

    /// A small report exercising every tier
    pub fn sample_report() -> AuditReport {
        let images = vec![
            image("csi-vol-busy", false, false, false),
            image("csi-vol-dead", false, true, false),
            image("fio-bench-1", true, true, true),
        ];
        let buckets = vec![
            BucketRecord {
                name: "loki-chunks".into(),
                owner: "loki".into(),
                object_count: 1200,
                size_bytes: 3 * GIB,
                stats_resolved: true,
                has_binding: false,
                logging_related: true,
                bindings: Vec::new(),
            },
            BucketRecord {
                name: "stale-uploads".into(),
                owner: UNKNOWN_OWNER.into(),
                object_count: 0,
                size_bytes: 0,
                stats_resolved: false,
                has_binding: false,
                logging_related: false,
                bindings: Vec::new(),
            },
        ];
        let filesystems = FilesystemInventory {
            filesystems: vec!["ocs-storagecluster-cephfilesystem".into()],
            groups: vec![SubvolumeGroupRecord {
                filesystem: "ocs-storagecluster-cephfilesystem".into(),
                name: "csi".into(),
                subvolume_count: 2,
                used_bytes: GIB,
            }],
            subvolumes: vec![
                SubvolumeRecord {
                    filesystem: "ocs-storagecluster-cephfilesystem".into(),
                    group: "csi".into(),
                    name: "csi-vol-a".into(),
                    quota_bytes: None,
                    used_bytes: 0,
                },
                SubvolumeRecord {
                    filesystem: "ocs-storagecluster-cephfilesystem".into(),
                    group: "csi".into(),
                    name: "csi-vol-b".into(),
                    quota_bytes: Some(10 * GIB),
                    used_bytes: GIB,
                },
            ],
        };

        let classification = classify_inventory(&images, &buckets, &[]);
        let datasets = Datasets {
            images,
            buckets,
            filesystems,
            pools: Vec::new(),
        };

        AuditReport::assemble(
            Utc.with_ymd_and_hms(2024, 5, 8, 12, 0, 0).unwrap(),
            "ceph-orphan-audit-20240508-120000".into(),
            DataSources {
                metrics_endpoint: "https://thanos-querier.apps.example.com".into(),
                metrics_source: EndpointSource::Route,
                admin_command_prefix: "kubectl -n openshift-storage exec deploy/rook-ceph-tools --"
                    .into(),
                control_plane: "https://api.example.com:6443".into(),
                control_plane_cli: "oc".into(),
            },
            ClusterSummary {
                fsid: "c0ffee".into(),
                health: "HEALTH_OK".into(),
                raw_bytes: TIB,
                used_bytes: 200 * GIB,
                stored_bytes: 100 * GIB,
                efficiency: 0.5,
                raw_source: CapacitySource::Metrics,
                used_source: CapacitySource::Metrics,
                stored_source: CapacitySource::AdminDf,
                trend: None,
            },
            BindingStats::default(),
            datasets,
            classification,
            vec![SourceFailure {
                section: "pools".into(),
                reason: "ceph df unavailable".into(),
            }],
        )
    }
}
