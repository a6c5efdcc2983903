//! Structured audit report
//!
//! The JSON form of [`AuditReport`] is the durable artifact. Every text
//! rendering is derived from it alone.

use crate::classification::OrphanReport;
use crate::domain::ports::EndpointSource;
use crate::domain::records::{BucketRecord, ImageRecord, PoolUsageEntry};
use crate::error::Result;
use crate::inventory::{BindingStats, ClusterSummary, FilesystemInventory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Where the data came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSources {
    pub metrics_endpoint: String,
    pub metrics_source: EndpointSource,
    /// Prefix reproducing the storage admin commands by hand
    pub admin_command_prefix: String,
    pub control_plane: String,
    /// Binary used for hand-run control-plane commands (`kubectl` or `oc`)
    pub control_plane_cli: String,
}

/// Per-category counts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditCounts {
    pub images: usize,
    pub buckets: usize,
    pub subvolumes: usize,
    pub pools: usize,
    /// Images and buckets in the high-confidence tier
    pub high_confidence_orphans: usize,
    /// Images and buckets in the review tier
    pub low_confidence_orphans: usize,
    pub bindings: BindingStats,
}

/// Raw per-category datasets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Datasets {
    pub images: Vec<ImageRecord>,
    pub buckets: Vec<BucketRecord>,
    pub filesystems: FilesystemInventory,
    pub pools: Vec<PoolUsageEntry>,
}

/// A builder that failed as a whole; its dataset is empty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFailure {
    pub section: String,
    pub reason: String,
}

/// The complete report of one audit run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub generated_at: DateTime<Utc>,
    pub output_location: String,
    pub tool_version: String,
    pub data_sources: DataSources,
    pub cluster: ClusterSummary,
    pub counts: AuditCounts,
    pub datasets: Datasets,
    pub classification: OrphanReport,
    #[serde(default)]
    pub source_failures: Vec<SourceFailure>,
}

impl AuditReport {
    /// Put the pieces together and derive the counts
    pub fn assemble(
        generated_at: DateTime<Utc>,
        output_location: String,
        data_sources: DataSources,
        cluster: ClusterSummary,
        bindings: BindingStats,
        datasets: Datasets,
        classification: OrphanReport,
        source_failures: Vec<SourceFailure>,
    ) -> Self {
        let summary = &classification.summary;
        let counts = AuditCounts {
            images: datasets.images.len(),
            buckets: datasets.buckets.len(),
            subvolumes: datasets.filesystems.subvolumes.len(),
            pools: datasets.pools.len(),
            high_confidence_orphans: summary.high_confidence_images + summary.high_confidence_buckets,
            low_confidence_orphans: summary.medium_confidence_images
                + summary.medium_confidence_buckets,
            bindings,
        };

        Self {
            generated_at,
            output_location,
            tool_version: crate::VERSION.to_string(),
            data_sources,
            cluster,
            counts,
            datasets,
            classification,
            source_failures,
        }
    }

    /// Load a previously written `report.json`
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
