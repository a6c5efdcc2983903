//! Domain Ports - Trait definitions for the audit's external collaborators
//!
//! The metrics backend, the storage cluster's administrative interface and
//! the Kubernetes control plane are all reached through these traits, so the
//! engine can run against in-memory fakes.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

// =============================================================================
// Metrics Types
// =============================================================================

/// Where the metrics endpoint was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointSource {
    /// Supplied on the command line or in the config file
    Explicit,
    /// Primary: externally exposed route
    Route,
    /// Secondary: in-cluster service
    Service,
}

impl std::fmt::Display for EndpointSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndpointSource::Explicit => write!(f, "explicit"),
            EndpointSource::Route => write!(f, "route"),
            EndpointSource::Service => write!(f, "service"),
        }
    }
}

/// A resolved metrics endpoint
#[derive(Debug, Clone)]
pub struct MetricsEndpoint {
    /// Base URL without trailing slash
    pub url: String,
    /// Bearer token (never serialized)
    pub token: Option<String>,
    /// How the endpoint was found
    pub source: EndpointSource,
}

/// Prometheus-style query response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimeSeriesResult {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub data: Option<TimeSeriesData>,
    #[serde(default)]
    pub error: Option<String>,
}

impl TimeSeriesResult {
    /// True when the backend reported success
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Payload of a query response. `result` stays untyped because its shape
/// depends on `result_type` (vector, matrix, scalar).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesData {
    #[serde(default)]
    pub result_type: String,
    #[serde(default)]
    pub result: serde_json::Value,
}

// =============================================================================
// Storage Cluster Types
// =============================================================================

/// `ceph status`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CephStatus {
    #[serde(default)]
    pub fsid: String,
    #[serde(default)]
    pub health: CephHealth,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CephHealth {
    #[serde(default)]
    pub status: String,
}

/// `ceph df`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CephDf {
    #[serde(default)]
    pub stats: CephDfStats,
    #[serde(default)]
    pub pools: Vec<CephDfPool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CephDfStats {
    #[serde(default)]
    pub total_bytes: u64,
    #[serde(default)]
    pub total_used_raw_bytes: u64,
    #[serde(default)]
    pub total_avail_bytes: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CephDfPool {
    pub name: String,
    #[serde(default)]
    pub id: u64,
    /// Raw usage fields; the set present varies between releases
    #[serde(default)]
    pub stats: BTreeMap<String, serde_json::Value>,
}

/// `rbd info`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RbdImageInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: u64,
}

/// `rbd status`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RbdImageStatus {
    #[serde(default)]
    pub watchers: Vec<RbdWatcher>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RbdWatcher {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub client: serde_json::Value,
}

/// `radosgw-admin bucket stats --bucket`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RgwBucketStats {
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub owner: Option<String>,
    /// Keyed by storage category (`rgw.main`, `rgw.multimeta`, ...)
    #[serde(default)]
    pub usage: BTreeMap<String, RgwUsage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RgwUsage {
    #[serde(default)]
    pub size_actual: Option<u64>,
    #[serde(default)]
    pub size_kb_actual: Option<u64>,
    #[serde(default)]
    pub num_objects: Option<u64>,
}

/// `ceph fs ls`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CephFilesystem {
    pub name: String,
    #[serde(default)]
    pub metadata_pool: String,
    #[serde(default)]
    pub data_pools: Vec<String>,
}

/// Entry of `ceph fs subvolumegroup ls` / `ceph fs subvolume ls`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamedEntry {
    pub name: String,
}

/// `ceph fs subvolume info`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubvolumeInfo {
    /// Number of bytes, or the string "infinite"
    #[serde(default)]
    pub bytes_quota: serde_json::Value,
    #[serde(default)]
    pub bytes_used: u64,
    #[serde(default)]
    pub state: Option<String>,
}

// =============================================================================
// Kubernetes Listing Types
// =============================================================================

/// Flattened PersistentVolume
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeListing {
    pub name: String,
    /// CSI driver name, or "kubernetes.io/rbd" for in-tree volumes
    pub driver: Option<String>,
    pub volume_handle: Option<String>,
    /// `volumeAttributes.imageName` or in-tree `rbd.image`
    pub image_name: Option<String>,
    /// `volumeAttributes.pool` or in-tree `rbd.pool`
    pub pool: Option<String>,
    /// `volumeAttributes.subvolumeName` for CephFS volumes
    pub subvolume_name: Option<String>,
    pub claim_namespace: Option<String>,
    pub claim_name: Option<String>,
    pub phase: Option<String>,
    pub capacity: Option<String>,
    pub storage_class: Option<String>,
}

/// Flattened PersistentVolumeClaim
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimListing {
    pub namespace: String,
    pub name: String,
    pub volume_name: Option<String>,
    pub phase: Option<String>,
    pub storage_class: Option<String>,
}

/// Flattened ObjectBucketClaim
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketClaimListing {
    pub namespace: String,
    pub name: String,
    pub bucket_name: Option<String>,
    pub storage_class: Option<String>,
    pub phase: Option<String>,
}

/// Flattened ObjectBucket
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectBucketListing {
    pub name: String,
    pub bucket_name: Option<String>,
    pub claim_namespace: Option<String>,
    pub claim_name: Option<String>,
}

/// Secret created by the bucket provisioner
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProvisionerSecretListing {
    pub namespace: String,
    pub name: String,
    pub bucket_name: Option<String>,
}

// =============================================================================
// Metrics Backend Port
// =============================================================================

/// Time-series metrics backend
#[async_trait]
pub trait MetricsBackend: Send + Sync {
    /// Resolve (or return the cached) endpoint. Fatal when unreachable.
    async fn endpoint(&self) -> Result<MetricsEndpoint>;

    /// Point-in-time query, retried on transport or status failure
    async fn query_instant(&self, expr: &str) -> Result<TimeSeriesResult>;

    /// Range query, single attempt
    async fn query_range(
        &self,
        expr: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        step: Duration,
    ) -> Result<TimeSeriesResult>;
}

// =============================================================================
// Storage Admin Port
// =============================================================================

/// Administrative interface of the storage cluster.
///
/// Listing methods return an empty collection when the subsystem is absent.
#[async_trait]
pub trait StorageAdmin: Send + Sync {
    /// Command prefix a human uses to reach the same interface
    fn command_prefix(&self) -> String;

    async fn cluster_status(&self) -> Result<CephStatus>;

    async fn cluster_df(&self) -> Result<CephDf>;

    async fn list_pools(&self) -> Result<Vec<String>>;

    async fn list_images(&self, pool: &str) -> Result<Vec<String>>;

    async fn image_info(&self, pool: &str, image: &str) -> Result<RbdImageInfo>;

    async fn image_status(&self, pool: &str, image: &str) -> Result<RbdImageStatus>;

    async fn list_buckets(&self) -> Result<Vec<String>>;

    async fn bucket_stats(&self, bucket: &str) -> Result<RgwBucketStats>;

    async fn list_filesystems(&self) -> Result<Vec<CephFilesystem>>;

    async fn list_subvolume_groups(&self, fs: &str) -> Result<Vec<NamedEntry>>;

    async fn list_subvolumes(&self, fs: &str, group: &str) -> Result<Vec<NamedEntry>>;

    async fn subvolume_info(&self, fs: &str, group: &str, name: &str) -> Result<SubvolumeInfo>;
}

// =============================================================================
// Cluster Inventory Port
// =============================================================================

/// Kubernetes resources that bind storage.
///
/// Every listing is complete (never paginated). A resource type that is not
/// installed yields an empty collection.
#[async_trait]
pub trait ClusterInventory: Send + Sync {
    async fn list_persistent_volumes(&self) -> Result<Vec<VolumeListing>>;

    async fn list_persistent_volume_claims(&self) -> Result<Vec<ClaimListing>>;

    async fn list_object_bucket_claims(&self) -> Result<Vec<BucketClaimListing>>;

    async fn list_object_buckets(&self) -> Result<Vec<ObjectBucketListing>>;

    async fn list_provisioner_secrets(&self) -> Result<Vec<ProvisionerSecretListing>>;
}
