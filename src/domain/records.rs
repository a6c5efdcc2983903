//! Resource records produced by the inventory builders
//!
//! Records are built fresh on every run and never mutated afterwards.
//! Defaulting rules: a detail that could not be resolved reads as `0`
//! (sizes, counts) or `"unknown"` (owner), and the matching `*_resolved`
//! flag is `false` so the classifier can stay conservative.

use serde::{Deserialize, Serialize};

// =============================================================================
// Identity
// =============================================================================

/// Identity of a storage-backend resource
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceIdentity {
    Image { pool: String, name: String },
    Bucket { name: String },
    Subvolume { filesystem: String, group: String, name: String },
}

impl std::fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceIdentity::Image { pool, name } => write!(f, "{}/{}", pool, name),
            ResourceIdentity::Bucket { name } => write!(f, "{}", name),
            ResourceIdentity::Subvolume {
                filesystem,
                group,
                name,
            } => write!(f, "{}:{}/{}", filesystem, group, name),
        }
    }
}

// =============================================================================
// Binding References
// =============================================================================

/// Kind of Kubernetes object that claims a storage resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum BindingKind {
    PersistentVolume,
    ObjectBucketClaim,
    ObjectBucket,
    ProvisionerSecret,
}

impl std::fmt::Display for BindingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindingKind::PersistentVolume => write!(f, "pv"),
            BindingKind::ObjectBucketClaim => write!(f, "obc"),
            BindingKind::ObjectBucket => write!(f, "ob"),
            BindingKind::ProvisionerSecret => write!(f, "secret"),
        }
    }
}

/// One Kubernetes object claiming a storage resource
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BindingRef {
    pub kind: BindingKind,
    #[serde(default)]
    pub namespace: Option<String>,
    pub name: String,
    /// Claim the binding points back to (`namespace/name`), if any
    #[serde(default)]
    pub claim: Option<String>,
    /// The PV names a claim that no longer exists
    #[serde(default)]
    pub claim_missing: bool,
}

impl BindingRef {
    pub fn display_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}:{}/{}", self.kind, ns, self.name),
            None => format!("{}:{}", self.kind, self.name),
        }
    }
}

// =============================================================================
// Block Images
// =============================================================================

/// One RBD image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub pool: String,
    pub name: String,
    /// Provisioned size; `0` when `rbd info` failed
    pub size_bytes: u64,
    /// `rbd info` answered, so `size_bytes` is authoritative
    pub size_resolved: bool,
    /// Active watchers; `0` when `rbd status` failed
    pub watcher_count: u32,
    /// `rbd status` answered, so `watcher_count` is authoritative
    pub status_resolved: bool,
    pub has_binding: bool,
    pub looks_like_test_artifact: bool,
    #[serde(default)]
    pub bindings: Vec<BindingRef>,
    /// Per-image detail queries that failed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub detail_errors: Vec<String>,
}

impl ImageRecord {
    pub fn identity(&self) -> ResourceIdentity {
        ResourceIdentity::Image {
            pool: self.pool.clone(),
            name: self.name.clone(),
        }
    }

    pub fn spec(&self) -> String {
        format!("{}/{}", self.pool, self.name)
    }
}

// =============================================================================
// Buckets
// =============================================================================

pub const UNKNOWN_OWNER: &str = "unknown";

/// One object-storage bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketRecord {
    pub name: String,
    /// `"unknown"` when stats failed
    pub owner: String,
    pub object_count: u64,
    pub size_bytes: u64,
    pub stats_resolved: bool,
    pub has_binding: bool,
    pub logging_related: bool,
    #[serde(default)]
    pub bindings: Vec<BindingRef>,
}

impl BucketRecord {
    pub fn identity(&self) -> ResourceIdentity {
        ResourceIdentity::Bucket {
            name: self.name.clone(),
        }
    }
}

// =============================================================================
// Filesystem Subvolumes
// =============================================================================

/// One CephFS subvolume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubvolumeRecord {
    pub filesystem: String,
    pub group: String,
    pub name: String,
    /// `None` means no quota ("infinite") or unresolved
    pub quota_bytes: Option<u64>,
    pub used_bytes: u64,
}

impl SubvolumeRecord {
    pub fn identity(&self) -> ResourceIdentity {
        ResourceIdentity::Subvolume {
            filesystem: self.filesystem.clone(),
            group: self.group.clone(),
            name: self.name.clone(),
        }
    }
}

/// Subvolume group with its member count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubvolumeGroupRecord {
    pub filesystem: String,
    pub name: String,
    pub subvolume_count: usize,
    pub used_bytes: u64,
}

// =============================================================================
// Pools
// =============================================================================

/// Pool usage, normalized to bytes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolUsageEntry {
    pub name: String,
    pub used_bytes: u64,
    pub stored_bytes: u64,
    pub max_avail_bytes: u64,
    pub suspected_test_pool: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_display() {
        let image = ResourceIdentity::Image {
            pool: "rbdpool".into(),
            name: "csi-vol-1".into(),
        };
        assert_eq!(image.to_string(), "rbdpool/csi-vol-1");

        let subvol = ResourceIdentity::Subvolume {
            filesystem: "fs1".into(),
            group: "csi".into(),
            name: "sv".into(),
        };
        assert_eq!(subvol.to_string(), "fs1:csi/sv");
    }

    #[test]
    fn test_binding_display_name() {
        let pv = BindingRef {
            kind: BindingKind::PersistentVolume,
            namespace: None,
            name: "pvc-123".into(),
            claim: Some("app/data".into()),
            claim_missing: false,
        };
        assert_eq!(pv.display_name(), "pv:pvc-123");

        let obc = BindingRef {
            kind: BindingKind::ObjectBucketClaim,
            namespace: Some("app".into()),
            name: "uploads".into(),
            claim: None,
            claim_missing: false,
        };
        assert_eq!(obc.display_name(), "obc:app/uploads");
    }
}
