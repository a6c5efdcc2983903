//! Binding Map
//!
//! Normalized index of every Kubernetes object that claims a storage
//! resource. Built once per run from complete listings, before any
//! classification, and read-only afterwards.

use crate::access::kubernetes::IN_TREE_RBD_DRIVER;
use crate::domain::ports::{
    BucketClaimListing, ClaimListing, ClusterInventory, ObjectBucketListing,
    ProvisionerSecretListing, VolumeListing,
};
use crate::domain::records::{BindingKind, BindingRef};
use crate::error::Result;
use crate::normalize::{parse_size, split_volume_handle};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

const RBD_DRIVER_SUFFIX: &str = "rbd.csi.ceph.com";
const CEPHFS_DRIVER_SUFFIX: &str = "cephfs.csi.ceph.com";

// =============================================================================
// Volume Bindings
// =============================================================================

/// One PersistentVolume backed by an RBD image
#[derive(Debug, Clone, PartialEq)]
struct VolumeBinding {
    pv_name: String,
    handle: Option<String>,
    image_name: Option<String>,
    /// `pool/image` parsed from the handle
    parsed: Option<String>,
    claim: Option<String>,
    claim_missing: bool,
}

impl VolumeBinding {
    fn matches(&self, pool: &str, image: &str) -> bool {
        if image.is_empty() {
            return false;
        }
        let key = format!("{}/{}", pool, image);
        if self.parsed.as_deref() == Some(key.as_str()) {
            return true;
        }
        // bare-name substring match kept for handles that predate volumeAttributes
        [self.handle.as_deref(), self.image_name.as_deref()]
            .into_iter()
            .flatten()
            .any(|id| id.contains(image))
    }

    fn to_ref(&self) -> BindingRef {
        BindingRef {
            kind: BindingKind::PersistentVolume,
            namespace: None,
            name: self.pv_name.clone(),
            claim: self.claim.clone(),
            claim_missing: self.claim_missing,
        }
    }
}

// =============================================================================
// Binding Statistics
// =============================================================================

/// Counts of binding sources, reported alongside the inventories
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BindingStats {
    pub persistent_volumes: usize,
    pub rbd_volumes: usize,
    pub cephfs_volumes: usize,
    pub released_volumes: usize,
    pub provisioned_capacity_bytes: u64,
    pub persistent_volume_claims: usize,
    pub bucket_claims: usize,
    pub object_buckets: usize,
    pub provisioner_secrets: usize,
    pub bound_bucket_names: usize,
}

// =============================================================================
// Binding Map
// =============================================================================

/// Read-only index of storage bindings
#[derive(Debug, Clone, Default)]
pub struct BindingMap {
    volumes: Vec<VolumeBinding>,
    buckets: BTreeMap<String, BTreeSet<BindingRef>>,
    stats: BindingStats,
}

impl BindingMap {
    /// List every binding source. Absent resource types arrive as empty
    /// listings; any other listing error aborts the map.
    pub async fn collect(inventory: &dyn ClusterInventory) -> Result<Self> {
        let pvs = inventory.list_persistent_volumes().await?;
        let pvcs = inventory.list_persistent_volume_claims().await?;
        let obcs = inventory.list_object_bucket_claims().await?;
        let obs = inventory.list_object_buckets().await?;
        let secrets = inventory.list_provisioner_secrets().await?;

        let map = Self::from_listings(&pvs, &pvcs, &obcs, &obs, &secrets);
        info!(
            "Binding map: {} RBD volumes, {} bucket names bound",
            map.stats.rbd_volumes, map.stats.bound_bucket_names
        );
        Ok(map)
    }

    /// Build from listings already in hand
    pub fn from_listings(
        pvs: &[VolumeListing],
        pvcs: &[ClaimListing],
        obcs: &[BucketClaimListing],
        obs: &[ObjectBucketListing],
        secrets: &[ProvisionerSecretListing],
    ) -> Self {
        let existing_claims: BTreeSet<(String, String)> = pvcs
            .iter()
            .map(|c| (c.namespace.clone(), c.name.clone()))
            .collect();

        let mut stats = BindingStats {
            persistent_volumes: pvs.len(),
            persistent_volume_claims: pvcs.len(),
            bucket_claims: obcs.len(),
            object_buckets: obs.len(),
            provisioner_secrets: secrets.len(),
            ..Default::default()
        };

        let mut volumes = Vec::new();
        for pv in pvs {
            if pv.phase.as_deref() == Some("Released") {
                stats.released_volumes += 1;
            }
            if let Some(capacity) = pv.capacity.as_deref() {
                stats.provisioned_capacity_bytes = stats
                    .provisioned_capacity_bytes
                    .saturating_add(parse_size(capacity).unwrap_or(0));
            }

            let driver = pv.driver.as_deref().unwrap_or("");
            if driver.ends_with(CEPHFS_DRIVER_SUFFIX) {
                stats.cephfs_volumes += 1;
                continue;
            }
            if !(driver.ends_with(RBD_DRIVER_SUFFIX) || driver == IN_TREE_RBD_DRIVER) {
                continue;
            }
            stats.rbd_volumes += 1;

            let claim = match (&pv.claim_namespace, &pv.claim_name) {
                (Some(ns), Some(name)) => Some((ns.clone(), name.clone())),
                _ => None,
            };
            let claim_missing = claim
                .as_ref()
                .map(|c| !existing_claims.contains(c))
                .unwrap_or(false);

            volumes.push(VolumeBinding {
                pv_name: pv.name.clone(),
                handle: pv.volume_handle.clone(),
                image_name: pv.image_name.clone(),
                parsed: pv
                    .volume_handle
                    .as_deref()
                    .and_then(split_volume_handle)
                    .map(|(pool, image)| format!("{}/{}", pool, image)),
                claim: claim.map(|(ns, name)| format!("{}/{}", ns, name)),
                claim_missing,
            });
        }

        let mut buckets: BTreeMap<String, BTreeSet<BindingRef>> = BTreeMap::new();
        for obc in obcs {
            if let Some(bucket) = &obc.bucket_name {
                buckets.entry(bucket.clone()).or_default().insert(BindingRef {
                    kind: BindingKind::ObjectBucketClaim,
                    namespace: Some(obc.namespace.clone()),
                    name: obc.name.clone(),
                    claim: None,
                    claim_missing: false,
                });
            }
        }
        for ob in obs {
            if let Some(bucket) = &ob.bucket_name {
                let claim = match (&ob.claim_namespace, &ob.claim_name) {
                    (Some(ns), Some(name)) => Some(format!("{}/{}", ns, name)),
                    _ => None,
                };
                buckets.entry(bucket.clone()).or_default().insert(BindingRef {
                    kind: BindingKind::ObjectBucket,
                    namespace: None,
                    name: ob.name.clone(),
                    claim,
                    claim_missing: false,
                });
            }
        }
        for secret in secrets {
            match &secret.bucket_name {
                Some(bucket) => {
                    buckets.entry(bucket.clone()).or_default().insert(BindingRef {
                        kind: BindingKind::ProvisionerSecret,
                        namespace: Some(secret.namespace.clone()),
                        name: secret.name.clone(),
                        claim: None,
                        claim_missing: false,
                    });
                }
                None => debug!(
                    "Secret {}/{} carries no bucket name",
                    secret.namespace, secret.name
                ),
            }
        }
        stats.bound_bucket_names = buckets.len();

        Self {
            volumes,
            buckets,
            stats,
        }
    }

    /// PersistentVolumes claiming `pool/image`, sorted by PV name
    pub fn image_bindings(&self, pool: &str, image: &str) -> Vec<BindingRef> {
        let mut refs: Vec<BindingRef> = self
            .volumes
            .iter()
            .filter(|v| v.matches(pool, image))
            .map(VolumeBinding::to_ref)
            .collect();
        refs.sort();
        refs.dedup();
        refs
    }

    /// Claims, buckets and secrets naming `bucket`, from every source
    pub fn bucket_bindings(&self, bucket: &str) -> Vec<BindingRef> {
        self.buckets
            .get(bucket)
            .map(|refs| refs.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn stats(&self) -> &BindingStats {
        &self.stats
    }
}
