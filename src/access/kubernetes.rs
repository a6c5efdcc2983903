//! Kubernetes Inventory Adapter
//!
//! Lists the objects that bind storage. Listings are never paginated. A
//! resource type the API server does not know (404) is treated as empty.
//!
//! The bucket provisioner writes `BUCKET_NAME` into a ConfigMap that shares
//! its name with the credentials Secret; both are read and merged.

use crate::crd::{ObjectBucket, ObjectBucketClaim};
use crate::domain::ports::{
    BucketClaimListing, ClaimListing, ClusterInventory, ObjectBucketListing,
    ProvisionerSecretListing, VolumeListing,
};
use crate::error::{Error, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolume, PersistentVolumeClaim, Secret};
use kube::api::{Api, ListParams};
use kube::{Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fmt::Debug;
use tracing::{debug, warn};

/// Driver discriminator recorded for in-tree RBD volumes
pub const IN_TREE_RBD_DRIVER: &str = "kubernetes.io/rbd";

/// Data key carrying the provisioned bucket name
const SECRET_BUCKET_KEY: &str = "BUCKET_NAME";
const SECRET_BUCKET_LABEL: &str = "bucket-name";

// =============================================================================
// Kube Inventory
// =============================================================================

/// Cluster inventory backed by the Kubernetes API
pub struct KubeInventory {
    client: Client,
    secret_label: String,
}

impl KubeInventory {
    pub fn new(client: Client, secret_label: impl Into<String>) -> Self {
        Self {
            client,
            secret_label: secret_label.into(),
        }
    }

    async fn list_tolerant<K>(&self, kind: &str, params: &ListParams) -> Result<Vec<K>>
    where
        K: Resource + Clone + DeserializeOwned + Debug,
        K::DynamicType: Default,
    {
        let api: Api<K> = Api::all(self.client.clone());
        tolerate_missing_kind(kind, api.list(params).await.map(|list| list.items))
    }
}

/// Map a listing outcome, turning "resource type not served" into empty
fn tolerate_missing_kind<K>(
    kind: &str,
    outcome: std::result::Result<Vec<K>, kube::Error>,
) -> Result<Vec<K>> {
    match outcome {
        Ok(items) => {
            debug!("Listed {} {}", items.len(), kind);
            Ok(items)
        }
        Err(kube::Error::Api(resp)) if resp.code == 404 => {
            warn!("{} not served by the API server; treating as empty", kind);
            Ok(Vec::new())
        }
        Err(e) => Err(Error::Kube(e)),
    }
}

#[async_trait]
impl ClusterInventory for KubeInventory {
    async fn list_persistent_volumes(&self) -> Result<Vec<VolumeListing>> {
        let pvs: Vec<PersistentVolume> = self
            .list_tolerant("PersistentVolumes", &ListParams::default())
            .await?;
        Ok(pvs.iter().map(volume_listing).collect())
    }

    async fn list_persistent_volume_claims(&self) -> Result<Vec<ClaimListing>> {
        let pvcs: Vec<PersistentVolumeClaim> = self
            .list_tolerant("PersistentVolumeClaims", &ListParams::default())
            .await?;
        Ok(pvcs.iter().map(claim_listing).collect())
    }

    async fn list_object_bucket_claims(&self) -> Result<Vec<BucketClaimListing>> {
        let obcs: Vec<ObjectBucketClaim> = self
            .list_tolerant("ObjectBucketClaims", &ListParams::default())
            .await?;
        Ok(obcs.iter().map(bucket_claim_listing).collect())
    }

    async fn list_object_buckets(&self) -> Result<Vec<ObjectBucketListing>> {
        let obs: Vec<ObjectBucket> = self
            .list_tolerant("ObjectBuckets", &ListParams::default())
            .await?;
        Ok(obs.iter().map(object_bucket_listing).collect())
    }

    async fn list_provisioner_secrets(&self) -> Result<Vec<ProvisionerSecretListing>> {
        let params = ListParams::default().labels(&self.secret_label);
        let secrets: Vec<Secret> = self.list_tolerant("Secrets", &params).await?;
        let config_maps: Vec<ConfigMap> = self.list_tolerant("ConfigMaps", &params).await?;
        Ok(provisioner_listings(&secrets, &config_maps))
    }
}

// =============================================================================
// Flattening
// =============================================================================

pub fn volume_listing(pv: &PersistentVolume) -> VolumeListing {
    let mut listing = VolumeListing {
        name: pv.name_any(),
        phase: pv.status.as_ref().and_then(|s| s.phase.clone()),
        ..Default::default()
    };

    let Some(spec) = &pv.spec else {
        return listing;
    };

    listing.storage_class = spec.storage_class_name.clone();
    listing.capacity = spec
        .capacity
        .as_ref()
        .and_then(|c| c.get("storage"))
        .map(|q| q.0.clone());

    if let Some(claim) = &spec.claim_ref {
        listing.claim_namespace = claim.namespace.clone();
        listing.claim_name = claim.name.clone();
    }

    if let Some(csi) = &spec.csi {
        listing.driver = Some(csi.driver.clone());
        listing.volume_handle = Some(csi.volume_handle.clone());
        if let Some(attrs) = &csi.volume_attributes {
            listing.image_name = attrs.get("imageName").cloned();
            listing.pool = attrs.get("pool").cloned();
            listing.subvolume_name = attrs.get("subvolumeName").cloned();
        }
    } else if let Some(rbd) = &spec.rbd {
        listing.driver = Some(IN_TREE_RBD_DRIVER.to_string());
        listing.image_name = Some(rbd.image.clone());
        listing.pool = rbd.pool.clone();
    }

    listing
}

pub fn claim_listing(pvc: &PersistentVolumeClaim) -> ClaimListing {
    ClaimListing {
        namespace: pvc.namespace().unwrap_or_default(),
        name: pvc.name_any(),
        volume_name: pvc.spec.as_ref().and_then(|s| s.volume_name.clone()),
        phase: pvc.status.as_ref().and_then(|s| s.phase.clone()),
        storage_class: pvc.spec.as_ref().and_then(|s| s.storage_class_name.clone()),
    }
}

pub fn bucket_claim_listing(obc: &ObjectBucketClaim) -> BucketClaimListing {
    BucketClaimListing {
        namespace: obc.namespace().unwrap_or_default(),
        name: obc.name_any(),
        bucket_name: obc.spec.bucket_name.clone().filter(|b| !b.is_empty()),
        storage_class: obc.spec.storage_class_name.clone(),
        phase: obc.status.as_ref().and_then(|s| s.phase.clone()),
    }
}

pub fn object_bucket_listing(ob: &ObjectBucket) -> ObjectBucketListing {
    let claim = ob.spec.claim_ref.as_ref();
    ObjectBucketListing {
        name: ob.name_any(),
        bucket_name: ob
            .spec
            .endpoint
            .as_ref()
            .and_then(|e| e.bucket_name.clone())
            .filter(|b| !b.is_empty()),
        claim_namespace: claim.and_then(|c| c.namespace.clone()),
        claim_name: claim.and_then(|c| c.name.clone()),
    }
}

/// Secrets and ConfigMaps from the bucket provisioner, one listing per
/// `namespace/name`. A Secret without a bucket name takes it from its
/// same-named ConfigMap.
pub fn provisioner_listings(
    secrets: &[Secret],
    config_maps: &[ConfigMap],
) -> Vec<ProvisionerSecretListing> {
    let mut merged: BTreeMap<(String, String), ProvisionerSecretListing> = BTreeMap::new();

    for listing in secrets.iter().map(secret_listing) {
        merged.insert((listing.namespace.clone(), listing.name.clone()), listing);
    }
    for listing in config_maps.iter().map(config_map_listing) {
        let key = (listing.namespace.clone(), listing.name.clone());
        match merged.get_mut(&key) {
            Some(existing) if existing.bucket_name.is_none() => {
                existing.bucket_name = listing.bucket_name;
            }
            Some(_) => {}
            None => {
                merged.insert(key, listing);
            }
        }
    }

    merged.into_values().collect()
}

pub fn config_map_listing(config_map: &ConfigMap) -> ProvisionerSecretListing {
    let from_data = config_map
        .data
        .as_ref()
        .and_then(|d| d.get(SECRET_BUCKET_KEY))
        .cloned();
    let from_label = config_map.labels().get(SECRET_BUCKET_LABEL).cloned();

    ProvisionerSecretListing {
        namespace: config_map.namespace().unwrap_or_default(),
        name: config_map.name_any(),
        bucket_name: from_data
            .or(from_label)
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty()),
    }
}

pub fn secret_listing(secret: &Secret) -> ProvisionerSecretListing {
    let from_data = secret
        .data
        .as_ref()
        .and_then(|d| d.get(SECRET_BUCKET_KEY))
        .and_then(|v| String::from_utf8(v.0.clone()).ok());
    let from_label = secret.labels().get(SECRET_BUCKET_LABEL).cloned();

    ProvisionerSecretListing {
        namespace: secret.namespace().unwrap_or_default(),
        name: secret.name_any(),
        bucket_name: from_data
            .or(from_label)
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::test_http::serve;
    use assert_matches::assert_matches;
    use k8s_openapi::api::core::v1::{
        CSIPersistentVolumeSource, ObjectReference, PersistentVolumeSpec, PersistentVolumeStatus,
        RBDPersistentVolumeSource,
    };
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use k8s_openapi::ByteString;
    use std::collections::BTreeMap;

    fn csi_pv() -> PersistentVolume {
        let mut attrs = BTreeMap::new();
        attrs.insert("imageName".to_string(), "csi-vol-1234".to_string());
        attrs.insert("pool".to_string(), "ocs-storagecluster-cephblockpool".to_string());

        PersistentVolume {
            metadata: ObjectMeta {
                name: Some("pvc-abc".into()),
                ..Default::default()
            },
            spec: Some(PersistentVolumeSpec {
                capacity: Some(BTreeMap::from([(
                    "storage".to_string(),
                    Quantity("10Gi".into()),
                )])),
                claim_ref: Some(ObjectReference {
                    name: Some("data".into()),
                    namespace: Some("app".into()),
                    ..Default::default()
                }),
                csi: Some(CSIPersistentVolumeSource {
                    driver: "openshift-storage.rbd.csi.ceph.com".into(),
                    volume_handle: "0001-0011-openshift-storage-0000000000000001-1234".into(),
                    volume_attributes: Some(attrs),
                    ..Default::default()
                }),
                storage_class_name: Some("ocs-storagecluster-ceph-rbd".into()),
                ..Default::default()
            }),
            status: Some(PersistentVolumeStatus {
                phase: Some("Bound".into()),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_volume_listing_csi() {
        let listing = volume_listing(&csi_pv());
        assert_eq!(listing.name, "pvc-abc");
        assert_eq!(listing.driver.as_deref(), Some("openshift-storage.rbd.csi.ceph.com"));
        assert_eq!(listing.image_name.as_deref(), Some("csi-vol-1234"));
        assert_eq!(listing.pool.as_deref(), Some("ocs-storagecluster-cephblockpool"));
        assert_eq!(listing.claim_namespace.as_deref(), Some("app"));
        assert_eq!(listing.claim_name.as_deref(), Some("data"));
        assert_eq!(listing.capacity.as_deref(), Some("10Gi"));
        assert_eq!(listing.phase.as_deref(), Some("Bound"));
    }

    #[test]
    fn test_volume_listing_in_tree_rbd() {
        let pv = PersistentVolume {
            metadata: ObjectMeta {
                name: Some("legacy".into()),
                ..Default::default()
            },
            spec: Some(PersistentVolumeSpec {
                rbd: Some(RBDPersistentVolumeSource {
                    image: "kubernetes-dynamic-pvc-1".into(),
                    pool: Some("rbd".into()),
                    monitors: vec!["10.0.0.1:6789".into()],
                    ..Default::default()
                }),
                ..Default::default()
            }),
            status: None,
        };

        let listing = volume_listing(&pv);
        assert_eq!(listing.driver.as_deref(), Some(IN_TREE_RBD_DRIVER));
        assert_eq!(listing.image_name.as_deref(), Some("kubernetes-dynamic-pvc-1"));
        assert_eq!(listing.volume_handle, None);
    }

    #[test]
    fn test_secret_listing_prefers_data() {
        let secret = Secret {
            metadata: ObjectMeta {
                name: Some("uploads".into()),
                namespace: Some("app".into()),
                labels: Some(BTreeMap::from([
                    ("bucket-provisioner".to_string(), "openshift-storage.ceph.rook.io-bucket".to_string()),
                    ("bucket-name".to_string(), "from-label".to_string()),
                ])),
                ..Default::default()
            },
            data: Some(BTreeMap::from([(
                "BUCKET_NAME".to_string(),
                ByteString(b"uploads-5f1c\n".to_vec()),
            )])),
            ..Default::default()
        };

        let listing = secret_listing(&secret);
        assert_eq!(listing.namespace, "app");
        assert_eq!(listing.bucket_name.as_deref(), Some("uploads-5f1c"));
    }

    fn provisioner_meta(name: &str) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.into()),
            namespace: Some("app".into()),
            labels: Some(BTreeMap::from([(
                "bucket-provisioner".to_string(),
                "openshift-storage.ceph.rook.io-bucket".to_string(),
            )])),
            ..Default::default()
        }
    }

    #[test]
    fn test_bucket_name_from_config_map() {
        // credentials-only secret, as the provisioner writes it
        let secrets = vec![Secret {
            metadata: provisioner_meta("uploads"),
            data: Some(BTreeMap::from([
                ("AWS_ACCESS_KEY_ID".to_string(), ByteString(b"AKIA".to_vec())),
                ("AWS_SECRET_ACCESS_KEY".to_string(), ByteString(b"s3cr3t".to_vec())),
            ])),
            ..Default::default()
        }];
        let config_maps = vec![
            ConfigMap {
                metadata: provisioner_meta("uploads"),
                data: Some(BTreeMap::from([
                    ("BUCKET_NAME".to_string(), "uploads-5f1c".to_string()),
                    ("BUCKET_HOST".to_string(), "rook-ceph-rgw.openshift-storage.svc".to_string()),
                ])),
                ..Default::default()
            },
            ConfigMap {
                metadata: provisioner_meta("archive"),
                data: Some(BTreeMap::from([(
                    "BUCKET_NAME".to_string(),
                    "archive-9d2e".to_string(),
                )])),
                ..Default::default()
            },
        ];

        let listings = provisioner_listings(&secrets, &config_maps);
        let names: Vec<_> = listings
            .iter()
            .map(|l| (l.name.as_str(), l.bucket_name.as_deref()))
            .collect();
        assert_eq!(
            names,
            vec![("archive", Some("archive-9d2e")), ("uploads", Some("uploads-5f1c"))]
        );
    }

    #[test]
    fn test_secret_bucket_name_wins_over_config_map() {
        let secrets = vec![Secret {
            metadata: provisioner_meta("uploads"),
            data: Some(BTreeMap::from([(
                "BUCKET_NAME".to_string(),
                ByteString(b"from-secret".to_vec()),
            )])),
            ..Default::default()
        }];
        let config_maps = vec![ConfigMap {
            metadata: provisioner_meta("uploads"),
            data: Some(BTreeMap::from([(
                "BUCKET_NAME".to_string(),
                "from-config-map".to_string(),
            )])),
            ..Default::default()
        }];

        let listings = provisioner_listings(&secrets, &config_maps);
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].bucket_name.as_deref(), Some("from-secret"));
    }

    #[test]
    fn test_missing_kind_is_empty() {
        let not_served = kube::Error::Api(kube::core::ErrorResponse {
            status: "Failure".into(),
            message: "the server could not find the requested resource".into(),
            reason: "NotFound".into(),
            code: 404,
        });
        let items: Vec<Secret> = tolerate_missing_kind("ObjectBucketClaims", Err(not_served)).unwrap();
        assert!(items.is_empty());

        let forbidden = kube::Error::Api(kube::core::ErrorResponse {
            status: "Failure".into(),
            message: "secrets is forbidden".into(),
            reason: "Forbidden".into(),
            code: 403,
        });
        assert_matches!(
            tolerate_missing_kind::<Secret>("Secrets", Err(forbidden)),
            Err(Error::Kube(_))
        );
    }

    #[tokio::test]
    async fn test_inventory_against_api_server() {
        let (url, _) = serve(|line, _| {
            if line.contains("/apis/objectbucket.io/") {
                (
                    404,
                    r#"{"kind":"Status","apiVersion":"v1","metadata":{},"status":"Failure","message":"the server could not find the requested resource","reason":"NotFound","code":404}"#
                        .to_string(),
                )
            } else if line.contains("/api/v1/persistentvolumes") {
                (
                    200,
                    r#"{"apiVersion":"v1","kind":"PersistentVolumeList","metadata":{"resourceVersion":"1"},"items":[]}"#
                        .to_string(),
                )
            } else {
                (
                    403,
                    r#"{"kind":"Status","apiVersion":"v1","metadata":{},"status":"Failure","message":"forbidden","reason":"Forbidden","code":403}"#
                        .to_string(),
                )
            }
        })
        .await;
        let client = Client::try_from(kube::Config::new(url.parse().unwrap())).unwrap();
        let inventory = KubeInventory::new(client, "bucket-provisioner");

        assert!(inventory.list_persistent_volumes().await.unwrap().is_empty());
        assert!(inventory.list_object_bucket_claims().await.unwrap().is_empty());
        assert!(inventory.list_object_buckets().await.unwrap().is_empty());
        assert_matches!(
            inventory.list_provisioner_secrets().await,
            Err(Error::Kube(_))
        );
    }

    #[test]
    fn test_secret_listing_without_bucket() {
        let secret = Secret {
            metadata: ObjectMeta {
                name: Some("creds".into()),
                namespace: Some("app".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(secret_listing(&secret).bucket_name, None);
    }
}
