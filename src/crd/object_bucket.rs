//! Object bucket provisioning CRDs
//!
//! Read-only bindings for `objectbucket.io/v1alpha1` ObjectBucketClaim
//! (namespaced) and ObjectBucket (cluster-scoped). Only the fields the audit
//! reads are modelled; everything else is ignored on deserialization.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// =============================================================================
// ObjectBucketClaim
// =============================================================================

/// A namespaced request for a bucket
#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "objectbucket.io",
    version = "v1alpha1",
    kind = "ObjectBucketClaim",
    plural = "objectbucketclaims",
    shortname = "obc",
    status = "ObjectBucketClaimStatus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ObjectBucketClaimSpec {
    /// Bucket name, set explicitly or filled in once provisioned
    #[serde(default)]
    pub bucket_name: Option<String>,

    /// Prefix for generated bucket names
    #[serde(default)]
    pub generate_bucket_name: Option<String>,

    #[serde(default)]
    pub storage_class_name: Option<String>,

    /// Name of the bound ObjectBucket
    #[serde(default)]
    pub object_bucket_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObjectBucketClaimStatus {
    #[serde(default)]
    pub phase: Option<String>,
}

// =============================================================================
// ObjectBucket
// =============================================================================

/// A provisioned bucket, back-referencing its claim
#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "objectbucket.io",
    version = "v1alpha1",
    kind = "ObjectBucket",
    plural = "objectbuckets",
    shortname = "ob"
)]
#[serde(rename_all = "camelCase")]
pub struct ObjectBucketSpec {
    #[serde(default)]
    pub storage_class_name: Option<String>,

    #[serde(default)]
    pub claim_ref: Option<ClaimReference>,

    #[serde(default)]
    pub endpoint: Option<BucketEndpoint>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClaimReference {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BucketEndpoint {
    #[serde(default)]
    pub bucket_host: Option<String>,
    #[serde(default)]
    pub bucket_name: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_obc() {
        let obc: ObjectBucketClaim = serde_json::from_value(serde_json::json!({
            "apiVersion": "objectbucket.io/v1alpha1",
            "kind": "ObjectBucketClaim",
            "metadata": {"name": "uploads", "namespace": "app"},
            "spec": {
                "bucketName": "uploads-5f1c",
                "storageClassName": "ocs-storagecluster-ceph-rgw",
                "additionalConfig": {"maxObjects": "1000"}
            },
            "status": {"phase": "Bound"}
        }))
        .unwrap();

        assert_eq!(obc.spec.bucket_name.as_deref(), Some("uploads-5f1c"));
        assert_eq!(
            obc.status.and_then(|s| s.phase).as_deref(),
            Some("Bound")
        );
    }

    #[test]
    fn test_deserialize_ob() {
        let ob: ObjectBucket = serde_json::from_value(serde_json::json!({
            "apiVersion": "objectbucket.io/v1alpha1",
            "kind": "ObjectBucket",
            "metadata": {"name": "obc-app-uploads"},
            "spec": {
                "claimRef": {"name": "uploads", "namespace": "app"},
                "endpoint": {"bucketHost": "rgw.svc", "bucketName": "uploads-5f1c"}
            }
        }))
        .unwrap();

        let endpoint = ob.spec.endpoint.unwrap();
        assert_eq!(endpoint.bucket_name.as_deref(), Some("uploads-5f1c"));
        assert_eq!(ob.spec.claim_ref.unwrap().namespace.as_deref(), Some("app"));
    }
}
