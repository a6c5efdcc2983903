//! Audit configuration
//!
//! Defaults target an OpenShift Data Foundation install. A YAML file can
//! override any subset of fields; command-line flags override the file.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// =============================================================================
// Storage Cluster Access
// =============================================================================

/// How to reach the storage cluster's administrative tools
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Namespace of the storage operator
    pub namespace: String,
    /// Deployment running the ceph toolbox
    pub toolbox_deployment: String,
    /// Cluster CLI used to exec into the toolbox
    pub kubectl: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            namespace: "openshift-storage".to_string(),
            toolbox_deployment: "rook-ceph-tools".to_string(),
            kubectl: "kubectl".to_string(),
        }
    }
}

// =============================================================================
// Metrics Backend
// =============================================================================

/// Metrics endpoint discovery and query behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Skip discovery and use this URL
    pub url: Option<String>,
    /// Bearer token; skips token discovery
    pub token: Option<String>,
    /// Namespace of the primary route
    pub route_namespace: String,
    /// Name of the primary route
    pub route_name: String,
    /// Secondary in-cluster service URL
    pub service_url: String,
    /// Service-account token file used in-cluster
    pub token_file: PathBuf,
    /// CLI that prints the current session token (`oc whoami -t`)
    pub token_command: Vec<String>,
    /// Accept self-signed certificates
    pub insecure_skip_tls_verify: bool,
    /// Total attempts for an instant query
    pub retry_attempts: u32,
    /// Fixed delay between attempts
    #[serde(with = "seconds")]
    pub retry_delay: Duration,
    /// Window for the capacity trend range query
    #[serde(with = "seconds")]
    pub trend_window: Duration,
    /// Step for the capacity trend range query
    #[serde(with = "seconds")]
    pub trend_step: Duration,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            route_namespace: "openshift-monitoring".to_string(),
            route_name: "thanos-querier".to_string(),
            service_url: "https://thanos-querier.openshift-monitoring.svc:9091".to_string(),
            token_file: PathBuf::from("/var/run/secrets/kubernetes.io/serviceaccount/token"),
            token_command: vec!["oc".to_string(), "whoami".to_string(), "-t".to_string()],
            insecure_skip_tls_verify: false,
            retry_attempts: 3,
            retry_delay: Duration::from_secs(2),
            trend_window: Duration::from_secs(7 * 24 * 3600),
            trend_step: Duration::from_secs(3600),
        }
    }
}

// =============================================================================
// Naming Heuristics
// =============================================================================

/// Regex patterns driving the name-based flags
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Pools scanned for block images
    pub block_pool: String,
    /// Test/benchmark/temporary image names
    pub test_artifact: String,
    /// Buckets owned by logging stacks
    pub logging_bucket: String,
    /// Pools that look like leftovers from testing
    pub test_pool: String,
    /// Provisioner label selecting bucket secrets
    pub bucket_secret_label: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            block_pool: r"(?i)(cephblockpool|rbd)".to_string(),
            test_artifact: r"(?i)(^|[-_.])(tests?|bench(mark)?|fio|tmp|temp|demo)([-_.0-9]|$)"
                .to_string(),
            logging_bucket: r"(?i)(loki|logging|tempo|(^|[-_.])logs?([-_.]|$))".to_string(),
            test_pool: r"(?i)(^|[-_.])(tests?|bench(mark)?|fio|tmp|temp|demo|perf)([-_.0-9]|$)"
                .to_string(),
            bucket_secret_label: "bucket-provisioner".to_string(),
        }
    }
}

// =============================================================================
// Top-level Configuration
// =============================================================================

/// Complete audit configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub storage: StorageConfig,
    pub metrics: MetricsConfig,
    pub naming: NamingConfig,
    /// Artifact directory; derived from the run timestamp when unset
    pub output_dir: Option<PathBuf>,
}

impl AuditConfig {
    /// Load a YAML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Output directory for a run started at `stamp`
    pub fn resolve_output_dir(&self, stamp: chrono::DateTime<chrono::Utc>) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| {
            PathBuf::from(format!("ceph-orphan-audit-{}", stamp.format("%Y%m%d-%H%M%S")))
        })
    }
}

mod seconds {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_defaults() {
        let config = AuditConfig::default();
        assert_eq!(config.storage.namespace, "openshift-storage");
        assert_eq!(config.metrics.retry_attempts, 3);
        assert_eq!(config.metrics.retry_delay, Duration::from_secs(2));
        assert!(config.output_dir.is_none());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = AuditConfig::from_yaml(
            r#"
storage:
  namespace: rook-ceph
metrics:
  url: https://thanos.example.com
  retry_delay: 5
naming:
  block_pool: "^replicapool$"
"#,
        )
        .unwrap();

        assert_eq!(config.storage.namespace, "rook-ceph");
        assert_eq!(config.storage.toolbox_deployment, "rook-ceph-tools");
        assert_eq!(config.metrics.url.as_deref(), Some("https://thanos.example.com"));
        assert_eq!(config.metrics.retry_delay, Duration::from_secs(5));
        assert_eq!(config.metrics.retry_attempts, 3);
        assert_eq!(config.naming.block_pool, "^replicapool$");
        assert!(config.naming.test_artifact.contains("fio"));
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(AuditConfig::from_yaml("storage: [").is_err());
    }

    #[test]
    fn test_resolve_output_dir() {
        let stamp = chrono::Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let config = AuditConfig::default();
        assert_eq!(
            config.resolve_output_dir(stamp),
            PathBuf::from("ceph-orphan-audit-20240301-123000")
        );

        let config = AuditConfig {
            output_dir: Some(PathBuf::from("/tmp/out")),
            ..Default::default()
        };
        assert_eq!(config.resolve_output_dir(stamp), PathBuf::from("/tmp/out"));
    }
}
