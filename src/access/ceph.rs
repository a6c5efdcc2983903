//! Ceph Toolbox Adapter
//!
//! Runs `ceph`, `rbd` and `radosgw-admin` inside the toolbox deployment via
//! `kubectl exec`, always requesting JSON output. A command whose stderr says
//! the subsystem is not deployed is reported as an absence, and listings turn
//! that into an empty collection.

use crate::config::StorageConfig;
use crate::domain::ports::{
    CephDf, CephFilesystem, CephStatus, NamedEntry, RbdImageInfo, RbdImageStatus,
    RgwBucketStats, StorageAdmin, SubvolumeInfo,
};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::process::Command;
use tracing::{debug, warn};

/// Subvolumes outside any group live in this pseudo-group
pub const NO_GROUP: &str = "_nogroup";

/// stderr fragments the ceph CLIs print when a subsystem is not deployed
const ABSENCE_MARKERS: [&str; 6] = [
    "couldn't init storage provider",
    "No such file or directory",
    "ENOENT",
    "does not exist",
    "no filesystem",
    "is not enabled",
];

/// stderr prefixes of `kubectl exec` failing before the command ran
const EXEC_FAILURE_MARKERS: [&str; 6] = [
    "error: unable to upgrade connection",
    "error from server",
    "container not found",
    "unable to connect to the server",
    "error: you must be logged in",
    "error: no preferred addresses",
];

/// True if stderr comes from kubectl itself rather than the remote command
pub fn is_exec_failure(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    EXEC_FAILURE_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// True if command output says the subsystem is missing rather than broken.
///
/// A failed `kubectl exec` is never an absence, whatever its wording.
pub fn is_absence_message(stderr: &str) -> bool {
    if is_exec_failure(stderr) {
        return false;
    }
    let lower = stderr.to_lowercase();
    ABSENCE_MARKERS
        .iter()
        .any(|marker| lower.contains(&marker.to_lowercase()))
}

// =============================================================================
// Toolbox
// =============================================================================

/// Storage admin over the ceph toolbox pod
pub struct CephToolbox {
    config: StorageConfig,
}

impl CephToolbox {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    fn exec_args(&self) -> Vec<String> {
        vec![
            "-n".to_string(),
            self.config.namespace.clone(),
            "exec".to_string(),
            format!("deploy/{}", self.config.toolbox_deployment),
            "--".to_string(),
        ]
    }

    async fn run(&self, args: &[&str]) -> Result<Vec<u8>> {
        let command = args.join(" ");
        debug!("Running toolbox command: {}", command);

        let output = Command::new(&self.config.kubectl)
            .args(self.exec_args())
            .args(args)
            .output()
            .await
            .map_err(|e| Error::AdminCommand {
                command: command.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if is_absence_message(&stderr) {
                return Err(Error::SubsystemAbsent {
                    subsystem: format!("{} ({})", args.first().copied().unwrap_or("?"), stderr),
                });
            }
            return Err(Error::AdminCommand {
                command,
                reason: stderr,
            });
        }

        Ok(output.stdout)
    }

    async fn run_json<T: DeserializeOwned>(&self, args: &[&str]) -> Result<T> {
        let stdout = self.run(args).await?;
        serde_json::from_slice(&stdout).map_err(|e| Error::AdminCommand {
            command: args.join(" "),
            reason: format!("JSON parse error: {}", e),
        })
    }

    /// Listing that tolerates the subsystem being absent
    async fn list_json<T: DeserializeOwned>(&self, args: &[&str]) -> Result<Vec<T>> {
        match self.run_json::<Vec<T>>(args).await {
            Ok(items) => Ok(items),
            Err(e) if e.is_absence() => {
                warn!("{}: treating as empty ({})", args.join(" "), e);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl StorageAdmin for CephToolbox {
    fn command_prefix(&self) -> String {
        format!("{} {}", self.config.kubectl, self.exec_args().join(" "))
    }

    async fn cluster_status(&self) -> Result<CephStatus> {
        self.run_json(&["ceph", "status", "--format", "json"])
            .await
            .map_err(|e| Error::StorageUnreachable {
                reason: e.to_string(),
                verify: format!("{} ceph status", self.command_prefix()),
            })
    }

    async fn cluster_df(&self) -> Result<CephDf> {
        self.run_json(&["ceph", "df", "--format", "json"]).await
    }

    async fn list_pools(&self) -> Result<Vec<String>> {
        self.list_json(&["ceph", "osd", "pool", "ls", "--format", "json"])
            .await
    }

    async fn list_images(&self, pool: &str) -> Result<Vec<String>> {
        self.list_json(&["rbd", "ls", "--pool", pool, "--format", "json"])
            .await
    }

    async fn image_info(&self, pool: &str, image: &str) -> Result<RbdImageInfo> {
        let spec = format!("{}/{}", pool, image);
        self.run_json(&["rbd", "info", &spec, "--format", "json"])
            .await
    }

    async fn image_status(&self, pool: &str, image: &str) -> Result<RbdImageStatus> {
        let spec = format!("{}/{}", pool, image);
        self.run_json(&["rbd", "status", &spec, "--format", "json"])
            .await
    }

    async fn list_buckets(&self) -> Result<Vec<String>> {
        self.list_json(&["radosgw-admin", "bucket", "list"]).await
    }

    async fn bucket_stats(&self, bucket: &str) -> Result<RgwBucketStats> {
        self.run_json(&["radosgw-admin", "bucket", "stats", "--bucket", bucket])
            .await
    }

    async fn list_filesystems(&self) -> Result<Vec<CephFilesystem>> {
        self.list_json(&["ceph", "fs", "ls", "--format", "json"])
            .await
    }

    async fn list_subvolume_groups(&self, fs: &str) -> Result<Vec<NamedEntry>> {
        self.list_json(&["ceph", "fs", "subvolumegroup", "ls", fs, "--format", "json"])
            .await
    }

    async fn list_subvolumes(&self, fs: &str, group: &str) -> Result<Vec<NamedEntry>> {
        if group == NO_GROUP {
            self.list_json(&["ceph", "fs", "subvolume", "ls", fs, "--format", "json"])
                .await
        } else {
            self.list_json(&[
                "ceph", "fs", "subvolume", "ls", fs, "--group_name", group, "--format", "json",
            ])
            .await
        }
    }

    async fn subvolume_info(&self, fs: &str, group: &str, name: &str) -> Result<SubvolumeInfo> {
        if group == NO_GROUP {
            self.run_json(&["ceph", "fs", "subvolume", "info", fs, name, "--format", "json"])
                .await
        } else {
            self.run_json(&[
                "ceph", "fs", "subvolume", "info", fs, name, "--group_name", group, "--format",
                "json",
            ])
            .await
        }
    }
}
