//! Filesystem subvolume inventory
//!
//! Reported for completeness only; subvolumes are never classified.

use crate::access::ceph::NO_GROUP;
use crate::domain::ports::StorageAdmin;
use crate::domain::records::{SubvolumeGroupRecord, SubvolumeRecord};
use crate::error::Result;
use crate::normalize::parse_quota;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Subvolumes and the groups holding them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilesystemInventory {
    pub filesystems: Vec<String>,
    pub groups: Vec<SubvolumeGroupRecord>,
    pub subvolumes: Vec<SubvolumeRecord>,
}

/// Walk filesystems, then groups (plus the ungrouped pseudo-group), then
/// subvolumes. Only the filesystem listing can fail the builder.
pub async fn build_filesystem_inventory(admin: &dyn StorageAdmin) -> Result<FilesystemInventory> {
    let mut inventory = FilesystemInventory::default();

    let mut filesystems = admin.list_filesystems().await?;
    filesystems.sort_by(|a, b| a.name.cmp(&b.name));

    for fs in &filesystems {
        inventory.filesystems.push(fs.name.clone());

        let mut groups: Vec<String> = match admin.list_subvolume_groups(&fs.name).await {
            Ok(groups) => groups.into_iter().map(|g| g.name).collect(),
            Err(e) => {
                warn!("subvolumegroup ls {} failed: {}", fs.name, e);
                Vec::new()
            }
        };
        groups.sort();
        groups.push(NO_GROUP.to_string());

        for group in groups {
            let names = match admin.list_subvolumes(&fs.name, &group).await {
                Ok(names) => names,
                Err(e) => {
                    warn!("subvolume ls {} --group_name {} failed: {}", fs.name, group, e);
                    continue;
                }
            };
            // the ungrouped pseudo-group is only listed when it holds something
            if group == NO_GROUP && names.is_empty() {
                continue;
            }

            let mut group_record = SubvolumeGroupRecord {
                filesystem: fs.name.clone(),
                name: group.clone(),
                subvolume_count: names.len(),
                used_bytes: 0,
            };

            let mut names: Vec<String> = names.into_iter().map(|n| n.name).collect();
            names.sort();
            for name in names {
                let (quota_bytes, used_bytes) =
                    match admin.subvolume_info(&fs.name, &group, &name).await {
                        Ok(info) => (parse_quota(&info.bytes_quota), info.bytes_used),
                        Err(e) => {
                            debug!("subvolume info {}/{}/{} failed: {}", fs.name, group, name, e);
                            (None, 0)
                        }
                    };
                group_record.used_bytes = group_record.used_bytes.saturating_add(used_bytes);
                inventory.subvolumes.push(SubvolumeRecord {
                    filesystem: fs.name.clone(),
                    group: group.clone(),
                    name,
                    quota_bytes,
                    used_bytes,
                });
            }

            inventory.groups.push(group_record);
        }
    }

    info!(
        "Filesystem inventory: {} filesystems, {} groups, {} subvolumes",
        inventory.filesystems.len(),
        inventory.groups.len(),
        inventory.subvolumes.len()
    );
    Ok(inventory)
}
