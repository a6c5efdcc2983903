//! Object-storage bucket inventory

use crate::classification::NamingRules;
use crate::domain::ports::{RgwBucketStats, StorageAdmin};
use crate::domain::records::{BucketRecord, UNKNOWN_OWNER};
use crate::error::Result;
use crate::inventory::binding::BindingMap;
use crate::normalize::units::KIB;
use tracing::{info, warn};

/// Build the bucket inventory, sorted by name.
///
/// An absent object store yields an empty list from the adapter. A failed
/// per-bucket stats call leaves owner `"unknown"` and zero counts.
pub async fn build_bucket_inventory(
    admin: &dyn StorageAdmin,
    bindings: &BindingMap,
    naming: &NamingRules,
) -> Result<Vec<BucketRecord>> {
    let mut names = admin.list_buckets().await?;
    names.sort();
    names.dedup();

    let mut records = Vec::with_capacity(names.len());
    for name in names {
        let refs = bindings.bucket_bindings(&name);
        let mut record = BucketRecord {
            owner: UNKNOWN_OWNER.to_string(),
            object_count: 0,
            size_bytes: 0,
            stats_resolved: false,
            has_binding: !refs.is_empty(),
            logging_related: naming.is_logging_bucket(&name),
            bindings: refs,
            name,
        };

        match admin.bucket_stats(&record.name).await {
            Ok(stats) => {
                let (objects, bytes) = usage_totals(&stats);
                record.owner = stats
                    .owner
                    .filter(|o| !o.is_empty())
                    .unwrap_or_else(|| UNKNOWN_OWNER.to_string());
                record.object_count = objects;
                record.size_bytes = bytes;
                record.stats_resolved = true;
            }
            Err(e) => warn!("bucket stats {} failed: {}", record.name, e),
        }

        records.push(record);
    }

    info!("Bucket inventory: {} buckets", records.len());
    Ok(records)
}

/// Object count and byte size summed over all usage categories.
///
/// `size_actual` is preferred; `size_kb_actual` is scaled when it is the
/// only figure present.
pub fn usage_totals(stats: &RgwBucketStats) -> (u64, u64) {
    stats.usage.values().fold((0, 0), |(objects, bytes), usage| {
        let size = usage
            .size_actual
            .or_else(|| usage.size_kb_actual.map(|kb| kb.saturating_mul(KIB)))
            .unwrap_or(0);
        (
            objects + usage.num_objects.unwrap_or(0),
            bytes.saturating_add(size),
        )
    })
}
