//! Block-image inventory
//!
//! Pools are filtered by the block storage-class naming pattern, images are
//! listed per pool, and each image is enriched with size, watchers and its
//! binding references. Per-pool and per-image failures degrade locally.

use crate::classification::NamingRules;
use crate::domain::ports::StorageAdmin;
use crate::domain::records::ImageRecord;
use crate::error::Result;
use crate::inventory::binding::BindingMap;
use tracing::{debug, info, warn};

/// Build the image inventory, sorted by `pool/name`.
///
/// Only the pool listing itself can fail the builder.
pub async fn build_image_inventory(
    admin: &dyn StorageAdmin,
    bindings: &BindingMap,
    naming: &NamingRules,
) -> Result<Vec<ImageRecord>> {
    let pools: Vec<String> = admin
        .list_pools()
        .await?
        .into_iter()
        .filter(|p| naming.is_block_pool(p))
        .collect();
    info!("Scanning {} block pools for images", pools.len());

    let mut records = Vec::new();
    for pool in &pools {
        let images = match admin.list_images(pool).await {
            Ok(images) => images,
            Err(e) => {
                warn!("Skipping pool {}: image listing failed: {}", pool, e);
                continue;
            }
        };
        debug!("Pool {} has {} images", pool, images.len());

        for image in images {
            records.push(describe_image(admin, bindings, naming, pool, image).await);
        }
    }

    records.sort_by(|a, b| (&a.pool, &a.name).cmp(&(&b.pool, &b.name)));
    info!("Block inventory: {} images", records.len());
    Ok(records)
}

async fn describe_image(
    admin: &dyn StorageAdmin,
    bindings: &BindingMap,
    naming: &NamingRules,
    pool: &str,
    name: String,
) -> ImageRecord {
    let mut detail_errors = Vec::new();

    let (size_bytes, size_resolved) = match admin.image_info(pool, &name).await {
        Ok(info) => (info.size, true),
        Err(e) => {
            warn!("rbd info {}/{} failed, size unknown: {}", pool, name, e);
            detail_errors.push(format!("rbd info: {}", e));
            (0, false)
        }
    };

    let (watcher_count, status_resolved) = match admin.image_status(pool, &name).await {
        Ok(status) => (status.watchers.len() as u32, true),
        Err(e) => {
            warn!("rbd status {}/{} failed, watchers unknown: {}", pool, name, e);
            detail_errors.push(format!("rbd status: {}", e));
            (0, false)
        }
    };

    let refs = bindings.image_bindings(pool, &name);
    ImageRecord {
        pool: pool.to_string(),
        has_binding: !refs.is_empty(),
        looks_like_test_artifact: naming.looks_like_test_artifact(&name),
        bindings: refs,
        name,
        size_bytes,
        size_resolved,
        watcher_count,
        status_resolved,
        detail_errors,
    }
}
