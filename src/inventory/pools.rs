//! Pool usage dataset

use crate::classification::NamingRules;
use crate::domain::ports::CephDf;
use crate::domain::records::PoolUsageEntry;
use crate::normalize::{pool_stat_bytes, pool_used_bytes};

/// Normalize every `ceph df` pool against the cluster's raw capacity.
/// Sorted by pool name.
pub fn pool_usage(df: &CephDf, naming: &NamingRules) -> Vec<PoolUsageEntry> {
    let total = df.stats.total_bytes;
    let mut entries: Vec<PoolUsageEntry> = df
        .pools
        .iter()
        .map(|pool| PoolUsageEntry {
            name: pool.name.clone(),
            used_bytes: pool_used_bytes(&pool.stats, total),
            stored_bytes: pool_stat_bytes(&pool.stats, "stored", total),
            max_avail_bytes: pool_stat_bytes(&pool.stats, "max_avail", total),
            suspected_test_pool: naming.is_test_pool(&pool.name),
        })
        .collect();
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    entries
}

/// Stored bytes summed over all pools
pub fn total_stored(entries: &[PoolUsageEntry]) -> u64 {
    entries
        .iter()
        .fold(0u64, |acc, e| acc.saturating_add(e.stored_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NamingConfig;

    fn df() -> CephDf {
        serde_json::from_str(
            r#"{
                "stats": {"total_bytes": 1000000, "total_used_raw_bytes": 300000, "total_avail_bytes": 700000},
                "pools": [
                    {"name": "ocs-storagecluster-cephblockpool", "id": 1,
                     "stats": {"bytes_used": 200000, "stored": 100000, "max_avail": 500000}},
                    {"name": "fio-perf", "id": 2,
                     "stats": {"bytes_used": 5000000, "stored": 900}},
                    {"name": "legacy", "id": 3,
                     "stats": {"kb_used": 10}}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_pool_usage_normalized() {
        let naming = NamingRules::compile(&NamingConfig::default()).unwrap();
        let entries = pool_usage(&df(), &naming);

        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["fio-perf", "legacy", "ocs-storagecluster-cephblockpool"]);

        // larger than the cluster total, so kibibyte-scaled
        assert_eq!(entries[0].used_bytes, 5_000_000 * 1024);
        assert!(entries[0].suspected_test_pool);

        assert_eq!(entries[1].used_bytes, 10 * 1024);
        assert_eq!(entries[1].stored_bytes, 0);

        assert_eq!(entries[2].used_bytes, 200_000);
        assert_eq!(entries[2].stored_bytes, 100_000);
        assert_eq!(entries[2].max_avail_bytes, 500_000);
        assert!(!entries[2].suspected_test_pool);

        assert_eq!(total_stored(&entries), 100_900);
    }
}
