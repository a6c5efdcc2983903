//! Inventory builders
//!
//! Each builder runs to completion on its own and only reads the shared
//! [`BindingMap`]. A builder-level error is reported by the caller as a
//! source failure; per-item failures are folded into defaulted fields.

pub mod binding;
pub mod block;
pub mod bucket;
pub mod cluster;
pub mod filesystem;
pub mod pools;

pub use binding::{BindingMap, BindingStats};
pub use block::build_image_inventory;
pub use bucket::build_bucket_inventory;
pub use cluster::{
    collect_capacity_trend, collect_cluster_summary, CapacitySource, CapacityTrend, ClusterSummary,
};
pub use filesystem::{build_filesystem_inventory, FilesystemInventory};
pub use pools::{pool_usage, total_stored};
