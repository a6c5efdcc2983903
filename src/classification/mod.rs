//! Orphan classification
//!
//! - [`naming`]: compiled name heuristics (block pools, test artifacts, logging buckets)
//! - [`engine`]: confidence-tiered classification over finished inventories

pub mod engine;
pub mod naming;

pub use engine::{
    classify_bucket, classify_image, classify_inventory, FlaggedBucket, FlaggedImage,
    OrphanClassification, OrphanReport, OrphanSummary,
};
pub use naming::NamingRules;
