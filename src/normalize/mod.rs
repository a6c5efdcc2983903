//! Unit & identifier normalization
//!
//! All raw text and ambiguous counters from the storage cluster pass
//! through here before reaching the builders.

pub mod identifiers;
pub mod units;

pub use identifiers::{parse_volume_handle, split_volume_handle};
pub use units::{
    human_readable, human_readable_opt, normalize_bytes, parse_quota, parse_size,
    pool_stat_bytes, pool_used_bytes, SizeField,
};
