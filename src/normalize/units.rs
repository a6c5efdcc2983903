//! Byte-count normalization
//!
//! Sizes arrive as raw byte counters, kibibyte-scaled counters and
//! human-readable suffixed strings. Everything is reduced to a `u64` byte
//! count here so the rest of the audit never handles raw text.

use crate::error::{Error, Result};
use std::collections::BTreeMap;

// =============================================================================
// Constants
// =============================================================================

pub const KIB: u64 = 1024;
pub const MIB: u64 = KIB * 1024;
pub const GIB: u64 = MIB * 1024;
pub const TIB: u64 = GIB * 1024;
pub const PIB: u64 = TIB * 1024;

const BINARY_UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];

/// Pool usage fields in order of preference
const POOL_USAGE_FIELDS: [(&str, SizeField); 3] = [
    ("bytes_used", SizeField::Ambiguous),
    ("stored", SizeField::Ambiguous),
    ("kb_used", SizeField::Kibibytes),
];

// =============================================================================
// Field Hints
// =============================================================================

/// What is known about the unit of a raw counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeField {
    /// Field is documented as bytes but releases disagree
    Ambiguous,
    /// Field name says kibibytes
    Kibibytes,
}

/// Normalize a raw usage counter to bytes.
///
/// Heuristic: an ambiguous value larger than the cluster's total capacity
/// must be kibibyte-scaled and is multiplied by 1024. A thin-provisioned pool
/// overcommitted past raw capacity will be mis-scaled; that is accepted.
/// With an unknown total (`0`) the value is returned unchanged.
pub fn normalize_bytes(raw: u64, hint: SizeField, cluster_total_bytes: u64) -> u64 {
    match hint {
        SizeField::Kibibytes => raw.saturating_mul(KIB),
        SizeField::Ambiguous => {
            if cluster_total_bytes > 0 && raw > cluster_total_bytes {
                raw.saturating_mul(KIB)
            } else {
                raw
            }
        }
    }
}

/// Pick the first usage field present in a `ceph df` pool stats map and
/// normalize it. Returns `0` if none is present.
pub fn pool_used_bytes(stats: &BTreeMap<String, serde_json::Value>, cluster_total_bytes: u64) -> u64 {
    POOL_USAGE_FIELDS
        .iter()
        .find_map(|(field, hint)| {
            stats
                .get(*field)
                .and_then(json_u64)
                .map(|raw| normalize_bytes(raw, *hint, cluster_total_bytes))
        })
        .unwrap_or(0)
}

/// Read a single named stats field through the same heuristic
pub fn pool_stat_bytes(
    stats: &BTreeMap<String, serde_json::Value>,
    field: &str,
    cluster_total_bytes: u64,
) -> u64 {
    stats
        .get(field)
        .and_then(json_u64)
        .map(|raw| normalize_bytes(raw, SizeField::Ambiguous, cluster_total_bytes))
        .unwrap_or(0)
}

/// Interpret a JSON number or numeric string as `u64`
pub fn json_u64(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64)),
        serde_json::Value::String(s) => parse_size(s).ok(),
        _ => None,
    }
}

// =============================================================================
// Rendering
// =============================================================================

/// Render bytes with the largest binary unit not exceeding the value.
///
/// `0` renders as `"0 B"`; plain bytes render without decimals.
pub fn human_readable(bytes: u64) -> String {
    if bytes < KIB {
        return format!("{} B", bytes);
    }

    let mut unit = 0;
    let mut divisor = 1u64;
    while unit + 1 < BINARY_UNITS.len() && bytes / divisor >= KIB {
        divisor *= KIB;
        unit += 1;
    }

    format!("{:.2} {}", bytes as f64 / divisor as f64, BINARY_UNITS[unit])
}

/// Like [`human_readable`], treating an unset value as zero
pub fn human_readable_opt(bytes: Option<u64>) -> String {
    human_readable(bytes.unwrap_or(0))
}

// =============================================================================
// Parsing
// =============================================================================

/// Parse a suffixed size string into bytes.
///
/// Accepts Kubernetes quantities (`10Gi`, `500M`, `1.5Ti`) and the
/// `ceph`/`rbd` human forms (`10 GiB`, `1.5 TiB`, `512 B`). Binary suffixes
/// (`Ki`, `KiB`, ...) scale by 1024, decimal ones (`k`, `M`, `GB`, ...) by 1000.
pub fn parse_size(input: &str) -> Result<u64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::SizeParse("empty size".into()));
    }

    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    let (number, suffix) = trimmed.split_at(split);

    let value: f64 = number
        .parse()
        .map_err(|_| Error::SizeParse(format!("invalid number in '{}'", input)))?;

    let multiplier: u64 = match suffix.trim() {
        "" | "B" | "b" => 1,
        "Ki" | "KiB" => KIB,
        "Mi" | "MiB" => MIB,
        "Gi" | "GiB" => GIB,
        "Ti" | "TiB" => TIB,
        "Pi" | "PiB" => PIB,
        "k" | "K" | "kB" | "KB" => 1_000,
        "M" | "MB" => 1_000_000,
        "G" | "GB" => 1_000_000_000,
        "T" | "TB" => 1_000_000_000_000,
        "P" | "PB" => 1_000_000_000_000_000,
        other => return Err(Error::SizeParse(format!("unknown unit '{}' in '{}'", other, input))),
    };

    Ok((value * multiplier as f64).round() as u64)
}

/// Parse a CephFS quota value: a byte count, a suffixed string, or
/// `"infinite"`/absent meaning unlimited (`None`).
pub fn parse_quota(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::String(s) if s.eq_ignore_ascii_case("infinite") => None,
        serde_json::Value::Null => None,
        other => json_u64(other).filter(|q| *q > 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_below_total_unchanged() {
        assert_eq!(normalize_bytes(500, SizeField::Ambiguous, 1000), 500);
        assert_eq!(normalize_bytes(1000, SizeField::Ambiguous, 1000), 1000);
    }

    #[test]
    fn test_normalize_above_total_scaled() {
        assert_eq!(normalize_bytes(2000, SizeField::Ambiguous, 1000), 2_048_000);
    }

    #[test]
    fn test_normalize_kib_field_and_unknown_total() {
        assert_eq!(normalize_bytes(4, SizeField::Kibibytes, 1_000_000), 4096);
        assert_eq!(normalize_bytes(2000, SizeField::Ambiguous, 0), 2000);
    }

    #[test]
    fn test_pool_used_bytes_field_preference() {
        let mut stats = BTreeMap::new();
        stats.insert("kb_used".to_string(), json!(10));
        assert_eq!(pool_used_bytes(&stats, 1 << 40), 10 * KIB);

        stats.insert("stored".to_string(), json!(777));
        assert_eq!(pool_used_bytes(&stats, 1 << 40), 777);

        stats.insert("bytes_used".to_string(), json!(900));
        assert_eq!(pool_used_bytes(&stats, 1 << 40), 900);

        assert_eq!(pool_used_bytes(&BTreeMap::new(), 1 << 40), 0);
    }

    #[test]
    fn test_human_readable_boundaries() {
        assert_eq!(human_readable(0), "0 B");
        assert_eq!(human_readable(1023), "1023 B");
        assert_eq!(human_readable(1024), "1.00 KiB");
        assert_eq!(human_readable(1536), "1.50 KiB");
        assert_eq!(human_readable(1_099_511_627_776), "1.00 TiB");
        assert_eq!(human_readable(3 * PIB), "3.00 PiB");
        assert_eq!(human_readable_opt(None), "0 B");
    }

    #[test]
    fn test_human_readable_caps_at_pib() {
        assert_eq!(human_readable(2048 * PIB), "2048.00 PiB");
    }

    #[test]
    fn test_parse_size_forms() {
        assert_eq!(parse_size("10Gi").unwrap(), 10 * GIB);
        assert_eq!(parse_size("1.5 TiB").unwrap(), TIB + TIB / 2);
        assert_eq!(parse_size("512").unwrap(), 512);
        assert_eq!(parse_size("500M").unwrap(), 500_000_000);
        assert_eq!(parse_size("2k").unwrap(), 2000);
        assert_eq!(parse_size("64 KiB").unwrap(), 64 * KIB);
        assert!(parse_size("").is_err());
        assert!(parse_size("ten gigs").is_err());
        assert!(parse_size("5 furlongs").is_err());
    }

    #[test]
    fn test_parse_quota() {
        assert_eq!(parse_quota(&json!("infinite")), None);
        assert_eq!(parse_quota(&serde_json::Value::Null), None);
        assert_eq!(parse_quota(&json!(1073741824u64)), Some(GIB));
        assert_eq!(parse_quota(&json!("1Gi")), Some(GIB));
        assert_eq!(parse_quota(&json!(0)), None);
    }
}
