//! Composite volume identifier parsing
//!
//! CSI volume handles are dash-delimited; the grammar used here takes the
//! final two tokens as pool and image:
//!
//! ```text
//! handle := [prefix "/"] token ("-" token)*
//! pool   := second-to-last token
//! image  := last token
//! ```
//!
//! Pool or image names that themselves contain `-` split incorrectly. The
//! real grammar belongs to the CSI driver, so the ambiguity is left visible
//! rather than guessed around.

/// Split a handle into `(pool, image)`, or `None` if it has fewer than two
/// non-empty trailing tokens.
pub fn split_volume_handle(handle: &str) -> Option<(&str, &str)> {
    let base = base_name(handle);
    let mut tokens = base.rsplitn(3, '-');
    let image = tokens.next()?;
    let pool = tokens.next()?;
    if image.is_empty() || pool.is_empty() {
        return None;
    }
    Some((pool, image))
}

/// Parse a handle into `"pool/image"`, falling back to the base name.
pub fn parse_volume_handle(handle: &str) -> String {
    match split_volume_handle(handle) {
        Some((pool, image)) => format!("{}/{}", pool, image),
        None => base_name(handle).to_string(),
    }
}

fn base_name(handle: &str) -> &str {
    let trimmed = handle.trim().trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}
