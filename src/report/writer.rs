//! Artifact writer

use crate::error::Result;
use crate::report::cleanup::render_cleanup_suggestions;
use crate::report::model::AuditReport;
use crate::report::render::{render_orphans, render_summary};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

pub const REPORT_FILE: &str = "report.json";
pub const SUMMARY_FILE: &str = "summary.txt";
pub const ORPHANS_FILE: &str = "orphans.txt";
pub const CLEANUP_FILE: &str = "cleanup-suggestions.sh";

fn write_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string_pretty(value)?)?;
    Ok(path)
}

fn write_text(dir: &Path, name: &str, text: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, text)?;
    Ok(path)
}

/// Write the text views derived from `report`
pub fn write_renderings(report: &AuditReport, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    Ok(vec![
        write_text(dir, SUMMARY_FILE, &render_summary(report))?,
        write_text(dir, ORPHANS_FILE, &render_orphans(report))?,
        write_text(dir, CLEANUP_FILE, &render_cleanup_suggestions(report))?,
    ])
}

/// Write the report, its raw datasets and the text views
pub fn write_artifacts(report: &AuditReport, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    let mut written = vec![
        write_text(dir, REPORT_FILE, &report.to_json()?)?,
        write_json(dir, "images.json", &report.datasets.images)?,
        write_json(dir, "buckets.json", &report.datasets.buckets)?,
        write_json(dir, "subvolumes.json", &report.datasets.filesystems)?,
        write_json(dir, "pools.json", &report.datasets.pools)?,
    ];
    written.extend(write_renderings(report, dir)?);

    info!("Wrote {} artifacts to {}", written.len(), dir.display());
    Ok(written)
}

/// Regenerate the text views from a saved `report.json`
pub fn rerender(report_path: &Path, dir: &Path) -> Result<Vec<PathBuf>> {
    let report = AuditReport::from_file(report_path)?;
    write_renderings(&report, dir)
}
