//! Directory verification of existing exports

use super::signature::validate_output;
use crate::model::ExportFormat;
use anyhow::{bail, Result};
use std::path::Path;
use walkdir::WalkDir;

/// Check every export-like file below `dir`
///
/// Files are matched to formats by extension; others are skipped.
/// Returns the number of files checked, or an error naming how many failed.
pub fn verify_directory(dir: &Path) -> Result<usize> {
    if !dir.is_dir() {
        bail!("Not a directory: {:?}", dir);
    }
    log::info!("Verifying exports under {:?}", dir);

    let mut checked = 0usize;
    let mut failed = 0usize;

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Some(format) = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(ExportFormat::from_extension)
        else {
            continue;
        };

        checked += 1;
        match validate_output(path, format) {
            Ok(summary) => match summary.dimensions {
                Some((w, h)) => log::info!(
                    "✅ {} {:?} ({} bytes, {}x{})",
                    format,
                    path,
                    summary.bytes,
                    w,
                    h
                ),
                None => log::info!("✅ {} {:?} ({} bytes)", format, path, summary.bytes),
            },
            Err(e) => {
                failed += 1;
                log::error!("❌ {} {:?}: {:#}", format, path, e);
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} export(s) failed verification", failed, checked);
    }
    log::info!("Verified {} export(s)", checked);
    Ok(checked)
}
