//! Work file probing
//!
//! Work files are ZIP containers; older ones are bare XML documents. The
//! driver checks only the container signature, never the contents.

use crate::error::DriverError;
use crate::model::Artifact;
use std::fs;
use std::path::Path;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const XML_MAGIC: &[u8] = b"<?xml";
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Read a work file and turn it into an [`Artifact`]
pub fn probe_work_file(path: &Path) -> Result<Artifact, DriverError> {
    let not_found = || DriverError::NotFound {
        path: path.to_path_buf(),
    };

    if !path.is_file() {
        return Err(not_found());
    }
    let contents = fs::read(path).map_err(|e| {
        log::debug!("Cannot read {:?}: {}", path, e);
        not_found()
    })?;

    if contents.is_empty() {
        return Err(DriverError::parse(path, "work file is empty"));
    }

    let body = contents.strip_prefix(UTF8_BOM).unwrap_or(&contents);
    if !body.starts_with(ZIP_MAGIC) && !body.starts_with(XML_MAGIC) {
        return Err(DriverError::parse(
            path,
            "not a work file (expected a ZIP container or an XML document)",
        ));
    }

    let artifact = Artifact::new(path.to_path_buf(), &contents);
    log::debug!(
        "Probed {:?}: {} bytes, id {}",
        path,
        contents.len(),
        artifact.short_id()
    );
    Ok(artifact)
}
