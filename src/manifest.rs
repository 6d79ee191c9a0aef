//! TOML job manifests
//!
//! The same job a driver script describes, written as data:
//!
//! ```toml
//! work = "vme-tm.circuit.work"
//! on_error = "continue"
//!
//! [config]
//! "CircuitSettings.gateLibrary" = "libraries/workcraft.lib"
//!
//! [[export]]
//! format = "verilog"
//! output = "vme-tm.circuit.v"
//!
//! [[export]]
//! format = "svg"
//! ```

use crate::error::DriverError;
use crate::export::FailurePolicy;
use crate::model::{qualify_key, ExportFormat, ExportJob, ExportRequest};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    work: PathBuf,

    #[serde(default)]
    on_error: Option<FailurePolicy>,

    #[serde(default)]
    config: BTreeMap<String, String>,

    #[serde(default, rename = "export")]
    exports: Vec<RawExport>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawExport {
    format: ExportFormat,
    output: Option<PathBuf>,
}

/// A parsed manifest: the job plus the failure policy it asks for
#[derive(Debug, Clone)]
pub struct Manifest {
    pub job: ExportJob,
    pub on_error: Option<FailurePolicy>,
}

/// Parse manifest text; `origin` only labels errors
pub fn parse_manifest(source: &str, origin: &Path) -> Result<Manifest, DriverError> {
    let raw: RawManifest =
        toml::from_str(source).map_err(|e| DriverError::parse(origin, e.to_string()))?;

    let mut job = ExportJob::new(raw.work);
    for (key, value) in raw.config {
        let qualified = qualify_key(&key);
        if job.settings.contains(qualified) {
            return Err(DriverError::parse(
                origin,
                format!("config key `{}` is given more than once", qualified),
            ));
        }
        job.settings.set(qualified, value);
    }
    for export in raw.exports {
        let output = export
            .output
            .unwrap_or_else(|| job.default_output(export.format));
        job.requests.push(ExportRequest::new(export.format, output));
    }

    if job.requests.is_empty() {
        log::warn!("{}: manifest lists no exports", origin.display());
    }

    Ok(Manifest {
        job,
        on_error: raw.on_error,
    })
}

/// Read and parse a manifest from disk
pub fn read_manifest(path: &Path) -> Result<Manifest, DriverError> {
    let source = fs::read_to_string(path).map_err(|_| DriverError::NotFound {
        path: path.to_path_buf(),
    })?;
    log::info!("Parsing job manifest {:?}", path);
    parse_manifest(&source, path)
}
