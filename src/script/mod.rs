//! Driver scripts
//!
//! Reads the host's batch script dialect (`load`, `setConfigVar`,
//! `export*`, `exit`) into an [`ExportJob`](crate::model::ExportJob), and
//! writes jobs back out in the same dialect for the host to execute.

mod parser;
mod writer;

pub use parser::parse_script;
pub use writer::{render_script, render_single_export, ScriptWriter};

use crate::error::DriverError;
use crate::model::ExportJob;
use std::fs;
use std::path::Path;

/// Read and parse a driver script from disk
pub fn read_script(path: &Path) -> Result<ExportJob, DriverError> {
    let source = fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::InvalidData => DriverError::parse(path, "script is not valid UTF-8"),
        _ => DriverError::NotFound {
            path: path.to_path_buf(),
        },
    })?;
    log::info!("Parsing driver script {:?}", path);
    parse_script(&source, path)
}
