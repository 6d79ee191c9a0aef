//! Data model for export jobs
//!
//! These types describe what to export, independent of how the job was
//! written down (script or manifest) and of the host that performs it.

mod format;
mod job;
mod settings;

pub use format::ExportFormat;
pub use job::{Artifact, ExportJob, ExportRequest};
pub use settings::{
    parse_assignment, qualify_key, ConfigVars, GATE_LIBRARY_KEY, SUBSTITUTION_LIBRARY_KEY,
};
