//! Validation utilities
//!
//! Checks exported files by format signature, after each export or over a
//! whole output directory.

mod signature;
mod verify;

pub use signature::{validate_output, OutputSummary};
pub use verify::verify_directory;
