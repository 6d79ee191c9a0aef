//! Circuit Exporter - batch export driver for Workcraft circuit work files
//!
//! This library loads one work file, applies configuration variables and
//! runs an ordered list of exports (Verilog, SVG, PNG, PDF, EPS, PS) through
//! an external host tool.

pub mod error;
pub mod export;
pub mod host;
pub mod manifest;
pub mod model;
pub mod script;
pub mod validation;

pub use error::DriverError;
pub use export::config::{ExportConfig, FailurePolicy};
pub use export::pipeline::ExportPipeline;
pub use host::{ExportHost, WorkcraftHost};
pub use model::{ExportFormat, ExportJob, ExportRequest};
