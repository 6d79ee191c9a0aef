//! Export orchestration and output placement

pub mod config;
pub mod organizer;
pub mod pipeline;
pub mod report;

pub use config::{ExportConfig, FailurePolicy};
pub use organizer::OutputOrganizer;
pub use pipeline::ExportPipeline;
pub use report::{ExportOutcome, ExportReport};
