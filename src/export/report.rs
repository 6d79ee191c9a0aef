//! Batch run results

use crate::error::DriverError;
use crate::model::{Artifact, ExportRequest};
use chrono::{DateTime, Local};
use std::path::PathBuf;

/// Result of one attempted export
#[derive(Debug)]
pub struct ExportOutcome {
    /// The request as written in the job
    pub request: ExportRequest,

    /// Resolved output path
    pub output: PathBuf,

    /// Bytes written, or why the export failed
    pub result: Result<u64, DriverError>,
}

impl ExportOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Everything a batch run did, in execution order
#[derive(Debug)]
pub struct ExportReport {
    pub artifact: Artifact,
    pub started_at: DateTime<Local>,
    pub outcomes: Vec<ExportOutcome>,
}

impl ExportReport {
    pub fn new(artifact: Artifact) -> Self {
        Self {
            artifact,
            started_at: Local::now(),
            outcomes: Vec::new(),
        }
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &ExportOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &ExportOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some()
    }

    /// Paths of the files written, in the order they were written
    pub fn written_files(&self) -> Vec<PathBuf> {
        self.succeeded().map(|o| o.output.clone()).collect()
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        let ok = self.succeeded().count();
        let failed = self.outcomes.len() - ok;
        format!(
            "{} of {} export(s) succeeded, {} failed (work {}, started {})",
            ok,
            self.outcomes.len(),
            failed,
            self.artifact.short_id(),
            self.started_at.format("%Y-%m-%d %H:%M:%S")
        )
    }

    /// The report itself when every export succeeded, else the first failure
    pub fn into_result(mut self) -> Result<Self, DriverError> {
        if let Some(idx) = self.outcomes.iter().position(|o| !o.is_success()) {
            if let Err(e) = std::mem::replace(&mut self.outcomes[idx].result, Ok(0)) {
                return Err(e);
            }
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ExportFormat;

    fn outcome(format: ExportFormat, result: Result<u64, DriverError>) -> ExportOutcome {
        ExportOutcome {
            request: ExportRequest::new(format, format!("a.{}", format.extension())),
            output: PathBuf::from(format!("/out/a.{}", format.extension())),
            result,
        }
    }

    #[test]
    fn test_counts_and_first_failure() {
        let mut report = ExportReport::new(Artifact::new(PathBuf::from("a.work"), b"PK"));
        report.outcomes.push(outcome(ExportFormat::Verilog, Ok(10)));
        report.outcomes.push(outcome(
            ExportFormat::Svg,
            Err(DriverError::export(ExportFormat::Svg, "first")),
        ));
        report.outcomes.push(outcome(
            ExportFormat::Png,
            Err(DriverError::export(ExportFormat::Png, "second")),
        ));

        assert!(report.has_failures());
        assert_eq!(report.written_files(), vec![PathBuf::from("/out/a.v")]);
        assert!(report.summary().starts_with("1 of 3 export(s) succeeded, 2 failed"));

        let err = report.into_result().unwrap_err();
        assert!(err.to_string().contains("first"));
    }

    #[test]
    fn test_clean_report_into_result() {
        let mut report = ExportReport::new(Artifact::new(PathBuf::from("a.work"), b"PK"));
        report.outcomes.push(outcome(ExportFormat::Pdf, Ok(4)));
        assert!(report.into_result().is_ok());
    }
}
