//! Driver error taxonomy

use crate::model::ExportFormat;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by loading, configuring and exporting
///
/// None of these are recovered locally; the batch runner either stops at the
/// first one or records it, depending on the failure policy.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The work file does not resolve to a readable artifact
    #[error("work file not found or unreadable: {}", path.display())]
    NotFound { path: PathBuf },

    /// The work file, script or manifest is malformed
    #[error("{}", describe_parse(path, *line, reason))]
    Parse {
        path: PathBuf,
        line: Option<usize>,
        reason: String,
    },

    /// A configuration variable is invalid for the export that needs it
    #[error("invalid configuration `{key}`: {reason}")]
    Config { key: String, reason: String },

    /// The host could not render the artifact in the requested format
    #[error("{format} export failed: {reason}")]
    Export { format: ExportFormat, reason: String },

    /// An output path could not be written
    #[error("cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DriverError {
    pub fn parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        DriverError::Parse {
            path: path.into(),
            line: None,
            reason: reason.into(),
        }
    }

    pub fn parse_at(path: impl Into<PathBuf>, line: usize, reason: impl Into<String>) -> Self {
        DriverError::Parse {
            path: path.into(),
            line: Some(line),
            reason: reason.into(),
        }
    }

    pub fn config(key: impl Into<String>, reason: impl Into<String>) -> Self {
        DriverError::Config {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn export(format: ExportFormat, reason: impl Into<String>) -> Self {
        DriverError::Export {
            format,
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DriverError::Io {
            path: path.into(),
            source,
        }
    }

    /// Short category name, used in logs and report summaries
    pub fn kind(&self) -> &'static str {
        match self {
            DriverError::NotFound { .. } => "not-found",
            DriverError::Parse { .. } => "parse",
            DriverError::Config { .. } => "config",
            DriverError::Export { .. } => "export",
            DriverError::Io { .. } => "io",
        }
    }
}

fn describe_parse(path: &std::path::Path, line: Option<usize>, reason: &str) -> String {
    match line {
        Some(line) => format!("{}:{}: {}", path.display(), line, reason),
        None => format!("failed to parse {}: {}", path.display(), reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_message_includes_line() {
        let err = DriverError::parse_at("job.js", 3, "unknown command `frobnicate`");
        assert_eq!(err.to_string(), "job.js:3: unknown command `frobnicate`");
        assert_eq!(err.kind(), "parse");
    }

    #[test]
    fn test_export_message_names_format() {
        let err = DriverError::export(ExportFormat::Pdf, "host exited with status 1");
        assert_eq!(err.to_string(), "PDF export failed: host exited with status 1");
    }
}
