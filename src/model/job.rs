use super::{ConfigVars, ExportFormat};
use std::path::{Path, PathBuf};

/// Handle to a loaded work file
///
/// The driver never looks inside the artifact; it only carries the source
/// path and a content digest that identifies it in logs and reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Path the artifact was loaded from
    pub path: PathBuf,

    /// Hex MD5 digest of the file contents
    pub id: String,
}

impl Artifact {
    pub fn new(path: PathBuf, contents: &[u8]) -> Self {
        let id = format!("{:x}", md5::compute(contents));
        Self { path, id }
    }

    /// First eight digest characters, enough to tell runs apart in logs
    pub fn short_id(&self) -> &str {
        &self.id[..8.min(self.id.len())]
    }
}

/// One export operation: render the artifact in `format` into `output`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub format: ExportFormat,

    /// Output file; relative paths resolve against the pipeline's output root
    pub output: PathBuf,

    /// Settings made after earlier exports and before this one
    pub overrides: ConfigVars,
}

impl ExportRequest {
    pub fn new(format: ExportFormat, output: impl Into<PathBuf>) -> Self {
        Self {
            format,
            output: output.into(),
            overrides: ConfigVars::new(),
        }
    }

    pub fn with_overrides(mut self, overrides: ConfigVars) -> Self {
        self.overrides = overrides;
        self
    }
}

/// A complete batch: one work file, its settings and the ordered exports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportJob {
    /// Work file to load
    pub work: PathBuf,

    /// Settings in effect before the first export
    pub settings: ConfigVars,

    /// Exports, in execution order
    pub requests: Vec<ExportRequest>,
}

impl ExportJob {
    pub fn new(work: impl Into<PathBuf>) -> Self {
        Self {
            work: work.into(),
            settings: ConfigVars::new(),
            requests: Vec::new(),
        }
    }

    /// Set a variable for the whole job (builder style)
    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings.set(key, value);
        self
    }

    /// Append an export (builder style)
    pub fn with_export(mut self, format: ExportFormat, output: impl Into<PathBuf>) -> Self {
        self.requests.push(ExportRequest::new(format, output));
        self
    }

    /// Settings seen by `request`: job settings plus its own overrides
    pub fn settings_for(&self, request: &ExportRequest) -> ConfigVars {
        self.settings.merged(&request.overrides)
    }

    /// Force a variable for every export, beating anything the job set
    pub fn override_setting(&mut self, key: &str, value: &str) {
        self.settings.set(key, value);
        for request in &mut self.requests {
            request.overrides.remove(key);
        }
    }

    /// Resolve a relative work path against `base`
    pub fn resolve_work(&mut self, base: &Path) {
        if self.work.is_relative() {
            self.work = base.join(&self.work);
        }
    }

    /// Default output name for `format`: work file stem plus extension
    ///
    /// `vme-tm.circuit.work` becomes `vme-tm.circuit.<ext>`.
    pub fn default_output(&self, format: ExportFormat) -> PathBuf {
        let name = self
            .work
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = name.strip_suffix(".work").unwrap_or(&name);
        let stem = if stem.is_empty() { "export" } else { stem };
        PathBuf::from(format!("{}.{}", stem, format.extension()))
    }
}
