//! Export configuration

use serde::Deserialize;
use std::path::PathBuf;

/// Configuration for a batch run
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Directory relative output paths resolve against
    pub output_root: PathBuf,

    /// What to do when an export fails
    pub policy: FailurePolicy,

    /// Create missing parent directories of outputs
    pub create_dirs: bool,

    /// Check each output's format signature after export
    pub validate_outputs: bool,
}

/// Behaviour after a failed export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop at the first failure and report it
    #[default]
    Abort,

    /// Record the failure and run the remaining exports
    Continue,
}

impl ExportConfig {
    /// Create a new export configuration
    pub fn new(output_root: PathBuf) -> Self {
        Self {
            output_root,
            policy: FailurePolicy::Abort,
            create_dirs: true,
            validate_outputs: false,
        }
    }

    /// Set the failure policy
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Enable or disable output signature checks
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate_outputs = validate;
        self
    }

    /// Enable or disable creation of missing output directories
    pub fn with_create_dirs(mut self, create: bool) -> Self {
        self.create_dirs = create;
        self
    }
}
