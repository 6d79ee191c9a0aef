//! Host trait definition

use crate::error::DriverError;
use crate::model::{Artifact, ConfigVars, ExportRequest};
use std::path::Path;

/// The external tool that loads work files and renders them
///
/// The pipeline owns output path resolution and checks; a host only has to
/// honour the two calls below.
pub trait ExportHost {
    /// Load a work file and return a handle to it
    ///
    /// Fails with [`DriverError::NotFound`] when `path` is not a readable
    /// file and [`DriverError::Parse`] when it is not a work file.
    fn load(&self, path: &Path) -> Result<Artifact, DriverError>;

    /// Render `artifact` as `request.format` into `output`
    ///
    /// `output` is the resolved form of `request.output`. `settings` is the
    /// full configuration in effect for this request; keys it lacks keep the
    /// host defaults.
    fn export(
        &self,
        artifact: &Artifact,
        request: &ExportRequest,
        output: &Path,
        settings: &ConfigVars,
    ) -> Result<(), DriverError>;
}

impl<H: ExportHost + ?Sized> ExportHost for &H {
    fn load(&self, path: &Path) -> Result<Artifact, DriverError> {
        (**self).load(path)
    }

    fn export(
        &self,
        artifact: &Artifact,
        request: &ExportRequest,
        output: &Path,
        settings: &ConfigVars,
    ) -> Result<(), DriverError> {
        (**self).export(artifact, request, output, settings)
    }
}
