//! Batch export orchestration

use super::config::{ExportConfig, FailurePolicy};
use super::organizer::OutputOrganizer;
use super::report::{ExportOutcome, ExportReport};
use crate::error::DriverError;
use crate::host::ExportHost;
use crate::model::{Artifact, ExportJob, ExportRequest};
use crate::validation::validate_output;
use std::path::Path;

/// Runs an [`ExportJob`] against a host, one request at a time
pub struct ExportPipeline<H: ExportHost> {
    config: ExportConfig,
    organizer: OutputOrganizer,
    host: H,
}

impl<H: ExportHost> ExportPipeline<H> {
    /// Create a new export pipeline
    pub fn new(config: ExportConfig, host: H) -> Self {
        let organizer = OutputOrganizer::new(config.output_root.clone(), config.create_dirs);

        Self {
            config,
            organizer,
            host,
        }
    }

    /// Run the whole job
    ///
    /// A load failure is returned before any export is attempted. Under
    /// [`FailurePolicy::Abort`] the first export failure is returned; under
    /// [`FailurePolicy::Continue`] failures are recorded in the report and
    /// the remaining exports still run. Files written by earlier exports are
    /// left in place either way.
    pub fn run(&self, job: &ExportJob) -> Result<ExportReport, DriverError> {
        log::info!("Loading work file {:?}", job.work);
        let artifact = self.host.load(&job.work)?;
        log::info!(
            "Loaded {:?} (id {}), {} export(s) queued",
            artifact.path,
            artifact.short_id(),
            job.requests.len()
        );

        let mut report = ExportReport::new(artifact);
        let total = job.requests.len();

        for (i, request) in job.requests.iter().enumerate() {
            let output = self.organizer.resolve(&request.output);
            log::info!("[{}/{}] Exporting {} to {:?}", i + 1, total, request.format, output);

            let result = self.export_one(&report.artifact, job, request, &output);
            match &result {
                Ok(bytes) => log::debug!("Wrote {} bytes to {:?}", bytes, output),
                Err(e) => log::error!(
                    "[{}/{}] {} export to {:?} failed ({}): {}",
                    i + 1,
                    total,
                    request.format,
                    output,
                    e.kind(),
                    e
                ),
            }

            let failed = result.is_err();
            report.outcomes.push(ExportOutcome {
                request: request.clone(),
                output,
                result,
            });

            if failed && self.config.policy == FailurePolicy::Abort {
                let skipped = total - i - 1;
                if skipped > 0 {
                    log::warn!("Aborting batch; {} export(s) not run", skipped);
                }
                return report.into_result();
            }
        }

        log::info!("{}", report.summary());
        Ok(report)
    }

    /// Prepare, export and check a single request; returns the bytes written
    fn export_one(
        &self,
        artifact: &Artifact,
        job: &ExportJob,
        request: &ExportRequest,
        output: &Path,
    ) -> Result<u64, DriverError> {
        self.organizer.prepare(output)?;

        let settings = job.settings_for(request);
        self.host.export(artifact, request, output, &settings)?;

        let bytes = match self.organizer.written_size(output) {
            Some(0) => {
                return Err(DriverError::export(
                    request.format,
                    format!("host wrote an empty file at {:?}", output),
                ))
            }
            Some(bytes) => bytes,
            None => {
                return Err(DriverError::export(
                    request.format,
                    format!("host produced no file at {:?}", output),
                ))
            }
        };

        if self.config.validate_outputs {
            let summary = validate_output(output, request.format)
                .map_err(|e| DriverError::export(request.format, format!("{:#}", e)))?;
            log::debug!("Validated {:?}: {:?}", output, summary.dimensions);
        }

        Ok(bytes)
    }
}
