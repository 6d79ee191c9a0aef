//! Workcraft host
//!
//! Each export runs the tool headless on a generated one-export script:
//! `workcraft -nogui -noconfig -exec:<script>`. Running one process per export
//! keeps failures attributable to a single request.

use super::probe::probe_work_file;
use super::traits::ExportHost;
use crate::error::DriverError;
use crate::model::{
    Artifact, ConfigVars, ExportFormat, ExportRequest, GATE_LIBRARY_KEY, SUBSTITUTION_LIBRARY_KEY,
};
use crate::script::render_single_export;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Lines of tool output quoted in error messages
const OUTPUT_TAIL_LINES: usize = 5;

/// Drives an installed Workcraft as a subprocess
#[derive(Debug, Clone)]
pub struct WorkcraftHost {
    /// Launcher to run (default: `workcraft` from `PATH`)
    executable: PathBuf,

    /// Installation directory; relative library paths resolve here and the
    /// tool runs with it as working directory
    home: Option<PathBuf>,

    /// Arguments placed before the driver's own flags
    leading_args: Vec<OsString>,
}

impl WorkcraftHost {
    pub fn new() -> Self {
        Self {
            executable: PathBuf::from("workcraft"),
            home: None,
            leading_args: Vec::new(),
        }
    }

    pub fn with_executable(mut self, executable: PathBuf) -> Self {
        self.executable = executable;
        self
    }

    pub fn with_home(mut self, home: PathBuf) -> Self {
        self.home = Some(home);
        self
    }

    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Check the settings an export of `format` depends on
    ///
    /// Keys must look like `Section.name`. Library paths are only checked for
    /// formats that read them; absent keys are left to the tool defaults.
    pub fn check_settings(
        &self,
        format: ExportFormat,
        settings: &ConfigVars,
    ) -> Result<(), DriverError> {
        for (key, _) in settings.iter() {
            if !is_dotted_key(key) {
                return Err(DriverError::config(
                    key,
                    "expected a dotted `Section.name` key",
                ));
            }
        }

        if !format.uses_gate_library() {
            return Ok(());
        }

        if let Some(gate_library) = settings.gate_library() {
            if gate_library.trim().is_empty() {
                return Err(DriverError::config(
                    GATE_LIBRARY_KEY,
                    format!("{} export needs a gate library", format),
                ));
            }
            self.check_library(GATE_LIBRARY_KEY, gate_library)?;
        }
        if let Some(substitution) = settings.substitution_library() {
            self.check_library(SUBSTITUTION_LIBRARY_KEY, substitution)?;
        }
        Ok(())
    }

    fn check_library(&self, key: &str, value: &str) -> Result<(), DriverError> {
        let path = self.resolve_library(value);
        if !path.is_file() {
            return Err(DriverError::config(
                key,
                format!("library file {:?} does not exist", path),
            ));
        }
        Ok(())
    }

    /// Where the tool will look for a library given as `value`
    pub fn resolve_library(&self, value: &str) -> PathBuf {
        let path = PathBuf::from(value);
        match &self.home {
            Some(home) if path.is_relative() => home.join(path),
            _ => path,
        }
    }

    fn run_script(&self, format: ExportFormat, script: &str) -> Result<(), DriverError> {
        let mut file = tempfile::Builder::new()
            .prefix("circuit-exporter-")
            .suffix(".js")
            .tempfile()
            .map_err(|e| DriverError::export(format, format!("cannot create host script: {}", e)))?;
        file.write_all(script.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| DriverError::export(format, format!("cannot write host script: {}", e)))?;

        let mut exec_flag = OsString::from("-exec:");
        exec_flag.push(file.path());

        let mut command = Command::new(&self.executable);
        command
            .args(&self.leading_args)
            .arg("-nogui")
            .arg("-noconfig")
            .arg(exec_flag);
        if let Some(home) = &self.home {
            command.current_dir(home);
        }

        log::debug!("Running {:?}", command);
        let output = command.output().map_err(|e| {
            let reason = if e.kind() == std::io::ErrorKind::NotFound {
                format!("host executable {:?} not found", self.executable)
            } else {
                format!("cannot start {:?}: {}", self.executable, e)
            };
            DriverError::export(format, reason)
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
            log::debug!("[workcraft] {}", line);
        }

        if !output.status.success() {
            let mut reason = format!("host exited with {}", output.status);
            let tail = output_tail(&stderr, &stdout);
            if !tail.is_empty() {
                reason.push_str(": ");
                reason.push_str(&tail);
            }
            return Err(DriverError::export(format, reason));
        }

        Ok(())
    }
}

impl Default for WorkcraftHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportHost for WorkcraftHost {
    fn load(&self, path: &Path) -> Result<Artifact, DriverError> {
        let mut artifact = probe_work_file(path)?;
        artifact.path = absolutize(&artifact.path);
        Ok(artifact)
    }

    fn export(
        &self,
        artifact: &Artifact,
        request: &ExportRequest,
        output: &Path,
        settings: &ConfigVars,
    ) -> Result<(), DriverError> {
        self.check_settings(request.format, settings)?;
        let script = render_single_export(artifact, request, &absolutize(output), settings);
        self.run_script(request.format, &script)
    }
}

fn is_dotted_key(key: &str) -> bool {
    let mut parts = 0;
    for part in key.split('.') {
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return false;
        }
        parts += 1;
    }
    parts >= 2
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

/// Last few meaningful lines of tool output, stderr first
fn output_tail(stderr: &str, stdout: &str) -> String {
    let source = if stderr.trim().is_empty() { stdout } else { stderr };
    let lines: Vec<&str> = source
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let start = lines.len().saturating_sub(OUTPUT_TAIL_LINES);
    lines[start..].join(" | ")
}
