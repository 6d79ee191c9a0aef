//! Rendering jobs back into host scripts

use crate::model::{Artifact, ConfigVars, ExportFormat, ExportJob, ExportRequest};
use std::fmt::Write as _;
use std::path::Path;

/// Name the rendered script binds the loaded work to
const WORK_VAR: &str = "work";

/// Incremental builder for a host script
pub struct ScriptWriter {
    out: String,
}

impl ScriptWriter {
    pub fn new() -> Self {
        Self {
            out: String::from("// Generated by circuit-exporter\n"),
        }
    }

    pub fn load(&mut self, path: &Path) -> &mut Self {
        let _ = writeln!(
            self.out,
            "{} = load({});",
            WORK_VAR,
            quote(&path.to_string_lossy(), '\'')
        );
        self
    }

    pub fn set_config_var(&mut self, key: &str, value: &str) -> &mut Self {
        let _ = writeln!(
            self.out,
            "setConfigVar({}, {});",
            quote(key, '"'),
            quote(value, '"')
        );
        self
    }

    pub fn settings(&mut self, settings: &ConfigVars) -> &mut Self {
        for (key, value) in settings.iter() {
            self.set_config_var(key, value);
        }
        self
    }

    pub fn export(&mut self, format: ExportFormat, output: &Path) -> &mut Self {
        let _ = writeln!(
            self.out,
            "{}({}, {});",
            format.command(),
            WORK_VAR,
            quote(&output.to_string_lossy(), '\'')
        );
        self
    }

    /// Append `exit()` and return the script text
    pub fn finish(mut self) -> String {
        self.out.push_str("exit();\n");
        self.out
    }
}

impl Default for ScriptWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a whole job as one script
///
/// Per-request overrides are emitted right before the export that first
/// needs them; a key dropped by a later request is reset to its job value.
pub fn render_script(job: &ExportJob) -> String {
    let mut writer = ScriptWriter::new();
    writer.load(&job.work).settings(&job.settings);

    let mut current = job.settings.clone();
    for request in &job.requests {
        let wanted = job.settings_for(request);
        let stale: Vec<(String, String)> = current
            .iter()
            .filter(|(k, _)| !wanted.contains(k))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        for (key, value) in stale {
            log::warn!(
                "Cannot unset `{}` (= {:?}) in a sequential script; keeping it",
                key,
                value
            );
        }
        for (key, value) in wanted.iter() {
            if current.get(key) != Some(value) {
                writer.set_config_var(key, value);
                current.set(key, value);
            }
        }
        writer.export(request.format, &request.output);
    }

    writer.finish()
}

/// Render the script a host runs for a single export
pub fn render_single_export(
    artifact: &Artifact,
    request: &ExportRequest,
    output: &Path,
    settings: &ConfigVars,
) -> String {
    let mut writer = ScriptWriter::new();
    writer
        .load(&artifact.path)
        .settings(settings)
        .export(request.format, output);
    writer.finish()
}

/// Quote `s` as a script string literal
fn quote(s: &str, delim: char) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push(delim);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == delim => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(delim);
    out
}
