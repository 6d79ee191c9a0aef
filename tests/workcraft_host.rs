//! Runs `WorkcraftHost` against stand-in launchers written as shell scripts

#![cfg(unix)]

use circuit_exporter::model::GATE_LIBRARY_KEY;
use circuit_exporter::{
    DriverError, ExportConfig, ExportFormat, ExportJob, ExportPipeline, FailurePolicy,
    WorkcraftHost,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Writes every requested output as a PDF stub followed by the script it ran
const FAKE_WORKCRAFT: &str = r#"
for arg in "$@"; do
    case "$arg" in
        -exec:*) script="${arg#-exec:}" ;;
    esac
done
[ -n "$script" ] || { echo "no -exec script given" >&2; exit 2; }
grep -q "^work = load('" "$script" || { echo "script does not load work" >&2; exit 3; }
sed -n "s/^export[A-Za-z]*(work, '\(.*\)');\$/\1/p" "$script" | while IFS= read -r out; do
    { printf '%%PDF-1.4\n'; cat "$script"; } > "$out"
done
"#;

const FAILING_WORKCRAFT: &str = r#"
echo "Loading plugins"
echo "Error: cannot render circuit" >&2
exit 1
"#;

const SILENT_WORKCRAFT: &str = "exit 0\n";

/// Host running `body` through `/bin/sh`
fn host_with(dir: &TempDir, body: &str) -> WorkcraftHost {
    let launcher = dir.path().join("fake-workcraft.sh");
    fs::write(&launcher, body).expect("Failed to write fake launcher");
    WorkcraftHost::new()
        .with_executable(PathBuf::from("/bin/sh"))
        .with_leading_args([launcher])
}

fn work_file(dir: &TempDir) -> PathBuf {
    let work = dir.path().join("buffer-tm.circuit.work");
    fs::write(&work, b"PK\x03\x04 archive").unwrap();
    work
}

fn run(
    dir: &TempDir,
    host: WorkcraftHost,
    job: &ExportJob,
) -> Result<circuit_exporter::export::ExportReport, DriverError> {
    let config = ExportConfig::new(dir.path().join("out")).with_policy(FailurePolicy::Abort);
    ExportPipeline::new(config, host).run(job)
}

#[test]
fn test_exports_through_launcher() {
    let dir = TempDir::new().unwrap();
    let job = ExportJob::new(work_file(&dir))
        .with_setting(GATE_LIBRARY_KEY, "libraries/workcraft.lib")
        .with_export(ExportFormat::Pdf, "buffer.pdf")
        .with_export(ExportFormat::Ps, "buffer.ps");

    let host = host_with(&dir, FAKE_WORKCRAFT);
    let report = run(&dir, host, &job).expect("Export should succeed");
    assert_eq!(report.outcomes.len(), 2);

    let pdf = fs::read_to_string(dir.path().join("out/buffer.pdf")).unwrap();
    assert!(pdf.starts_with("%PDF-1.4"));
    assert!(pdf.contains("setConfigVar(\"CircuitSettings.gateLibrary\", \"libraries/workcraft.lib\");"));
    assert!(pdf.contains("exportPdf(work, "));
    assert!(pdf.trim_end().ends_with("exit();"));

    // One process per export: the PS run never saw the PDF export
    let ps = fs::read_to_string(dir.path().join("out/buffer.ps")).unwrap();
    assert!(ps.contains("exportPs(work, "));
    assert!(!ps.contains("exportPdf"));
}

#[test]
fn test_failing_launcher_reports_stderr() {
    let dir = TempDir::new().unwrap();
    let job = ExportJob::new(work_file(&dir)).with_export(ExportFormat::Svg, "buffer.svg");

    let err = run(&dir, host_with(&dir, FAILING_WORKCRAFT), &job).unwrap_err();
    assert!(matches!(err, DriverError::Export { format: ExportFormat::Svg, .. }));
    assert!(err.to_string().contains("cannot render circuit"));
}

#[test]
fn test_silent_launcher_is_export_error() {
    let dir = TempDir::new().unwrap();
    let job = ExportJob::new(work_file(&dir)).with_export(ExportFormat::Eps, "buffer.eps");

    let err = run(&dir, host_with(&dir, SILENT_WORKCRAFT), &job).unwrap_err();
    assert!(err.to_string().contains("no file"));
}

#[test]
fn test_missing_gate_library_fails_before_launch() {
    let dir = TempDir::new().unwrap();
    let job = ExportJob::new(work_file(&dir))
        .with_setting(GATE_LIBRARY_KEY, "libraries/missing.lib")
        .with_export(ExportFormat::Verilog, "buffer.v");

    let host = host_with(&dir, FAKE_WORKCRAFT).with_home(dir.path().to_path_buf());
    let err = run(&dir, host, &job).unwrap_err();

    assert!(matches!(err, DriverError::Config { ref key, .. } if key == GATE_LIBRARY_KEY));
    assert!(!Path::new(&dir.path().join("out/buffer.v")).exists());
}

#[test]
fn test_gate_library_under_home_is_accepted() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("libraries")).unwrap();
    fs::write(dir.path().join("libraries/workcraft.lib"), "GATE BUF 1 O=A;\n").unwrap();

    let job = ExportJob::new(work_file(&dir))
        .with_setting(GATE_LIBRARY_KEY, "libraries/workcraft.lib")
        .with_export(ExportFormat::Verilog, "buffer.v");

    let host = host_with(&dir, FAKE_WORKCRAFT).with_home(dir.path().to_path_buf());
    run(&dir, host, &job).expect("Export should succeed");
    assert!(dir.path().join("out/buffer.v").exists());
}
