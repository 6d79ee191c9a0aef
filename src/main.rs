use anyhow::{bail, Context, Result};
use circuit_exporter::manifest::read_manifest;
use circuit_exporter::model::{parse_assignment, GATE_LIBRARY_KEY, SUBSTITUTION_LIBRARY_KEY};
use circuit_exporter::script::{read_script, render_script};
use circuit_exporter::validation::verify_directory;
use circuit_exporter::{ExportConfig, ExportJob, ExportPipeline, FailurePolicy, WorkcraftHost};
use clap::Parser;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "circuit-exporter")]
#[command(about = "Batch-export Workcraft circuit work files", long_about = None)]
struct Args {
    /// Driver script (.js) or job manifest (.toml)
    job: Option<String>,

    /// Override the work file named by the job
    #[arg(long)]
    work: Option<String>,

    /// Extra configuration variable, applied after the job's own (repeatable)
    #[arg(short = 'c', long = "config", value_name = "KEY=VALUE", value_parser = parse_assignment)]
    config: Vec<(String, String)>,

    /// Gate library used by Verilog export
    #[arg(long)]
    gate_library: Option<String>,

    /// Substitution library (empty disables substitution)
    #[arg(long)]
    substitution_library: Option<String>,

    /// Root for relative output paths (default: the job file's directory)
    #[arg(short = 'o', long)]
    output_dir: Option<String>,

    /// Workcraft launcher to run
    #[arg(long, default_value = "workcraft")]
    workcraft: String,

    /// Workcraft installation directory (relative library paths resolve here)
    #[arg(long)]
    workcraft_home: Option<String>,

    /// Keep exporting after a failure instead of stopping
    #[arg(long)]
    continue_on_error: bool,

    /// Fail instead of creating missing output directories
    #[arg(long)]
    no_create_dirs: bool,

    /// Check each output's format signature after export
    #[arg(long)]
    validate: bool,

    /// Print the script that would be run and exit
    #[arg(long)]
    dry_run: bool,

    /// Only verify existing exports in a directory (don't export)
    #[arg(long, value_name = "DIR")]
    verify: Option<String>,

    /// Verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Read a job from a manifest (`.toml`) or a driver script (anything else)
fn read_job(path: &Path) -> Result<(ExportJob, Option<FailurePolicy>)> {
    let is_manifest = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("toml"));
    if is_manifest {
        let manifest = read_manifest(path)?;
        Ok((manifest.job, manifest.on_error))
    } else {
        Ok((read_script(path)?, None))
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    // If verify-only mode, just verify and exit
    if let Some(dir) = &args.verify {
        verify_directory(&expand(dir))?;
        return Ok(());
    }

    let Some(job_arg) = &args.job else {
        bail!("No job given; pass a driver script or manifest (or --verify DIR)");
    };
    let job_path = expand(job_arg);
    let base_dir = job_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let (mut job, manifest_policy) =
        read_job(&job_path).with_context(|| format!("Failed to read job {:?}", job_path))?;

    match &args.work {
        Some(work) => job.work = expand(work),
        None => job.resolve_work(&base_dir),
    }

    // Command-line settings beat anything the job sets
    if let Some(lib) = &args.gate_library {
        job.override_setting(GATE_LIBRARY_KEY, lib);
    }
    if let Some(lib) = &args.substitution_library {
        job.override_setting(SUBSTITUTION_LIBRARY_KEY, lib);
    }
    for (key, value) in &args.config {
        job.override_setting(key, value);
    }

    if args.dry_run {
        print!("{}", render_script(&job));
        return Ok(());
    }

    let policy = if args.continue_on_error {
        FailurePolicy::Continue
    } else {
        manifest_policy.unwrap_or_default()
    };
    let output_root = args
        .output_dir
        .as_deref()
        .map(expand)
        .unwrap_or(base_dir);
    let config = ExportConfig::new(output_root)
        .with_policy(policy)
        .with_create_dirs(!args.no_create_dirs)
        .with_validation(args.validate);

    let mut host = WorkcraftHost::new().with_executable(expand(&args.workcraft));
    if let Some(home) = &args.workcraft_home {
        host = host.with_home(expand(home));
    }

    log::info!("Circuit Exporter");
    log::info!("================");
    log::info!(
        "{} export(s) of {:?}, on error: {:?}",
        job.requests.len(),
        job.work,
        policy
    );

    let pipeline = ExportPipeline::new(config, host);
    let report = pipeline.run(&job).context("Export aborted")?;

    if report.has_failures() {
        for outcome in report.failed() {
            if let Err(e) = &outcome.result {
                log::error!("❌ {:?}: {}", outcome.output, e);
            }
        }
        bail!("{}", report.summary());
    }

    for path in report.written_files() {
        log::info!("✅ {:?}", path);
    }
    log::info!("Export completed successfully!");
    Ok(())
}
