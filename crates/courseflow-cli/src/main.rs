use clap::Parser;
use clap_complete::generate;
use std::fs;
use std::io;
use std::path::Path;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use courseflow_cli::cli::build_cli_command;
use courseflow_cli::{Cli, Commands};

fn generate_completions(shell: clap_complete::Shell, out: Option<&Path>) -> anyhow::Result<()> {
    let mut cmd = build_cli_command();
    if let Some(path) = out {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(path)?;
        generate(shell, &mut cmd, "courseflow", &mut file);
        println!("Wrote {shell:?} completion to {}", path.display());
    } else {
        generate(shell, &mut cmd, "courseflow", &mut io::stdout());
    }
    Ok(())
}

/// Basic local-setup sanity check: is stdout a terminal, can we write a
/// temp file, is the environment otherwise sane. Mirrors the teacher's
/// `doctor` command in spirit, scaled down to this crate's needs.
fn run_doctor() -> anyhow::Result<()> {
    let tmp = std::env::temp_dir();
    let probe = tmp.join("courseflow-doctor-probe");
    fs::write(&probe, b"ok")?;
    fs::remove_file(&probe)?;
    println!("OK: {} is writable", tmp.display());
    println!("OK: courseflow {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder().with_max_level(cli.log_level).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default tracing subscriber failed");

    info!("courseflow {} starting", env!("CARGO_PKG_VERSION"));

    let result = match &cli.command {
        Commands::Run { request, out, threads } => courseflow_cli::commands::run::run(request, out, *threads),
        Commands::Validate { request } => courseflow_cli::commands::validate::run(request),
        Commands::Inspect { request } => courseflow_cli::commands::inspect::run(request),
        Commands::Completions { shell, out } => generate_completions(*shell, out.as_deref()),
        Commands::Doctor {} => run_doctor(),
    };

    if let Err(err) = result {
        tracing::error!("{err:#}");
        eprintln!("error: {err:#}");
        std::process::exit(exit_code_for(&err));
    }
}

/// Map the error taxonomy (spec §7) onto process exit codes. Distinct
/// from `http_status()`, which groups several kinds under one HTTP
/// status (422/500/503) — exit codes keep the kinds distinguishable for
/// scripts that branch on them.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    use courseflow_core::CourseflowError::*;
    // `.context(...)` wraps the original error further down the chain, so
    // search the whole chain rather than only the top-level error.
    let found = err.chain().find_map(|e| e.downcast_ref::<courseflow_core::CourseflowError>());
    match found {
        Some(Config(_)) => 2,
        Some(Data(_)) => 3,
        Some(Budget(_)) => 4,
        Some(Reconcile(_)) => 5,
        Some(Timeout(_)) => 6,
        Some(Io(_)) => 7,
        Some(Parse(_)) => 8,
        None => 1,
    }
}
