//! `courseflow run` (spec §3): execute the full pipeline for an
//! analysis request file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use courseflow_io::AnalysisRequest;
use courseflow_pipeline::run_pipeline;

pub fn run(request_path: &Path, out: &Path, threads: usize) -> anyhow::Result<()> {
    let request = AnalysisRequest::load(request_path)
        .with_context(|| format!("loading request '{}'", request_path.display()))?;
    let request_dir = request_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let summary = run_pipeline(&request, &request_dir, out, threads)
        .context("running pipeline")?;

    for day in &summary.days {
        match &day.error {
            None => println!("day '{}': PASS", day.day),
            Some(err) => println!("day '{}': FAIL ({err})", day.day),
        }
    }
    println!(
        "{} day(s) succeeded, {} failed. Manifest: {}",
        summary.success_count(),
        summary.failure_count(),
        summary.manifest_path.display()
    );

    if summary.failure_count() > 0 {
        anyhow::bail!("{} day(s) failed", summary.failure_count());
    }
    Ok(())
}
