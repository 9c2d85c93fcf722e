//! `courseflow validate` (spec §3): load the request and its static
//! files, run the Day Partitioner's cross-day flow-pair check, and
//! report — without running binning, flow, or aggregation. The
//! CLI-level expression of "fail fast at the boundary" (spec §7).

use std::path::Path;

use anyhow::Context;
use courseflow_pipeline::build_day_plans;

use super::load_request_context;

pub fn run(request_path: &Path) -> anyhow::Result<()> {
    let (request, _dir, course, participants, diagnostics) = load_request_context(request_path)
        .with_context(|| format!("validating request '{}'", request_path.display()))?;

    let day_plans = build_day_plans(&course, &participants)
        .context("day partitioning (cross-day flow pair check)")?;

    println!("request: {}", request_path.display());
    println!("  segments_file : {}", request.segments_file);
    println!("  flow_file     : {}", request.flow_file);
    println!("  events        : {}", request.events.len());
    println!("  days          : {}", day_plans.len());
    println!("  segments      : {}", course.segment_count());
    println!("  runners total : {}", participants.total_participants());
    println!(
        "  runners skipped: {} (segments skipped: {})",
        diagnostics.stats.runners_skipped, diagnostics.stats.segments_skipped
    );

    if diagnostics.issues.is_empty() {
        println!("OK: no issues");
    } else {
        println!("{} issue(s):", diagnostics.issues.len());
        for issue in &diagnostics.issues {
            println!("  [{:?}] {}: {}", issue.severity, issue.category, issue.message);
        }
    }

    Ok(())
}
