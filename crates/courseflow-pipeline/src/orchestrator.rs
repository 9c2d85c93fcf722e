//! Pipeline Orchestrator (spec §4.4): load → partition → bin → flow →
//! aggregate → reconcile → emit, one independent worker per day. Mirrors
//! the teacher workspace's batch runner — a sized Rayon thread pool
//! fanning out over independent units of work, continuing past a failed
//! unit rather than aborting the whole run — generalized from "one PF/OPF
//! job per grid scenario" to "one load-bin-flow-aggregate-reconcile-emit
//! pass per day".
//!
//! Each day also carries its own wall-clock budget (`day_timeout_ms`),
//! distinct from the binning engine's `soft_timeout_ms` coarsening
//! trigger: the former bounds a day's *entire* pipeline, the latter only
//! nudges the binning grid to coarsen before it is ever reached.

use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use chrono::Utc;
use courseflow_aggregate::{aggregate_day, reconcile_or_fail};
use courseflow_binning::{bin_day, BinParams};
use courseflow_core::{Course, CourseflowError, CourseflowResult, DayPlan, LoadDiagnostics, ParticipantSet};
use courseflow_flow::{flow_day, FlowParams};
use courseflow_io::exporters::DayArtifactWriter;
use courseflow_io::{load_course, load_participants, AnalysisRequest, DayMetadata, RunMetadata, RunStatus};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::day_partitioner::build_day_plans;

pub const VALIDATOR_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Per-day pipeline outcome, collected into the run-level summary.
#[derive(Debug, Clone)]
pub struct DaySummary {
    pub day: String,
    pub status: RunStatus,
    pub error: Option<String>,
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub days: Vec<DaySummary>,
    pub manifest_path: PathBuf,
}

impl RunSummary {
    pub fn success_count(&self) -> usize {
        self.days.iter().filter(|d| d.status == RunStatus::Pass).count()
    }

    pub fn failure_count(&self) -> usize {
        self.days.len() - self.success_count()
    }
}

/// Wall-clock ceiling for a single day's full pipeline pass, distinct
/// from `BinParams::soft_timeout_ms` (spec §4.4, §6.1).
const DEFAULT_DAY_TIMEOUT_MS: u64 = 120_000;

/// Run the full pipeline for every day in `request`, writing artifacts
/// under `output_root`. `request_dir` resolves `request`'s relative file
/// paths (segments_file, flow_file, runners_file, los_rulebook path).
pub fn run_pipeline(
    request: &AnalysisRequest,
    request_dir: &Path,
    output_root: &Path,
    threads: usize,
) -> CourseflowResult<RunSummary> {
    std::fs::create_dir_all(output_root)?;

    let (course, mut course_diag) = load_course(
        request.resolve_file(request_dir, &request.segments_file)?,
        request.resolve_file(request_dir, &request.flow_file)?,
    )?;

    let mut events = Vec::new();
    let mut participants = Vec::new();
    for event_req in &request.events {
        let (start, duration) = request.event_minutes(event_req);
        events.push(courseflow_core::Event {
            name: event_req.name.clone(),
            day: event_req.day.clone(),
            start_time_min: start,
            duration_min: duration,
            runners_file: event_req.runners_file.clone(),
            gpx_file: event_req.gpx_file.clone(),
        });
        let (loaded, diag) = load_participants(
            request.resolve_file(request_dir, &event_req.runners_file)?,
            &event_req.name,
            &event_req.day,
        )?;
        course_diag.stats.runners += diag.stats.runners;
        course_diag.stats.runners_skipped += diag.stats.runners_skipped;
        participants.extend(loaded);
    }
    let participant_set = ParticipantSet::new(events, participants)?;
    let day_plans = build_day_plans(&course, &participant_set)?;
    let course = Arc::new(course);
    let participant_set = Arc::new(participant_set);

    let rulebook = match &request.los_rulebook {
        Some(r) => r.resolve(request_dir)?,
        None => Default::default(),
    };
    let bin_params = BinParams {
        dx: courseflow_core::Kilometers(request.bin_dx_km),
        dt: courseflow_core::Seconds(request.bin_dt_s),
        max_bins: request.max_bins,
        soft_timeout_ms: request.soft_timeout_ms,
        rulebook,
    };
    let flow_params = FlowParams {
        min_overlap_dwell_s: request.min_overlap_dwell_s,
        strict_gain_s: request.strict_gain_s,
    };

    let analysis_hash = courseflow_io::exporters::schema_version::stamp_analysis_hash(
        &serde_json::to_string(request).unwrap_or_default(),
    );
    let environment_str = serde_json::to_string(&request.environment).unwrap_or_default();

    let thread_count = if threads == 0 { num_cpus::get() } else { threads };
    let pool = ThreadPoolBuilder::new()
        .num_threads(thread_count)
        .build()
        .map_err(|e| CourseflowError::Config(format!("building pipeline thread pool: {e}")))?;

    let days: Vec<DaySummary> = pool.install(|| {
        day_plans
            .par_iter()
            .map(|plan| {
                run_day_with_timeout(
                    plan,
                    &course,
                    &participant_set,
                    &bin_params,
                    &flow_params,
                    &analysis_hash,
                    &environment_str,
                    output_root,
                    Duration::from_millis(DEFAULT_DAY_TIMEOUT_MS),
                )
            })
            .collect()
    });

    let mut run_manifest = RunMetadata::new(VALIDATOR_VERSION);
    for day in &days {
        run_manifest.record_day(day.day.clone(), day.status);
    }
    let manifest_path = output_root.join("manifest.json");
    run_manifest.write_to(&manifest_path)?;

    Ok(RunSummary { days, manifest_path })
}

/// Run one day's pipeline on a dedicated thread and enforce
/// `day_timeout` against it, independent of the binning engine's own
/// soft coarsening timeout.
fn run_day_with_timeout(
    plan: &DayPlan,
    course: &Arc<Course>,
    participants: &Arc<ParticipantSet>,
    bin_params: &BinParams,
    flow_params: &FlowParams,
    analysis_hash: &str,
    environment_str: &str,
    output_root: &Path,
    day_timeout: Duration,
) -> DaySummary {
    let (tx, rx) = mpsc::channel();
    let plan = plan.clone();
    let course = Arc::clone(course);
    let participants = Arc::clone(participants);
    let bin_params = bin_params.clone();
    let flow_params = *flow_params;
    let analysis_hash = analysis_hash.to_string();
    let environment_str = environment_str.to_string();
    let output_root = output_root.to_path_buf();

    let handle = std::thread::spawn(move || {
        let result = run_single_day(
            &plan,
            course.as_ref(),
            participants.as_ref(),
            &bin_params,
            &flow_params,
            &analysis_hash,
            &environment_str,
            &output_root,
        );
        let _ = tx.send(result);
    });

    match rx.recv_timeout(day_timeout) {
        Ok(Ok(output_dir)) => {
            tracing::info!(day = %plan.day, "day pipeline completed");
            let _ = handle.join();
            DaySummary {
                day: plan.day.clone(),
                status: RunStatus::Pass,
                error: None,
                output_dir: Some(output_dir),
            }
        }
        Ok(Err(err)) => {
            tracing::warn!(day = %plan.day, error = %err, "day pipeline failed");
            let _ = handle.join();
            DaySummary {
                day: plan.day.clone(),
                status: RunStatus::Fail,
                error: Some(err.to_string()),
                output_dir: None,
            }
        }
        Err(_) => {
            tracing::error!(day = %plan.day, "day pipeline exceeded timeout");
            // The worker thread is detached; it cannot be killed, only
            // ignored. It finishes eventually and its purge() call
            // cleans up its own temp directory.
            DaySummary {
                day: plan.day.clone(),
                status: RunStatus::Fail,
                error: Some(format!("day '{}' exceeded {:?} timeout", plan.day, day_timeout)),
                output_dir: None,
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_single_day(
    plan: &DayPlan,
    course: &courseflow_core::Course,
    participants: &ParticipantSet,
    bin_params: &BinParams,
    flow_params: &FlowParams,
    analysis_hash: &str,
    environment_str: &str,
    output_root: &Path,
) -> CourseflowResult<PathBuf> {
    let mut diagnostics = LoadDiagnostics::new();
    let (bins, _coarsening) = bin_day(plan, course, participants, bin_params, &mut diagnostics)?;
    let (flow_summaries, audits) = flow_day(plan, course, participants, flow_params)?;
    let windows = aggregate_day(&bins);

    let writer = DayArtifactWriter::new(output_root, &plan.day)?;
    let mut meta = DayMetadata::new(plan.day.as_str(), VALIDATOR_VERSION);
    meta.segment_count = plan.segment_ids.len();
    meta.event_count = plan.events.len();
    meta.runner_count = plan.events.iter().map(|e| participants.participant_count(e)).sum();
    meta.runners_skipped = diagnostics.stats.runners_skipped;

    // Bins/geojson/audit/flow summaries are written regardless of
    // reconciliation outcome (spec §4.3: "bins are still written for
    // diagnosis"). Only segment metrics publication is gated on it.
    let write_result = (|| -> CourseflowResult<()> {
        writer.write_bins(&bins, analysis_hash, &mut meta)?;
        writer.write_bins_geojson(course, &bins, &mut meta)?;
        writer.write_audit(&audits, &mut meta)?;
        writer.write_flow_summaries(&flow_summaries, VALIDATOR_VERSION, &Utc::now(), environment_str, &mut meta)?;
        Ok(())
    })();
    if let Err(err) = write_result {
        writer.purge()?;
        return Err(err);
    }

    let reconcile_outcome = reconcile_or_fail(&bins, &windows, course);
    match reconcile_outcome {
        Ok(report) => {
            meta.max_reconcile_rel_err = report.max_rel_err;
            writer.write_segment_windows(&windows, &mut meta)?;
        }
        Err(err) => {
            tracing::warn!(day = %plan.day, error = %err, "reconciliation failed, refusing to publish segment metrics");
            meta.mark_failed();
            writer.write_metadata(&meta)?;
            writer.commit()?;
            return Err(err);
        }
    }

    writer.write_metadata(&meta)?;
    writer.commit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_day_timeout_is_generous_but_finite() {
        assert!(DEFAULT_DAY_TIMEOUT_MS > bin_params_soft_timeout_floor());
    }

    fn bin_params_soft_timeout_floor() -> u64 {
        courseflow_binning::BinParams::default().soft_timeout_ms
    }
}
