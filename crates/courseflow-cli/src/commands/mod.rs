//! Subcommand implementations (spec §3 "CLI").

pub mod inspect;
pub mod run;
pub mod validate;

use std::path::{Path, PathBuf};

use courseflow_core::{CourseflowResult, Course, LoadDiagnostics, ParticipantSet};
use courseflow_io::AnalysisRequest;

/// Shared load path for `validate`/`inspect`: parse the request, then load
/// the course and every event's runners, same as the orchestrator's first
/// step but without running any engine.
pub fn load_request_context(
    request_path: &Path,
) -> CourseflowResult<(AnalysisRequest, PathBuf, Course, ParticipantSet, LoadDiagnostics)> {
    let request = AnalysisRequest::load(request_path)?;
    let request_dir = request_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let (course, mut diagnostics) = courseflow_io::load_course(
        request.resolve_file(&request_dir, &request.segments_file)?,
        request.resolve_file(&request_dir, &request.flow_file)?,
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
        let (loaded, diag) = courseflow_io::load_participants(
            request.resolve_file(&request_dir, &event_req.runners_file)?,
            &event_req.name,
            &event_req.day,
        )?;
        diagnostics.stats.runners += diag.stats.runners;
        diagnostics.stats.runners_skipped += diag.stats.runners_skipped;
        diagnostics.issues.extend(diag.issues);
        participants.extend(loaded);
    }
    let participant_set = ParticipantSet::new(events, participants)?;

    Ok((request, request_dir, course, participant_set, diagnostics))
}
