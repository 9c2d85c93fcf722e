//! Loader for `segments.csv` and `flow.csv` (spec §6.1).
//!
//! `segments.csv` has a fixed core schema (`seg_id, seg_label, width_m,
//! segment_type`) plus a pair of columns per event (`{event}_from_km,
//! {event}_to_km`). Event names are never hardcoded: they are discovered
//! by matching the `_from_km`/`_to_km` column-name suffixes, the same
//! dynamic-column-discovery contract spec.md §6.1 requires of the source
//! system, reworked here as a one-time schema scan instead of per-row
//! runtime dispatch (spec §9, "Dynamically-typed ingestion").

use std::collections::BTreeMap;
use std::path::Path;

use courseflow_core::{
    Course, CourseflowError, CourseflowResult, EventSpan, FlowPair, FlowType, Kilometers,
    LoadDiagnostics, Meters, SchemaClass, Segment,
};

const SEGMENT_CORE_COLUMNS: &[&str] = &["seg_id", "seg_label", "width_m", "segment_type"];
const FLOW_REQUIRED_COLUMNS: &[&str] = &[
    "seg_id",
    "event_a",
    "event_b",
    "from_km_a",
    "to_km_a",
    "from_km_b",
    "to_km_b",
    "flow_type",
];

/// Discover event names from a `segments.csv` header by matching
/// `{event}_from_km` / `{event}_to_km` column pairs. An event is only
/// recognized if both columns are present.
fn discover_events(headers: &csv::StringRecord) -> Vec<String> {
    let columns: Vec<&str> = headers.iter().collect();
    let mut events = Vec::new();
    for col in &columns {
        if let Some(prefix) = col.strip_suffix("_from_km") {
            let to_col = format!("{prefix}_to_km");
            if columns.contains(&to_col.as_str()) {
                events.push(prefix.to_string());
            }
        }
    }
    events.sort();
    events
}

fn parse_schema_class(raw: &str) -> CourseflowResult<SchemaClass> {
    match raw {
        "start_corral" => Ok(SchemaClass::StartCorral),
        "on_course_narrow" => Ok(SchemaClass::OnCourseNarrow),
        "on_course_open" => Ok(SchemaClass::OnCourseOpen),
        other => Err(CourseflowError::Data(format!(
            "unknown segment_type '{other}'"
        ))),
    }
}

fn parse_flow_type(raw: &str) -> CourseflowResult<FlowType> {
    match raw {
        "overtake" => Ok(FlowType::Overtake),
        "merge" => Ok(FlowType::Merge),
        "counterflow" => Ok(FlowType::Counterflow),
        "parallel" => Ok(FlowType::Parallel),
        "none" => Ok(FlowType::None),
        other => Err(CourseflowError::Data(format!(
            "unknown flow_type '{other}'"
        ))),
    }
}

/// Load `segments.csv`, discovering per-event span columns dynamically.
/// Returns the raw segment map plus diagnostics (segments skipped for
/// `width_missing`/`short_segment` are recorded, not silently dropped,
/// per spec §4.1's failure policy).
pub fn load_segments(
    path: impl AsRef<Path>,
) -> CourseflowResult<(BTreeMap<String, Segment>, LoadDiagnostics)> {
    let mut reader = csv::Reader::from_path(path.as_ref())
        .map_err(|e| CourseflowError::Data(format!("opening segments.csv: {e}")))?;
    let headers = reader.headers()?.clone();

    for required in SEGMENT_CORE_COLUMNS {
        if !headers.iter().any(|h| h == *required) {
            return Err(CourseflowError::Config(format!(
                "segments.csv missing required column '{required}'"
            )));
        }
    }

    let events = discover_events(&headers);
    let mut diag = LoadDiagnostics::new();
    let mut segments = BTreeMap::new();

    for (line, result) in reader.records().enumerate() {
        let record = result.map_err(CourseflowError::from)?;
        let row = RowView::new(&headers, &record);

        let seg_id = row.get("seg_id")?.to_string();
        let label = row.get("seg_label")?.to_string();
        let width_raw: f64 = row
            .get("width_m")?
            .parse()
            .map_err(|_| CourseflowError::Data(format!("seg_id={seg_id}: invalid width_m")))?;
        let schema_class = parse_schema_class(row.get("segment_type")?)?;

        if width_raw <= 0.0 {
            diag.skip_segment("width_missing", &format!("seg_id={seg_id}"));
            continue;
        }

        let mut spans = BTreeMap::new();
        for event in &events {
            let from_col = format!("{event}_from_km");
            let to_col = format!("{event}_to_km");
            let (Some(from_raw), Some(to_raw)) = (row.get_opt(&from_col), row.get_opt(&to_col))
            else {
                continue;
            };
            if from_raw.is_empty() || to_raw.is_empty() {
                continue;
            }
            let from_km: f64 = from_raw.parse().map_err(|_| {
                CourseflowError::Data(format!("seg_id={seg_id}: invalid {from_col}"))
            })?;
            let to_km: f64 = to_raw
                .parse()
                .map_err(|_| CourseflowError::Data(format!("seg_id={seg_id}: invalid {to_col}")))?;
            spans.insert(
                event.clone(),
                EventSpan {
                    from_km: Kilometers(from_km),
                    to_km: Kilometers(to_km),
                },
            );
        }

        diag.stats.segments += 1;
        segments.insert(
            seg_id.clone(),
            Segment {
                seg_id,
                label,
                width_m: Meters(width_raw),
                schema_class,
                spans,
                geometry: Vec::new(),
            },
        );
        let _ = line;
    }

    Ok((segments, diag))
}

/// Load `flow.csv` into a list of `FlowPair` rows, preserving file order
/// (flow summaries are sorted by `seg_id` then pair-row index, spec §5).
pub fn load_flow_pairs(path: impl AsRef<Path>) -> CourseflowResult<Vec<FlowPair>> {
    let mut reader = csv::Reader::from_path(path.as_ref())
        .map_err(|e| CourseflowError::Config(format!("flow.csv missing or unreadable: {e}")))?;
    let headers = reader.headers()?.clone();

    for required in FLOW_REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == *required) {
            return Err(CourseflowError::Config(format!(
                "flow.csv missing required column '{required}'"
            )));
        }
    }

    let mut pairs = Vec::new();
    for result in reader.records() {
        let record = result.map_err(CourseflowError::from)?;
        let row = RowView::new(&headers, &record);

        pairs.push(FlowPair {
            seg_id: row.get("seg_id")?.to_string(),
            event_a: row.get("event_a")?.to_string(),
            event_b: row.get("event_b")?.to_string(),
            from_km_a: Kilometers(row.parse("from_km_a")?),
            to_km_a: Kilometers(row.parse("to_km_a")?),
            from_km_b: Kilometers(row.parse("from_km_b")?),
            to_km_b: Kilometers(row.parse("to_km_b")?),
            flow_type: parse_flow_type(row.get("flow_type")?)?,
            notes: row.get_opt("notes").filter(|s| !s.is_empty()).map(String::from),
        });
    }

    Ok(pairs)
}

/// Load both static files and assemble the immutable `Course`.
pub fn load_course(
    segments_path: impl AsRef<Path>,
    flow_path: impl AsRef<Path>,
) -> CourseflowResult<(Course, LoadDiagnostics)> {
    let (segments, mut diag) = load_segments(segments_path)?;
    let flow_pairs = load_flow_pairs(flow_path)?;
    diag.stats.flow_pairs = flow_pairs.len();
    let course = Course::new(segments, flow_pairs)?;
    Ok((course, diag))
}

/// Thin positional lookup over a CSV row by header name, so callers don't
/// have to track column indices by hand.
struct RowView<'a> {
    headers: &'a csv::StringRecord,
    record: &'a csv::StringRecord,
}

impl<'a> RowView<'a> {
    fn new(headers: &'a csv::StringRecord, record: &'a csv::StringRecord) -> Self {
        Self { headers, record }
    }

    fn get_opt(&self, column: &str) -> Option<&str> {
        self.headers
            .iter()
            .position(|h| h == column)
            .and_then(|idx| self.record.get(idx))
    }

    fn get(&self, column: &str) -> CourseflowResult<&str> {
        self.get_opt(column)
            .ok_or_else(|| CourseflowError::Data(format!("missing column '{column}'")))
    }

    fn parse(&self, column: &str) -> CourseflowResult<f64> {
        self.get(column)?
            .parse()
            .map_err(|_| CourseflowError::Data(format!("invalid numeric value in '{column}'")))
    }
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
    fn discovers_events_from_column_suffixes() {
        let mut record = csv::StringRecord::new();
        for h in [
            "seg_id",
            "seg_label",
            "width_m",
            "segment_type",
            "full_from_km",
            "full_to_km",
            "half_from_km",
            "half_to_km",
        ] {
            record.push_field(h);
        }
        let events = discover_events(&record);
        assert_eq!(events, vec!["full".to_string(), "half".to_string()]);
    }

    #[test]
    fn load_segments_skips_width_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "segments.csv",
            "seg_id,seg_label,width_m,segment_type,full_from_km,full_to_km\n\
             A1,Start,5.0,start_corral,0.0,0.9\n\
             B2,Bad,0.0,on_course_narrow,0.9,2.0\n",
        );

        let (segments, diag) = load_segments(&path).unwrap();
        assert_eq!(segments.len(), 1);
        assert!(segments.contains_key("A1"));
        assert_eq!(diag.stats.segments_skipped, 1);
    }

    #[test]
    fn load_flow_pairs_reads_rows_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "flow.csv",
            "seg_id,event_a,event_b,from_km_a,to_km_a,from_km_b,to_km_b,flow_type,notes\n\
             A1,full,half,0.0,0.9,0.0,0.9,overtake,\n",
        );

        let pairs = load_flow_pairs(&path).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].flow_type, FlowType::Overtake);
        assert_eq!(pairs[0].notes, None);
    }

    #[test]
    fn load_flow_pairs_fails_fast_on_missing_file() {
        let err = load_flow_pairs("/nonexistent/flow.csv").unwrap_err();
        assert!(matches!(err, CourseflowError::Config(_)));
    }
}
