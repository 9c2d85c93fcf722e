//! The `AnalysisRequest` configuration object (spec §6.1).
//!
//! Loaded once from JSON or YAML — the same dual-format convenience the
//! teacher workspace's scenario-set loader offers — and never carries a
//! default event list, start time, or file path: every field that spec
//! §6.1 and §7 require to be explicit is a required field here, so a
//! missing value surfaces as a `serde` deserialization error (mapped to
//! `ConfigError`) rather than silently falling back to a guess.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use courseflow_binning::LosRulebook;
use courseflow_core::{CourseflowError, CourseflowResult, Minutes};
use serde::{Deserialize, Serialize};

/// One entry of `AnalysisRequest.events[*]` (spec §6.1). All fields are
/// required — there is no default event name, day, start time, or file
/// path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRequest {
    pub name: String,
    pub day: String,
    pub start_time_min: f64,
    pub duration_min: f64,
    pub runners_file: String,
    #[serde(default)]
    pub gpx_file: Option<String>,
}

/// `los_rulebook` (spec §6.1): either an inline override or a path to a
/// JSON/YAML file holding one. Absent entirely means "use
/// `LosRulebook::default()`" — the one config key spec §6.1 documents
/// as optional rather than fail-fast-required.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LosRulebookOverride {
    Inline(LosRulebook),
    Path(PathBuf),
}

impl LosRulebookOverride {
    pub fn resolve(&self, base_dir: &Path) -> CourseflowResult<LosRulebook> {
        match self {
            LosRulebookOverride::Inline(rb) => Ok(rb.clone()),
            LosRulebookOverride::Path(path) => {
                let full = if path.is_absolute() {
                    path.clone()
                } else {
                    resolve_request_path(base_dir, &path.to_string_lossy())?
                };
                let text = std::fs::read_to_string(&full).map_err(|e| {
                    CourseflowError::Config(format!(
                        "reading los_rulebook override '{}': {e}",
                        full.display()
                    ))
                })?;
                parse_structured::<LosRulebook>(&full, &text)
            }
        }
    }
}

/// The analysis request the pipeline orchestrator consumes (spec §6.1).
/// `segments_file`/`flow_file` are the static course definitions;
/// `events` defines the runtime event set. Every numeric threshold
/// documented in §6.1's table carries the documented default via
/// `#[serde(default = ...)]`, but `events`, `segments_file`, and
/// `flow_file` have none — a request omitting them fails to parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub segments_file: String,
    pub flow_file: String,
    pub events: Vec<EventRequest>,
    #[serde(default = "default_bin_dx_km")]
    pub bin_dx_km: f64,
    #[serde(default = "default_bin_dt_s")]
    pub bin_dt_s: f64,
    #[serde(default = "default_max_bins")]
    pub max_bins: usize,
    #[serde(default = "default_soft_timeout_ms")]
    pub soft_timeout_ms: u64,
    #[serde(default = "default_min_overlap_dwell_s")]
    pub min_overlap_dwell_s: f64,
    #[serde(default = "default_strict_gain_s")]
    pub strict_gain_s: f64,
    #[serde(default)]
    pub los_rulebook: Option<LosRulebookOverride>,
    /// Optional free-form tags (environment, requester) passed through
    /// verbatim to `Flow.csv`'s `environment` column and `metadata.json`;
    /// never interpreted by the engines.
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
}

fn default_bin_dx_km() -> f64 {
    0.1
}
fn default_bin_dt_s() -> f64 {
    30.0
}
fn default_max_bins() -> usize {
    10_000
}
fn default_soft_timeout_ms() -> u64 {
    30_000
}
fn default_min_overlap_dwell_s() -> f64 {
    5.0
}
fn default_strict_gain_s() -> f64 {
    2.0
}

impl AnalysisRequest {
    /// Load a request from a `.json`/`.yaml`/`.yml` file, selecting the
    /// parser by extension (spec §3 "Configuration": dual JSON/YAML
    /// support, same convenience the teacher's scenario-set loader
    /// offers).
    pub fn load(path: impl AsRef<Path>) -> CourseflowResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            CourseflowError::Config(format!("reading analysis request '{}': {e}", path.display()))
        })?;
        let request: AnalysisRequest = parse_structured(path, &text)?;
        request.validate()?;
        Ok(request)
    }

    /// Fail-fast structural validation beyond what `serde` enforces:
    /// event start times in range, non-empty event list, distinct event
    /// names (spec §3 `Event` invariant: `start_time_min` in `[300,
    /// 1200]`).
    fn validate(&self) -> CourseflowResult<()> {
        if self.events.is_empty() {
            return Err(CourseflowError::Config(
                "analysis request defines no events".to_string(),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for event in &self.events {
            if !seen.insert(event.name.as_str()) {
                return Err(CourseflowError::Config(format!(
                    "duplicate event name '{}' in analysis request",
                    event.name
                )));
            }
            if !(300.0..=1200.0).contains(&event.start_time_min) {
                return Err(CourseflowError::Config(format!(
                    "event '{}': start_time_min {} out of range [300, 1200]",
                    event.name, event.start_time_min
                )));
            }
        }
        if self.bin_dx_km < courseflow_binning::MIN_DX_KM {
            return Err(CourseflowError::Config(format!(
                "bin_dx_km {} below minimum {}",
                self.bin_dx_km,
                courseflow_binning::MIN_DX_KM
            )));
        }
        Ok(())
    }

    pub fn event_minutes(&self, event: &EventRequest) -> (Minutes, Minutes) {
        (Minutes(event.start_time_min), Minutes(event.duration_min))
    }

    /// Resolve one of this request's relative file references
    /// (`segments_file`, `flow_file`, an event's `runners_file`) against
    /// `request_dir`, rejecting traversal outside it (spec §6.1's
    /// request object is attacker-reachable input from the HTTP layer,
    /// so a `runners_file` of `../../etc/passwd` must fail here rather
    /// than inside the CSV reader).
    pub fn resolve_file(&self, request_dir: &Path, relative: &str) -> CourseflowResult<PathBuf> {
        resolve_request_path(request_dir, relative)
    }
}

/// Join `relative` onto `request_dir` and validate the result stays
/// within it and carries an allowed extension (spec §6.1 static files:
/// `.csv`, `.json`, `.yaml`/`.yml`), via the same
/// [`crate::helpers::path_security`] validator the teacher workspace
/// uses for import paths.
pub fn resolve_request_path(request_dir: &Path, relative: &str) -> CourseflowResult<PathBuf> {
    let candidate = request_dir.join(relative);
    crate::helpers::path_security::validate_import_path_within(&candidate, request_dir)
        .map(|secure| secure.path().to_path_buf())
        .map_err(|e| CourseflowError::Config(format!("resolving '{relative}': {e}")))
}

fn parse_structured<T: for<'de> Deserialize<'de>>(
    path: &Path,
    text: &str,
) -> CourseflowResult<T> {
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        serde_yaml::from_str(text)
            .map_err(|e| CourseflowError::Config(format!("parsing '{}': {e}", path.display())))
    } else {
        serde_json::from_str(text)
            .map_err(|e| CourseflowError::Config(format!("parsing '{}': {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    fn sample_json() -> &'static str {
        r#"{
            "segments_file": "segments.csv",
            "flow_file": "flow.csv",
            "events": [
                {"name": "full", "day": "sun", "start_time_min": 420, "duration_min": 300, "runners_file": "full_runners.csv"}
            ]
        }"#
    }

    #[test]
    fn loads_json_request_with_defaults_applied() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "request.json", sample_json());
        let request = AnalysisRequest::load(&path).unwrap();
        assert_eq!(request.bin_dx_km, 0.1);
        assert_eq!(request.bin_dt_s, 30.0);
        assert_eq!(request.events.len(), 1);
    }

    #[test]
    fn loads_yaml_request() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = "segments_file: segments.csv\n\
                    flow_file: flow.csv\n\
                    events:\n\
                    \x20\x20- name: full\n\
                    \x20\x20\x20\x20day: sun\n\
                    \x20\x20\x20\x20start_time_min: 420\n\
                    \x20\x20\x20\x20duration_min: 300\n\
                    \x20\x20\x20\x20runners_file: full_runners.csv\n";
        let path = write_file(dir.path(), "request.yaml", yaml);
        let request = AnalysisRequest::load(&path).unwrap();
        assert_eq!(request.events[0].name, "full");
    }

    #[test]
    fn rejects_empty_event_list() {
        let dir = tempfile::tempdir().unwrap();
        let json = r#"{"segments_file": "s.csv", "flow_file": "f.csv", "events": []}"#;
        let path = write_file(dir.path(), "request.json", json);
        let err = AnalysisRequest::load(&path).unwrap_err();
        assert!(matches!(err, CourseflowError::Config(_)));
    }

    #[test]
    fn rejects_out_of_range_start_time() {
        let dir = tempfile::tempdir().unwrap();
        let json = r#"{
            "segments_file": "s.csv", "flow_file": "f.csv",
            "events": [{"name": "full", "day": "sun", "start_time_min": 100, "duration_min": 60, "runners_file": "r.csv"}]
        }"#;
        let path = write_file(dir.path(), "request.json", json);
        let err = AnalysisRequest::load(&path).unwrap_err();
        assert!(matches!(err, CourseflowError::Config(_)));
    }

    #[test]
    fn missing_required_field_fails_to_parse() {
        let dir = tempfile::tempdir().unwrap();
        // no segments_file
        let json = r#"{"flow_file": "f.csv", "events": []}"#;
        let path = write_file(dir.path(), "request.json", json);
        let err = AnalysisRequest::load(&path).unwrap_err();
        assert!(matches!(err, CourseflowError::Config(_)));
    }
}
