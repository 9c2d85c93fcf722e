//! # courseflow-core: course and runner data model
//!
//! Provides the fundamental, immutable data structures shared by every
//! engine in the pipeline: the course geometry (`Course`, `Segment`,
//! `FlowPair`), the runner field (`ParticipantSet`, `Event`, `Participant`),
//! the per-day time grid (`TimeWindow`, `DistanceBin`), and the analytic
//! output rows produced by the binning, flow, and aggregation engines
//! (`Bin`, `SegmentWindow`, `OverlapAudit`, `FlowSummary`).
//!
//! ## Design philosophy
//!
//! The course is modeled as an arena of segments keyed by `seg_id` rather
//! than a graph of cross-referencing objects: events and flow pairs hold
//! `seg_id` strings, never back-pointers into the course. This avoids the
//! ownership cycles a naive "segment points at its events, events point
//! back at the segment" design would create, and keeps `Course` and
//! `ParticipantSet` trivially shareable (`Arc`-free, read-only) across the
//! day workers described in the pipeline crate.
//!
//! ## Quick start
//!
//! ```rust
//! use courseflow_core::*;
//!
//! let mut segments = std::collections::BTreeMap::new();
//! segments.insert(
//!     "A1".to_string(),
//!     Segment {
//!         seg_id: "A1".to_string(),
//!         label: "Start corral".to_string(),
//!         width_m: Meters(5.0),
//!         schema_class: SchemaClass::StartCorral,
//!         spans: [("full".to_string(), EventSpan { from_km: Kilometers(0.0), to_km: Kilometers(0.9) })]
//!             .into_iter()
//!             .collect(),
//!         geometry: Vec::new(),
//!     },
//! );
//! let course = Course::new(segments, Vec::new()).unwrap();
//! assert!(course.segment("A1").is_some());
//! assert!(course.uses_segment("A1", "full"));
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod diagnostics;
pub mod error;
pub mod units;

pub use diagnostics::{
    DiagnosticIssue, Diagnostics, LoadDiagnostics, LoadStats, Severity as DiagSeverity,
};
pub use error::{CourseflowError, CourseflowResult};
pub use units::{
    Kilometers, Meters, Minutes, PaceMinPerKm, PerSquareMeter, RatePerMeterPerMin, Seconds,
};

// ============================================================================
// Course model
// ============================================================================

/// Construction-time classification of a segment, used to pick a flow
/// capacity from the LOS rulebook (spec §4.1 step 5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaClass {
    StartCorral,
    OnCourseNarrow,
    OnCourseOpen,
}

impl std::fmt::Display for SchemaClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SchemaClass::StartCorral => "start_corral",
            SchemaClass::OnCourseNarrow => "on_course_narrow",
            SchemaClass::OnCourseOpen => "on_course_open",
        };
        write!(f, "{s}")
    }
}

/// A single lat/lon vertex of a segment's geometry polyline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

/// The `[from_km, to_km]` span an event covers on a given segment. A
/// segment is *used by* an event iff an entry exists for that event name.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventSpan {
    pub from_km: Kilometers,
    pub to_km: Kilometers,
}

impl EventSpan {
    pub fn length(&self) -> Kilometers {
        self.to_km - self.from_km
    }
}

/// A course segment: immutable once loaded. `width_m` is the physical
/// corridor width; `width_effective_m` (spec §3, Bin invariant) halves it
/// for bidirectional schema classes since runners only use one direction's
/// share of the corridor at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub seg_id: String,
    pub label: String,
    pub width_m: Meters,
    pub schema_class: SchemaClass,
    /// Per-event `[from_km, to_km]` spans, keyed by event name.
    pub spans: BTreeMap<String, EventSpan>,
    pub geometry: Vec<LatLon>,
}

impl Segment {
    /// True iff `event` has a defined span on this segment.
    pub fn used_by(&self, event: &str) -> bool {
        self.spans.contains_key(event)
    }

    pub fn span_for(&self, event: &str) -> Option<EventSpan> {
        self.spans.get(event).copied()
    }

    /// `width_effective = width_m/2` for bidirectional on-course segments,
    /// else `width_m` (spec §3, `Bin` invariant).
    pub fn width_effective(&self) -> Meters {
        match self.schema_class {
            SchemaClass::OnCourseNarrow | SchemaClass::OnCourseOpen => self.width_m / 2.0,
            SchemaClass::StartCorral => self.width_m,
        }
    }
}

/// The interaction type declared by a `flow.csv` row. Taken verbatim from
/// the pair row; the flow engine only validates consistency (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowType {
    Overtake,
    Merge,
    Counterflow,
    Parallel,
    None,
}

impl std::fmt::Display for FlowType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FlowType::Overtake => "overtake",
            FlowType::Merge => "merge",
            FlowType::Counterflow => "counterflow",
            FlowType::Parallel => "parallel",
            FlowType::None => "none",
        };
        write!(f, "{s}")
    }
}

/// A declared interaction between two events on a shared segment (spec §3).
/// `event_a`/`event_b` ordering is semantic — set by the course designer,
/// never derived or re-sorted by the engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowPair {
    pub seg_id: String,
    pub event_a: String,
    pub event_b: String,
    pub from_km_a: Kilometers,
    pub to_km_a: Kilometers,
    pub from_km_b: Kilometers,
    pub to_km_b: Kilometers,
    pub flow_type: FlowType,
    pub notes: Option<String>,
}

/// Immutable arena of segments, keyed by `seg_id`, plus the flow pairs
/// declared over them. Segments never hold back-references to events or
/// pairs; lookups always go through `Course`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Course {
    segments: BTreeMap<String, Segment>,
    flow_pairs: Vec<FlowPair>,
}

impl Course {
    /// Build a course, validating the invariants spec §3 places on
    /// `FlowPair`: both events must use `seg_id`, and `seg_id` must exist.
    /// Day membership (`event_a`/`event_b` same day) is validated later by
    /// the day partitioner, which is the first point `Event` day tags are
    /// in scope.
    pub fn new(
        segments: BTreeMap<String, Segment>,
        flow_pairs: Vec<FlowPair>,
    ) -> CourseflowResult<Self> {
        for pair in &flow_pairs {
            let seg = segments.get(&pair.seg_id).ok_or_else(|| {
                CourseflowError::Config(format!(
                    "flow pair references unknown segment '{}'",
                    pair.seg_id
                ))
            })?;
            if !seg.used_by(&pair.event_a) {
                return Err(CourseflowError::Config(format!(
                    "flow pair seg_id='{}' event_a='{}' does not use that segment",
                    pair.seg_id, pair.event_a
                )));
            }
            if !seg.used_by(&pair.event_b) {
                return Err(CourseflowError::Config(format!(
                    "flow pair seg_id='{}' event_b='{}' does not use that segment",
                    pair.seg_id, pair.event_b
                )));
            }
        }
        Ok(Self {
            segments,
            flow_pairs,
        })
    }

    pub fn segment(&self, seg_id: &str) -> Option<&Segment> {
        self.segments.get(seg_id)
    }

    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.values()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn flow_pairs(&self) -> &[FlowPair] {
        &self.flow_pairs
    }

    /// All flow pairs declared over `seg_id`.
    pub fn flow_pairs_for_segment<'a>(
        &'a self,
        seg_id: &'a str,
    ) -> impl Iterator<Item = &'a FlowPair> {
        self.flow_pairs.iter().filter(move |p| p.seg_id == seg_id)
    }

    /// True iff `event` has a span on `seg_id`.
    pub fn uses_segment(&self, seg_id: &str, event: &str) -> bool {
        self.segments
            .get(seg_id)
            .map(|s| s.used_by(event))
            .unwrap_or(false)
    }

    /// Segments used by at least one of the given events, in `seg_id` order.
    pub fn segments_used_by<'a>(&'a self, events: &'a [String]) -> Vec<&'a Segment> {
        self.segments
            .values()
            .filter(|s| events.iter().any(|e| s.used_by(e)))
            .collect()
    }
}

// ============================================================================
// Participant model
// ============================================================================

/// One wave of the race (spec §3). `name` is normalized lowercase at load
/// time by the I/O layer; `start_time_min` is minutes after midnight and
/// must fall in `[300, 1200]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub name: String,
    pub day: String,
    pub start_time_min: Minutes,
    pub duration_min: Minutes,
    pub runners_file: String,
    pub gpx_file: Option<String>,
}

/// One runner's static record. `runner_id` is unique across *all* events
/// within a run (spec §3) — duplicate detection happens at load time in
/// `courseflow-io`, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub runner_id: String,
    pub event: String,
    pub pace_min_per_km: PaceMinPerKm,
    pub start_offset_s: Seconds,
    pub day: String,
}

impl Participant {
    /// Absolute wall-clock seconds this runner reaches `distance_km` along
    /// their event's course, given the event's start time. This is the
    /// "absolute clock" the binning engine's defect guard (spec §4.1 step 2,
    /// Issue #243) requires: `event.start + offset + position_time(km)`,
    /// never an offset from the day anchor `t0`.
    pub fn absolute_time_at(&self, event: &Event, distance_km: Kilometers) -> Seconds {
        event.start_time_min.to_seconds()
            + self.start_offset_s
            + self.pace_min_per_km.time_for(distance_km).to_seconds()
    }
}

/// Immutable, read-only field of runners plus their events for one run.
/// Shared without locking across all day workers (spec §5).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParticipantSet {
    events: BTreeMap<String, Event>,
    /// Runners grouped by event name, in load order.
    participants: BTreeMap<String, Vec<Participant>>,
}

impl ParticipantSet {
    pub fn new(events: Vec<Event>, participants: Vec<Participant>) -> CourseflowResult<Self> {
        let mut event_map = BTreeMap::new();
        for e in events {
            if event_map.contains_key(&e.name) {
                return Err(CourseflowError::Config(format!(
                    "duplicate event name '{}'",
                    e.name
                )));
            }
            event_map.insert(e.name.clone(), e);
        }

        let mut by_event: BTreeMap<String, Vec<Participant>> = BTreeMap::new();
        let mut seen_runner_ids = std::collections::HashSet::new();
        for p in participants {
            if !event_map.contains_key(&p.event) {
                return Err(CourseflowError::Config(format!(
                    "participant references unknown event '{}'",
                    p.event
                )));
            }
            if !seen_runner_ids.insert(p.runner_id.clone()) {
                return Err(CourseflowError::Data(format!(
                    "duplicate runner_id '{}' across events",
                    p.runner_id
                )));
            }
            by_event.entry(p.event.clone()).or_default().push(p);
        }

        Ok(Self {
            events: event_map,
            participants: by_event,
        })
    }

    pub fn event(&self, name: &str) -> Option<&Event> {
        self.events.get(name)
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.values()
    }

    pub fn events_for_day<'a>(&'a self, day: &'a str) -> impl Iterator<Item = &'a Event> {
        self.events.values().filter(move |e| e.day == day)
    }

    pub fn days(&self) -> Vec<String> {
        let mut days: Vec<String> = self.events.values().map(|e| e.day.clone()).collect();
        days.sort();
        days.dedup();
        days
    }

    pub fn participants_for(&self, event: &str) -> &[Participant] {
        self.participants
            .get(event)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn participant_count(&self, event: &str) -> usize {
        self.participants_for(event).len()
    }

    pub fn total_participants(&self) -> usize {
        self.participants.values().map(|v| v.len()).sum()
    }
}

// ============================================================================
// Day plan & global timeline
// ============================================================================

/// One day's worth of work handed to the pipeline orchestrator (spec §4,
/// Day Partitioner / Global Timeline Builder). Owns its own timeline; never
/// shared across days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub day: String,
    pub events: Vec<String>,
    pub segment_ids: Vec<String>,
    /// Day anchor `t0`: `min(event.start_time_min)` over the day's events.
    pub anchor_t0: Minutes,
}

/// Half-open time window `[t_start, t_end)` on the global day grid,
/// indexed by integer `k` relative to the day anchor `t0` (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub k: i64,
    pub t_start: Seconds,
    pub t_end: Seconds,
}

impl TimeWindow {
    pub fn contains(&self, t: Seconds) -> bool {
        t >= self.t_start && t < self.t_end
    }

    /// True iff `[a, b)` intersects `[t_start, t_end)`.
    pub fn overlaps(&self, a: Seconds, b: Seconds) -> bool {
        a < self.t_end && b > self.t_start
    }
}

/// Half-open distance interval `[km_start, km_end)` within a segment,
/// indexed by integer `j` (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceBin {
    pub j: i64,
    pub km_start: Kilometers,
    pub km_end: Kilometers,
}

impl DistanceBin {
    pub fn contains(&self, km: Kilometers) -> bool {
        km >= self.km_start && km < self.km_end
    }
}

// ============================================================================
// Binning engine output
// ============================================================================

/// Discrete A–F classification of instantaneous areal density (spec §4.1
/// step 6, GLOSSARY).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LosClass {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl std::fmt::Display for LosClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LosClass::A => "A",
            LosClass::B => "B",
            LosClass::C => "C",
            LosClass::D => "D",
            LosClass::E => "E",
            LosClass::F => "F",
        };
        write!(f, "{s}")
    }
}

/// Flag tier derived from LOS and flow utilization (spec §4.1 step 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinSeverity {
    None,
    Watch,
    Critical,
}

impl std::fmt::Display for BinSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BinSeverity::None => "none",
            BinSeverity::Watch => "watch",
            BinSeverity::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

/// A single `(seg_id, distance bin j, time window k)` cell (spec §3).
///
/// Invariant enforced by construction (see `courseflow-binning`): `areal_density_p_per_m2
/// * Δx_m * width_effective_m == concurrent_count` within `1e-9` relative
/// error (spec §8, property 2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    pub seg_id: String,
    pub j: i64,
    pub k: i64,
    pub km_start: Kilometers,
    pub km_end: Kilometers,
    pub t_start: Seconds,
    pub t_end: Seconds,
    pub concurrent_count: u32,
    pub areal_density_p_per_m2: PerSquareMeter,
    pub linear_rate_per_m_per_min: RatePerMeterPerMin,
    pub flow_utilization: f64,
    pub los_class: LosClass,
    pub severity: BinSeverity,
    pub flag_reason: Option<String>,
}

/// Canonical per-`(seg_id, k)` rollup of bins (spec §3, §4.3). This is the
/// single source of truth for all downstream reports and map layers; any
/// other segment metric disagreeing with it is a bug (GLOSSARY, Canonical).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentWindow {
    pub seg_id: String,
    pub k: i64,
    pub t_start: Seconds,
    pub t_end: Seconds,
    pub density_mean: PerSquareMeter,
    pub density_peak: PerSquareMeter,
    pub n_bins: u32,
}

// ============================================================================
// Flow engine output
// ============================================================================

/// Sign of a signed time delta, used for `rel_order_entry`/`rel_order_exit`
/// (spec §4.2 step 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelOrder {
    AFirst,
    BFirst,
    Tied,
}

impl RelOrder {
    pub fn from_delta(delta: Seconds) -> Self {
        if delta.value() < 0.0 {
            RelOrder::AFirst
        } else if delta.value() > 0.0 {
            RelOrder::BFirst
        } else {
            RelOrder::Tied
        }
    }
}

/// One realized pairwise overlap between a runner of event A and a runner
/// of event B on a shared segment (spec §3, `OverlapAudit`). One row per
/// encounter; never mutated after emission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlapAudit {
    pub seg_id: String,
    pub event_a: String,
    pub event_b: String,
    pub runner_id_a: String,
    pub runner_id_b: String,
    pub entry_km_a: Kilometers,
    pub exit_km_a: Kilometers,
    pub entry_time_a: Seconds,
    pub exit_time_a: Seconds,
    pub entry_km_b: Kilometers,
    pub exit_km_b: Kilometers,
    pub entry_time_b: Seconds,
    pub exit_time_b: Seconds,
    pub overlap_dwell_s: Seconds,
    pub entry_delta_s: Seconds,
    pub exit_delta_s: Seconds,
    pub rel_order_entry: RelOrder,
    pub rel_order_exit: RelOrder,
    pub order_flip: bool,
    pub directional_gain_s: Seconds,
    pub pass_flag_raw: bool,
    pub pass_flag_strict: bool,
    pub in_conflict_zone: bool,
    pub flow_type: FlowType,
}

/// Aggregated outcome for one flow pair on one day (spec §3). Unique-runner
/// counts, not encounter counts; `overtaking_a`/`overtaking_b` are the
/// published (strict-first-gated) counts, never the raw ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSummary {
    pub seg_id: String,
    pub event_a: String,
    pub event_b: String,
    pub has_convergence: bool,
    pub overtaking_a: u32,
    pub overtaking_b: u32,
    pub copresence_count: u32,
    pub cz_start_a: Kilometers,
    pub cz_end_a: Kilometers,
    pub cz_start_b: Kilometers,
    pub cz_end_b: Kilometers,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(spans: &[(&str, f64, f64)]) -> Segment {
        Segment {
            seg_id: "A1".to_string(),
            label: "Test segment".to_string(),
            width_m: Meters(5.0),
            schema_class: SchemaClass::OnCourseNarrow,
            spans: spans
                .iter()
                .map(|(name, from, to)| {
                    (
                        name.to_string(),
                        EventSpan {
                            from_km: Kilometers(*from),
                            to_km: Kilometers(*to),
                        },
                    )
                })
                .collect(),
            geometry: Vec::new(),
        }
    }

    #[test]
    fn segment_used_by_checks_span_presence() {
        let seg = segment(&[("full", 0.0, 0.9)]);
        assert!(seg.used_by("full"));
        assert!(!seg.used_by("half"));
    }

    #[test]
    fn width_effective_halves_for_on_course_segments() {
        let seg = segment(&[("full", 0.0, 0.9)]);
        assert_eq!(seg.width_effective(), Meters(2.5));

        let mut corral = segment(&[("full", 0.0, 0.9)]);
        corral.schema_class = SchemaClass::StartCorral;
        assert_eq!(corral.width_effective(), Meters(5.0));
    }

    #[test]
    fn course_rejects_flow_pair_with_unused_event() {
        let mut segments = BTreeMap::new();
        segments.insert("A1".to_string(), segment(&[("full", 0.0, 0.9)]));

        let pair = FlowPair {
            seg_id: "A1".to_string(),
            event_a: "full".to_string(),
            event_b: "half".to_string(),
            from_km_a: Kilometers(0.0),
            to_km_a: Kilometers(0.9),
            from_km_b: Kilometers(0.0),
            to_km_b: Kilometers(0.9),
            flow_type: FlowType::Overtake,
            notes: None,
        };

        let err = Course::new(segments, vec![pair]).unwrap_err();
        assert!(matches!(err, CourseflowError::Config(_)));
    }

    #[test]
    fn course_accepts_valid_flow_pair() {
        let mut segments = BTreeMap::new();
        segments.insert(
            "A1".to_string(),
            segment(&[("full", 0.0, 0.9), ("half", 0.0, 0.9)]),
        );

        let pair = FlowPair {
            seg_id: "A1".to_string(),
            event_a: "full".to_string(),
            event_b: "half".to_string(),
            from_km_a: Kilometers(0.0),
            to_km_a: Kilometers(0.9),
            from_km_b: Kilometers(0.0),
            to_km_b: Kilometers(0.9),
            flow_type: FlowType::Overtake,
            notes: None,
        };

        let course = Course::new(segments, vec![pair]).unwrap();
        assert_eq!(course.flow_pairs_for_segment("A1").count(), 1);
    }

    #[test]
    fn participant_set_rejects_duplicate_runner_ids() {
        let events = vec![Event {
            name: "full".to_string(),
            day: "sun".to_string(),
            start_time_min: Minutes(420.0),
            duration_min: Minutes(300.0),
            runners_file: "full_runners.csv".to_string(),
            gpx_file: None,
        }];
        let participants = vec![
            Participant {
                runner_id: "1".to_string(),
                event: "full".to_string(),
                pace_min_per_km: PaceMinPerKm(5.0),
                start_offset_s: Seconds(0.0),
                day: "sun".to_string(),
            },
            Participant {
                runner_id: "1".to_string(),
                event: "full".to_string(),
                pace_min_per_km: PaceMinPerKm(5.5),
                start_offset_s: Seconds(0.0),
                day: "sun".to_string(),
            },
        ];

        let err = ParticipantSet::new(events, participants).unwrap_err();
        assert!(matches!(err, CourseflowError::Data(_)));
    }

    #[test]
    fn participant_absolute_time_uses_event_start_not_day_anchor() {
        let event = Event {
            name: "half".to_string(),
            day: "sun".to_string(),
            start_time_min: Minutes(460.0),
            duration_min: Minutes(200.0),
            runners_file: "half_runners.csv".to_string(),
            gpx_file: None,
        };
        let runner = Participant {
            runner_id: "42".to_string(),
            event: "half".to_string(),
            pace_min_per_km: PaceMinPerKm(5.0),
            start_offset_s: Seconds(0.0),
            day: "sun".to_string(),
        };

        let t = runner.absolute_time_at(&event, Kilometers(1.0));
        assert!((t.value() - (460.0 * 60.0 + 5.0 * 60.0)).abs() < 1e-9);
    }

    #[test]
    fn time_window_overlap_is_half_open() {
        let w = TimeWindow {
            k: 0,
            t_start: Seconds(0.0),
            t_end: Seconds(30.0),
        };
        assert!(w.overlaps(Seconds(29.0), Seconds(31.0)));
        assert!(!w.overlaps(Seconds(30.0), Seconds(40.0)));
        assert!(!w.overlaps(Seconds(-10.0), Seconds(0.0)));
    }

    #[test]
    fn rel_order_from_delta_sign() {
        assert_eq!(RelOrder::from_delta(Seconds(-1.0)), RelOrder::AFirst);
        assert_eq!(RelOrder::from_delta(Seconds(1.0)), RelOrder::BFirst);
        assert_eq!(RelOrder::from_delta(Seconds(0.0)), RelOrder::Tied);
    }
}
