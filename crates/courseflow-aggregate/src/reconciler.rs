//! Reconciliation (spec §4.3, §6.3, §8): an independent recomputation of
//! each segment window's peak density, checked against the canonical
//! aggregator's output. The two must agree within a 2% relative error or
//! the day fails with `ReconcileError` and the artifact emitter refuses
//! to publish segment metrics for it (spec §4.3).
//!
//! The canonical path (`aggregate_day`) groups bins by `(seg_id, k)` and
//! takes the bin-level max of each bin's own `areal_density_p_per_m2`
//! field. The reconciliation path never reads that field: it re-derives
//! density from `concurrent_count` and the bin's own geometry — `count /
//! (Δx_m * width_effective_m)`, the defining relationship the binning
//! engine is supposed to have used to populate the field in the first
//! place — so a bug in that computation reproduces in the canonical
//! rollup but not here.

use std::collections::BTreeMap;

use courseflow_core::{Bin, Course, CourseflowError, CourseflowResult, SegmentWindow};

/// Maximum allowed relative error between canonical and recomputed peak
/// density before reconciliation fails (spec §4.3, §6.3).
pub const RECONCILE_REL_ERR_THRESHOLD: f64 = 0.02;

/// Per-`(seg_id, k)` reconciliation outcome, used to build the
/// `max_reconcile_rel_err` manifest field (spec §4.5).
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileReport {
    pub max_rel_err: f64,
    pub worst_seg_id: Option<String>,
    pub worst_k: Option<i64>,
}

impl ReconcileReport {
    pub fn passed(&self) -> bool {
        self.max_rel_err <= RECONCILE_REL_ERR_THRESHOLD
    }
}

/// Recompute peak density per `(seg_id, k)` from `concurrent_count` and
/// bin geometry, independent of both `aggregate_day`'s grouping code path
/// and the bin's own precomputed `areal_density_p_per_m2` field, and
/// compare to `windows` (spec §4.3 step 2: "recompute from bins, not from
/// the canonical rollup").
pub fn reconcile_day(bins: &[Bin], windows: &[SegmentWindow], course: &Course) -> CourseflowResult<ReconcileReport> {
    let mut recomputed_peak: BTreeMap<(String, i64), f64> = BTreeMap::new();
    for bin in bins {
        let segment = course.segment(&bin.seg_id).ok_or_else(|| {
            CourseflowError::Reconcile(format!("bin references unknown segment '{}'", bin.seg_id))
        })?;
        let dx_m = (bin.km_end - bin.km_start).to_meters().value();
        let width_m = segment.width_effective().value();
        let area_m2 = dx_m * width_m;
        let density = if area_m2.abs() < 1e-9 {
            0.0
        } else {
            bin.concurrent_count as f64 / area_m2
        };
        let entry = recomputed_peak
            .entry((bin.seg_id.clone(), bin.k))
            .or_insert(0.0);
        *entry = entry.max(density);
    }

    let mut max_rel_err = 0.0;
    let mut worst_seg_id = None;
    let mut worst_k = None;

    for window in windows {
        let key = (window.seg_id.clone(), window.k);
        let recomputed = recomputed_peak.get(&key).copied().ok_or_else(|| {
            CourseflowError::Reconcile(format!(
                "segment window ({}, k={}) has no matching bins to reconcile against",
                window.seg_id, window.k
            ))
        })?;
        let canonical = window.density_peak.value();
        let rel_err = if canonical.abs() < 1e-9 {
            (recomputed - canonical).abs()
        } else {
            (recomputed - canonical).abs() / canonical.abs()
        };
        if rel_err > max_rel_err {
            max_rel_err = rel_err;
            worst_seg_id = Some(window.seg_id.clone());
            worst_k = Some(window.k);
        }
    }

    Ok(ReconcileReport {
        max_rel_err,
        worst_seg_id,
        worst_k,
    })
}

/// Reconcile and fail fast with `ReconcileError` if the threshold is
/// exceeded (spec §4.3: "fails the day, not the whole run").
pub fn reconcile_or_fail(bins: &[Bin], windows: &[SegmentWindow], course: &Course) -> CourseflowResult<ReconcileReport> {
    let report = reconcile_day(bins, windows, course)?;
    if !report.passed() {
        return Err(CourseflowError::Reconcile(format!(
            "peak density reconciliation failed: max relative error {:.4} exceeds threshold {:.4} (worst at seg_id={:?}, k={:?})",
            report.max_rel_err, RECONCILE_REL_ERR_THRESHOLD, report.worst_seg_id, report.worst_k
        )));
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::aggregate_day;
    use courseflow_core::{
        BinSeverity, Kilometers, LosClass, PerSquareMeter, RatePerMeterPerMin, SchemaClass,
        Seconds, Segment,
    };
    use std::collections::BTreeMap;

    /// A 1m-wide, 100m-long start-corral segment, so `width_effective ==
    /// width_m` and the area works out to a flat 100 m².
    fn fixture_course(seg_id: &str) -> Course {
        let segment = Segment {
            seg_id: seg_id.to_string(),
            label: seg_id.to_string(),
            width_m: courseflow_core::Meters(1.0),
            schema_class: SchemaClass::StartCorral,
            spans: BTreeMap::new(),
            geometry: Vec::new(),
        };
        let mut segments = BTreeMap::new();
        segments.insert(seg_id.to_string(), segment);
        Course::new(segments, Vec::new()).unwrap()
    }

    /// `count` runners over a 100m-long, 1m-effective-width bin, so
    /// canonical density is `count / 100.0` — matching what the
    /// independent recomputation derives from `concurrent_count` alone.
    fn bin(seg_id: &str, k: i64, count: u32) -> Bin {
        let density = count as f64 / 100.0;
        Bin {
            seg_id: seg_id.to_string(),
            j: 0,
            k,
            km_start: Kilometers(0.0),
            km_end: Kilometers(0.1),
            t_start: Seconds(k as f64 * 30.0),
            t_end: Seconds((k + 1) as f64 * 30.0),
            concurrent_count: count,
            areal_density_p_per_m2: PerSquareMeter(density),
            linear_rate_per_m_per_min: RatePerMeterPerMin(0.0),
            flow_utilization: 0.0,
            los_class: LosClass::A,
            severity: BinSeverity::None,
            flag_reason: None,
        }
    }

    #[test]
    fn agreeing_canonical_and_recomputed_peaks_pass() {
        let course = fixture_course("A1");
        let bins = vec![bin("A1", 0, 10), bin("A1", 0, 30), bin("A1", 1, 20)];
        let windows = aggregate_day(&bins);
        let report = reconcile_or_fail(&bins, &windows, &course).unwrap();
        assert!(report.passed());
        assert_eq!(report.max_rel_err, 0.0);
    }

    #[test]
    fn window_missing_matching_bins_is_a_reconcile_error() {
        let course = fixture_course("A1");
        let bins = vec![bin("A1", 0, 10)];
        let windows = vec![SegmentWindow {
            seg_id: "A1".to_string(),
            k: 99,
            t_start: Seconds(0.0),
            t_end: Seconds(30.0),
            density_mean: PerSquareMeter(0.1),
            density_peak: PerSquareMeter(0.1),
            n_bins: 1,
        }];
        let err = reconcile_day(&bins, &windows, &course).unwrap_err();
        assert!(matches!(err, CourseflowError::Reconcile(_)));
    }

    #[test]
    fn a_tampered_canonical_peak_fails_reconciliation() {
        let course = fixture_course("A1");
        let bins = vec![bin("A1", 0, 10), bin("A1", 0, 30)];
        let mut windows = aggregate_day(&bins);
        windows[0].density_peak = PerSquareMeter(windows[0].density_peak.value() * 2.0);
        let err = reconcile_or_fail(&bins, &windows, &course).unwrap_err();
        assert!(matches!(err, CourseflowError::Reconcile(_)));
    }
}
