//! The Flow Analysis Engine (spec §4.2).
//!
//! `flow_day` walks every declared `FlowPair` active on a day, finds every
//! pairwise runner encounter inside the pair's conflict zone, and rolls
//! those encounters up into one `FlowSummary` per pair plus the full
//! `OverlapAudit` row set. The candidate-overlap search sorts one side by
//! conflict-zone entry time and bounds the scan with a partition point —
//! a middle ground between a full sweep-line active-set and a naive
//! all-pairs scan (see `other_examples` rail-graph conflict detector for
//! the sweep-line idea this is a simplification of).

use std::collections::HashSet;

use courseflow_core::{
    Course, CourseflowError, CourseflowResult, DayPlan, FlowPair, FlowSummary, FlowType,
    Kilometers, OverlapAudit, ParticipantSet, RelOrder, Seconds,
};
use tracing::warn;

use crate::params::FlowParams;

/// Dwell/gap values within this many seconds of zero are treated as
/// exactly zero, so floating-point noise at a conflict zone boundary
/// never manufactures a spurious zero-length encounter. This guards
/// against sign noise near zero; it is distinct from the threshold
/// snapping below, which is the spec §4.2 "Input normalization" step.
const EPS_DWELL_S: f64 = 0.01;

/// Dwell values within this many seconds of `MinOverlapDwellS` are
/// snapped to exactly that threshold, so the same encounter doesn't
/// pass on one platform and fail on another due to floating-point
/// drift in the overlap arithmetic (spec §4.2 "Input normalization").
const EPS_OVERLAP_THRESHOLD_S: f64 = 0.01;

/// Nominal conflict-zone length most flow pairs share. Conflict-zone
/// spans within `EPS_CZ_LENGTH_KM` of it are snapped to exactly 100m for
/// the same cross-platform-drift reason (spec §4.2 "Input normalization").
const NOMINAL_CZ_LENGTH_KM: f64 = 0.1;
const EPS_CZ_LENGTH_KM: f64 = 0.001;

struct Crossing {
    runner_id: String,
    entry: Seconds,
    exit: Seconds,
}

/// Run the flow engine for one day (spec §4.2 public contract). Flow
/// pairs whose events aren't both active this day are silently skipped —
/// they belong to a different day and are processed there instead.
pub fn flow_day(
    day_plan: &DayPlan,
    course: &Course,
    participants: &ParticipantSet,
    params: &FlowParams,
) -> CourseflowResult<(Vec<FlowSummary>, Vec<OverlapAudit>)> {
    let mut summaries = Vec::new();
    let mut audits = Vec::new();

    for pair in course.flow_pairs() {
        if pair.flow_type == FlowType::None {
            continue;
        }
        if !day_plan.events.contains(&pair.event_a) || !day_plan.events.contains(&pair.event_b) {
            continue;
        }
        let event_a = participants.event(&pair.event_a).ok_or_else(|| {
            CourseflowError::Config(format!("flow pair references unknown event '{}'", pair.event_a))
        })?;
        let event_b = participants.event(&pair.event_b).ok_or_else(|| {
            CourseflowError::Config(format!("flow pair references unknown event '{}'", pair.event_b))
        })?;
        if event_a.day != day_plan.day || event_b.day != day_plan.day {
            // Guarded upstream by the day partitioner; defensive no-op here.
            continue;
        }

        validate_counterflow_labeling(pair);

        let (cz_lo_a, cz_hi_a) = snap_cz_length(normalize(pair.from_km_a, pair.to_km_a));
        let (cz_lo_b, cz_hi_b) = snap_cz_length(normalize(pair.from_km_b, pair.to_km_b));

        let mut crosses_a: Vec<Crossing> = participants
            .participants_for(&pair.event_a)
            .iter()
            .map(|p| Crossing {
                runner_id: p.runner_id.clone(),
                entry: p.absolute_time_at(event_a, cz_lo_a),
                exit: p.absolute_time_at(event_a, cz_hi_a),
            })
            .collect();
        let mut crosses_b: Vec<Crossing> = participants
            .participants_for(&pair.event_b)
            .iter()
            .map(|p| Crossing {
                runner_id: p.runner_id.clone(),
                entry: p.absolute_time_at(event_b, cz_lo_b),
                exit: p.absolute_time_at(event_b, cz_hi_b),
            })
            .collect();

        // Sort B by conflict-zone entry time; A is scanned in load order.
        crosses_b.sort_by(|x, y| x.entry.value().partial_cmp(&y.entry.value()).unwrap());
        crosses_a.sort_by(|x, y| x.runner_id.cmp(&y.runner_id));
        let entries_b: Vec<f64> = crosses_b.iter().map(|c| c.entry.value()).collect();

        let mut pair_audits = Vec::new();
        for ca in &crosses_a {
            // Every b with entry before a's exit is a candidate; b's sorted
            // by entry, so this is a single partition point.
            let idx = entries_b.partition_point(|&e| e < ca.exit.value());
            for cb in &crosses_b[..idx] {
                if cb.exit.value() <= ca.entry.value() {
                    continue;
                }
                let overlap_start = ca.entry.value().max(cb.entry.value());
                let overlap_end = ca.exit.value().min(cb.exit.value());
                let mut dwell = overlap_end - overlap_start;
                if dwell.abs() < EPS_DWELL_S {
                    dwell = 0.0;
                }
                if (dwell - params.min_overlap_dwell_s).abs() < EPS_OVERLAP_THRESHOLD_S {
                    dwell = params.min_overlap_dwell_s;
                }
                if dwell <= 0.0 || dwell < params.min_overlap_dwell_s {
                    continue;
                }

                // A - B convention, matching `RelOrder::from_delta`: a
                // negative delta means A's time is earlier, i.e. A first.
                let entry_delta = ca.entry.value() - cb.entry.value();
                let exit_delta = ca.exit.value() - cb.exit.value();
                let rel_order_entry = RelOrder::from_delta(Seconds(entry_delta));
                let rel_order_exit = RelOrder::from_delta(Seconds(exit_delta));
                let order_flip = matches!(
                    (rel_order_entry, rel_order_exit),
                    (RelOrder::AFirst, RelOrder::BFirst) | (RelOrder::BFirst, RelOrder::AFirst)
                );
                // Negative = A gained ground (moved from behind to ahead).
                let directional_gain = exit_delta - entry_delta;
                let pass_flag_raw = order_flip;
                let pass_flag_strict = order_flip && directional_gain.abs() >= params.strict_gain_s;

                pair_audits.push(OverlapAudit {
                    seg_id: pair.seg_id.clone(),
                    event_a: pair.event_a.clone(),
                    event_b: pair.event_b.clone(),
                    runner_id_a: ca.runner_id.clone(),
                    runner_id_b: cb.runner_id.clone(),
                    entry_km_a: cz_lo_a,
                    exit_km_a: cz_hi_a,
                    entry_time_a: ca.entry,
                    exit_time_a: ca.exit,
                    entry_km_b: cz_lo_b,
                    exit_km_b: cz_hi_b,
                    entry_time_b: cb.entry,
                    exit_time_b: cb.exit,
                    overlap_dwell_s: Seconds(dwell),
                    entry_delta_s: Seconds(entry_delta),
                    exit_delta_s: Seconds(exit_delta),
                    rel_order_entry,
                    rel_order_exit,
                    order_flip,
                    directional_gain_s: Seconds(directional_gain),
                    pass_flag_raw,
                    pass_flag_strict,
                    in_conflict_zone: true,
                    flow_type: pair.flow_type,
                });
            }
        }

        let (overtaking_a, overtaking_b) = publish_overtake_counts(&pair_audits);
        let copresence_count = pair_audits.len() as u32;
        let has_convergence = copresence_count > 0;

        summaries.push(FlowSummary {
            seg_id: pair.seg_id.clone(),
            event_a: pair.event_a.clone(),
            event_b: pair.event_b.clone(),
            has_convergence,
            overtaking_a,
            overtaking_b,
            copresence_count,
            cz_start_a: cz_lo_a,
            cz_end_a: cz_hi_a,
            cz_start_b: cz_lo_b,
            cz_end_b: cz_hi_b,
        });
        audits.extend(pair_audits);
    }

    audits.sort_by(|a, b| {
        (a.seg_id.as_str(), a.runner_id_a.as_str(), a.runner_id_b.as_str()).cmp(&(
            b.seg_id.as_str(),
            b.runner_id_a.as_str(),
            b.runner_id_b.as_str(),
        ))
    });
    summaries.sort_by(|a, b| {
        (a.seg_id.as_str(), a.event_a.as_str(), a.event_b.as_str()).cmp(&(
            b.seg_id.as_str(),
            b.event_a.as_str(),
            b.event_b.as_str(),
        ))
    });

    Ok((summaries, audits))
}

/// "A overtook B" rows are ones where A entered the zone behind B but
/// left ahead; the reverse identifies "B overtook A" rows. Strict-first
/// gate (spec §4.2 step 5): publish the raw unique-runner count only if
/// at least one strict-qualifying overtake backs it, else publish zero.
fn publish_overtake_counts(audits: &[OverlapAudit]) -> (u32, u32) {
    let mut raw_a = HashSet::new();
    let mut strict_a = HashSet::new();
    let mut raw_b = HashSet::new();
    let mut strict_b = HashSet::new();

    for row in audits {
        if row.rel_order_entry == RelOrder::BFirst && row.rel_order_exit == RelOrder::AFirst {
            if row.pass_flag_raw {
                raw_a.insert(row.runner_id_a.as_str());
            }
            if row.pass_flag_strict {
                strict_a.insert(row.runner_id_a.as_str());
            }
        } else if row.rel_order_entry == RelOrder::AFirst && row.rel_order_exit == RelOrder::BFirst
        {
            if row.pass_flag_raw {
                raw_b.insert(row.runner_id_b.as_str());
            }
            if row.pass_flag_strict {
                strict_b.insert(row.runner_id_b.as_str());
            }
        }
    }

    let overtaking_a = if strict_a.is_empty() { 0 } else { raw_a.len() as u32 };
    let overtaking_b = if strict_b.is_empty() { 0 } else { raw_b.len() as u32 };
    (overtaking_a, overtaking_b)
}

fn normalize(from: Kilometers, to: Kilometers) -> (Kilometers, Kilometers) {
    if from.value() <= to.value() {
        (from, to)
    } else {
        (to, from)
    }
}

/// Snap `(lo, hi)` to exactly the nominal 100m conflict-zone length when
/// its actual length is within `EPS_CZ_LENGTH_KM` of it.
fn snap_cz_length((lo, hi): (Kilometers, Kilometers)) -> (Kilometers, Kilometers) {
    let length = hi.value() - lo.value();
    if (length - NOMINAL_CZ_LENGTH_KM).abs() < EPS_CZ_LENGTH_KM {
        (lo, Kilometers(lo.value() + NOMINAL_CZ_LENGTH_KM))
    } else {
        (lo, hi)
    }
}

/// Advisory-only consistency check: a `Counterflow` pair should have
/// event A and event B traversing the shared zone in opposite directions.
/// The engine still processes the pair if this doesn't hold — the spec
/// only asks it to validate consistency, not enforce it (spec §4.2).
fn validate_counterflow_labeling(pair: &FlowPair) {
    if pair.flow_type != FlowType::Counterflow {
        return;
    }
    let a_forward = pair.to_km_a.value() >= pair.from_km_a.value();
    let b_forward = pair.to_km_b.value() >= pair.from_km_b.value();
    if a_forward == b_forward {
        warn!(
            seg_id = %pair.seg_id,
            event_a = %pair.event_a,
            event_b = %pair.event_b,
            "flow pair declared as counterflow but from/to_km labeling does not show opposing directions"
        );
    }
}
