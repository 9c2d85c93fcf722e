//! The Spatio-Temporal Binning Engine (spec §4.1).
//!
//! `bin_day` grids every runner active on a given day into
//! `(segment, distance bin, time window)` cells and classifies each
//! cell's crowd density. The engine is a pure function of `DayPlan` +
//! `Course` + `ParticipantSet` + `BinParams`: no wall-clock-dependent
//! randomness feeds the bin values themselves, only the *coarsening
//! level chosen* may vary with `SoftTimeoutMs` wall-clock pressure
//! (spec §5 "Timeouts").

use std::time::Instant;

use courseflow_core::{
    Bin, BinSeverity, Course, CourseflowError, CourseflowResult, DayPlan, Kilometers,
    LoadDiagnostics, ParticipantSet, PerSquareMeter, RatePerMeterPerMin, Seconds, Segment,
};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::params::{
    BinParams, CoarseningMeta, MAX_SPATIAL_COARSEN_STEPS, MAX_TEMPORAL_COARSEN_STEPS,
};
use crate::timeline::GlobalTimeline;

/// Run the binning engine for one day (spec §4.1 public contract).
///
/// Fails with `DataError` if a required span is missing for a used
/// event (should not occur for a well-formed `Course`, which only
/// records spans it actually parsed); with `BudgetError` if coarsening
/// cannot bring the output below `max_bins`.
pub fn bin_day(
    day_plan: &DayPlan,
    course: &Course,
    participants: &ParticipantSet,
    params: &BinParams,
    diagnostics: &mut LoadDiagnostics,
) -> CourseflowResult<(Vec<Bin>, CoarseningMeta)> {
    let segments: Vec<&Segment> = day_plan
        .segment_ids
        .iter()
        .filter_map(|id| course.segment(id))
        .collect();

    let horizon_end = compute_horizon_end(&segments, day_plan, participants)?;

    let mut dx = params.dx;
    let mut dt = params.dt;
    let mut temporal_steps = 0u32;
    let mut spatial_steps = 0u32;
    let mut timeout_triggered = false;

    // Budget coarsening loop: temporal-first, then spatial (spec §4.1 step 7).
    let timeline = loop {
        let timeline = GlobalTimeline::build(day_plan, dt, horizon_end);
        let estimate = estimate_bin_count(&segments, day_plan, dx, timeline.k_count);
        if estimate <= params.max_bins {
            break timeline;
        }
        if temporal_steps < MAX_TEMPORAL_COARSEN_STEPS {
            dt = dt * 2.0;
            temporal_steps += 1;
            debug!(day = %day_plan.day, new_dt = dt.value(), "coarsening temporally for bin budget");
            continue;
        }
        if spatial_steps < MAX_SPATIAL_COARSEN_STEPS {
            dx = dx * 2.0;
            spatial_steps += 1;
            debug!(day = %day_plan.day, new_dx = dx.value(), "coarsening spatially for bin budget");
            continue;
        }
        return Err(CourseflowError::Budget(format!(
            "day '{}': cannot satisfy max_bins={} even after maximal coarsening (estimate={})",
            day_plan.day, params.max_bins, estimate
        )));
    };

    let started = Instant::now();
    let mut bins = compute_bins(&segments, day_plan, participants, &timeline, dx, params, diagnostics)?;

    if started.elapsed().as_millis() as u64 > params.soft_timeout_ms
        && temporal_steps < MAX_TEMPORAL_COARSEN_STEPS
    {
        warn!(
            day = %day_plan.day,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "soft timeout exceeded, coarsening temporally and recomputing"
        );
        timeout_triggered = true;
        let dt2 = dt * 2.0;
        let timeline2 = GlobalTimeline::build(day_plan, dt2, horizon_end);
        bins = compute_bins(&segments, day_plan, participants, &timeline2, dx, params, diagnostics)?;
        temporal_steps += 1;
        dt = dt2;
    }

    bins.sort_by(|a, b| (a.seg_id.as_str(), a.j, a.k).cmp(&(b.seg_id.as_str(), b.j, b.k)));

    let meta = CoarseningMeta {
        temporal_steps,
        spatial_steps,
        final_dx: dx,
        final_dt: dt,
        triggered_by_timeout: timeout_triggered,
    };
    Ok((bins, meta))
}

/// `horizon_end = max over runners of (event.start + offset + segment
/// exit time)` (spec §4.1 step 1), computed over every event/segment
/// pair active this day.
fn compute_horizon_end(
    segments: &[&Segment],
    day_plan: &DayPlan,
    participants: &ParticipantSet,
) -> CourseflowResult<Seconds> {
    let mut max_t = Seconds(0.0);
    for event_name in &day_plan.events {
        let event = participants.event(event_name).ok_or_else(|| {
            CourseflowError::Config(format!("day '{}': unknown event '{}'", day_plan.day, event_name))
        })?;
        let max_to_km = segments
            .iter()
            .filter_map(|s| s.span_for(event_name))
            .map(|span| span.to_km)
            .fold(None::<Kilometers>, |acc, km| {
                Some(acc.map_or(km, |a| a.max(km)))
            });
        let Some(max_to_km) = max_to_km else { continue };
        for p in participants.participants_for(event_name) {
            let t = p.absolute_time_at(event, max_to_km);
            if t.value() > max_t.value() {
                max_t = t;
            }
        }
    }
    Ok(max_t)
}

fn bins_for_segment(segment: &Segment, day_plan: &DayPlan, dx: Kilometers) -> (i64, bool) {
    let max_length = day_plan
        .events
        .iter()
        .filter_map(|e| segment.span_for(e))
        .map(|span| span.length())
        .fold(None::<Kilometers>, |acc, l| Some(acc.map_or(l, |a| a.max(l))))
        .unwrap_or(Kilometers(0.0));

    if max_length.value() <= 0.0 {
        return (0, false);
    }
    if max_length.value() < dx.value() {
        (1, true)
    } else {
        let count = (max_length.value() / dx.value()).ceil() as i64;
        (count.max(1), false)
    }
}

fn estimate_bin_count(segments: &[&Segment], day_plan: &DayPlan, dx: Kilometers, k_count: i64) -> usize {
    segments
        .iter()
        .map(|s| {
            let (j_count, _short) = bins_for_segment(s, day_plan, dx);
            j_count as usize * k_count as usize
        })
        .sum()
}

#[allow(clippy::too_many_arguments)]
fn compute_bins(
    segments: &[&Segment],
    day_plan: &DayPlan,
    participants: &ParticipantSet,
    timeline: &GlobalTimeline,
    dx: Kilometers,
    params: &BinParams,
    diagnostics: &mut LoadDiagnostics,
) -> CourseflowResult<Vec<Bin>> {
    // Segments are independent: each owns its own distance-bin grid and
    // accumulator, so the per-segment pass runs across the rayon pool.
    // Diagnostics are folded back in `day_plan.segment_ids` order
    // afterwards, so output and skip ordering stay deterministic
    // regardless of worker count (spec §6.3 determinism property).
    let per_segment: Vec<(String, Option<Vec<Bin>>)> = segments
        .par_iter()
        .map(|&segment| {
            let (j_count, short_segment) = bins_for_segment(segment, day_plan, dx);
            if j_count == 0 {
                return (segment.seg_id.clone(), None);
            }
            let bins = bin_segment(
                segment,
                day_plan,
                participants,
                timeline,
                dx,
                params,
                j_count,
                short_segment,
            );
            (segment.seg_id.clone(), Some(bins))
        })
        .collect();

    let mut all_bins = Vec::new();
    for (seg_id, bins) in per_segment {
        match bins {
            Some(mut bins) => all_bins.append(&mut bins),
            None => diagnostics.skip_segment("width_missing", &format!("seg_id={}", seg_id)),
        }
    }
    Ok(all_bins)
}

#[allow(clippy::too_many_arguments)]
fn bin_segment(
    segment: &Segment,
    day_plan: &DayPlan,
    participants: &ParticipantSet,
    timeline: &GlobalTimeline,
    dx: Kilometers,
    params: &BinParams,
    j_count: i64,
    short_segment: bool,
) -> Vec<Bin> {
    let mut all_bins = Vec::new();
    {
        let max_length = day_plan
            .events
            .iter()
            .filter_map(|e| segment.span_for(e))
            .map(|span| span.length())
            .fold(None::<Kilometers>, |acc, l| Some(acc.map_or(l, |a| a.max(l))))
            .unwrap_or(Kilometers(0.0));

        // accum[j][k] = concurrent_count
        let mut accum = vec![vec![0u32; timeline.k_count as usize]; j_count as usize];

        for event_name in &day_plan.events {
            let Some(span) = segment.span_for(event_name) else { continue };
            let Some(event) = participants.event(event_name) else { continue };
            let event_len = span.length();
            let k0 = timeline.k0_for_event(event);

            for j in 0..j_count {
                let bin_local_start = (j as f64) * dx;
                if bin_local_start.value() >= event_len.value() {
                    continue; // this event's own span doesn't reach that far
                }
                let bin_local_end = ((j + 1) as f64 * dx).min(event_len);

                let entry_km = span.from_km + bin_local_start;
                let exit_km = span.from_km + bin_local_end;

                for p in participants.participants_for(event_name) {
                    let entry_t = p.absolute_time_at(event, entry_km);
                    let exit_t = p.absolute_time_at(event, exit_km);
                    if exit_t.value() <= entry_t.value() {
                        continue;
                    }
                    let Some(k_start_raw) = timeline.index_for_time(entry_t) else { continue };
                    let k_start = k_start_raw.max(k0).max(0);
                    let Some(k_end) = timeline.index_for_time(Seconds(exit_t.value() - 1e-9)) else {
                        continue;
                    };
                    let k_end = k_end.min(timeline.k_count - 1);
                    if k_end < k_start {
                        continue;
                    }
                    for k in k_start..=k_end {
                        accum[j as usize][k as usize] += 1;
                    }
                }
            }
        }

        let width_eff_m = segment.width_effective().value();
        let capacity = params.rulebook.capacity_for(segment.schema_class);

        for j in 0..j_count {
            let bin_local_start = (j as f64) * dx;
            let bin_local_end = ((j + 1) as f64 * dx).min(max_length);
            let bin_len_m = (bin_local_end - bin_local_start).to_meters().value();
            for k in 0..timeline.k_count {
                let n = accum[j as usize][k as usize];
                let window = timeline.window(k);
                let areal = PerSquareMeter(n as f64 / (bin_len_m * width_eff_m));
                let linear_rate = RatePerMeterPerMin(
                    (n as f64 / timeline.dt.to_minutes().value()) / width_eff_m,
                );
                let flow_utilization = linear_rate.value() / capacity.value();
                let los = params.rulebook.classify(&segment.seg_id, areal);
                let severity = if los >= courseflow_core::LosClass::E {
                    BinSeverity::Critical
                } else if los >= courseflow_core::LosClass::C || flow_utilization > 1.0 {
                    BinSeverity::Watch
                } else {
                    BinSeverity::None
                };
                let flag_reason = if short_segment {
                    Some("short_segment".to_string())
                } else {
                    None
                };

                all_bins.push(Bin {
                    seg_id: segment.seg_id.clone(),
                    j,
                    k,
                    km_start: bin_local_start,
                    km_end: bin_local_end,
                    t_start: window.t_start,
                    t_end: window.t_end,
                    concurrent_count: n,
                    areal_density_p_per_m2: areal,
                    linear_rate_per_m_per_min: linear_rate,
                    flow_utilization,
                    los_class: los,
                    severity,
                    flag_reason,
                });
            }
        }
    }

    all_bins
}
