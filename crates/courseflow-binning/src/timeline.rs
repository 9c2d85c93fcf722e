//! Global Timeline Builder (spec §2, §4.1 step 1).
//!
//! Builds the single uniform time grid a day's binning engine and flow
//! engine both read from: anchored at `t0 = min(event.start_time)` for
//! the day, with windows of width `Δt` indexed by integer `k`.

use courseflow_core::{DayPlan, Event, Minutes, Seconds, TimeWindow};

/// A day's uniform global time grid (spec §3 `TimeWindow`, §4.1 step 1).
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalTimeline {
    pub t0: Minutes,
    pub dt: Seconds,
    pub k_count: i64,
}

impl GlobalTimeline {
    /// Build the grid for a day: anchor at `day_plan.anchor_t0`, extend
    /// to cover `horizon_end` (spec §4.1 step 1: `horizon_end = max over
    /// runners of (event.start + offset + segment_exit_time)`).
    pub fn build(day_plan: &DayPlan, dt: Seconds, horizon_end: Seconds) -> Self {
        let t0_s = day_plan.anchor_t0.to_seconds();
        let span = (horizon_end - t0_s).value().max(0.0);
        let k_count = (span / dt.value()).ceil() as i64 + 1;
        Self {
            t0: day_plan.anchor_t0,
            dt,
            k_count: k_count.max(1),
        }
    }

    /// `k_0(e)`: first window index an event's runners may appear in
    /// (spec §4.1 step 2). Never negative — an event cannot start
    /// before the day anchor, by construction of `t0`.
    pub fn k0_for_event(&self, event: &Event) -> i64 {
        let delta = event.start_time_min.to_seconds() - self.t0.to_seconds();
        (delta.value() / self.dt.value()).floor() as i64
    }

    /// The half-open `[t_start, t_end)` window for index `k`.
    pub fn window(&self, k: i64) -> TimeWindow {
        let t0_s = self.t0.to_seconds();
        TimeWindow {
            k,
            t_start: t0_s + self.dt * (k as f64),
            t_end: t0_s + self.dt * ((k + 1) as f64),
        }
    }

    /// The window index containing absolute time `t`, or `None` if `t`
    /// precedes the day anchor.
    pub fn index_for_time(&self, t: Seconds) -> Option<i64> {
        let delta = (t - self.t0.to_seconds()).value();
        if delta < 0.0 {
            None
        } else {
            Some((delta / self.dt.value()).floor() as i64)
        }
    }

    /// Coarsen the timeline: double `Δt` and recompute `k_count` from
    /// the same `t0`/horizon span. The caller is responsible for
    /// re-running runner-to-window mapping against the new grid (spec
    /// §9 "In-place coarsening" — bins are never naively re-summed).
    pub fn coarsened(&self, horizon_end: Seconds) -> Self {
        let new_dt = self.dt * 2.0;
        let t0_s = self.t0.to_seconds();
        let span = (horizon_end - t0_s).value().max(0.0);
        let k_count = (span / new_dt.value()).ceil() as i64 + 1;
        Self {
            t0: self.t0,
            dt: new_dt,
            k_count: k_count.max(1),
        }
    }
}
