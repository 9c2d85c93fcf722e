//! Binning engine configuration (spec §4.1 `BinParams`, §6.1).

use courseflow_core::{Kilometers, Seconds};

use crate::rulebook::LosRulebook;

/// Minimum `Δx`/`Δt` honored by coarsening, and the coarsening ceiling
/// (spec §6.1: `bin_dx_km` default 0.1, min 0.05; `bin_dt_s` default 30).
pub const DEFAULT_DX_KM: f64 = 0.1;
pub const DEFAULT_DT_S: f64 = 30.0;
pub const MIN_DX_KM: f64 = 0.05;

/// Coarsening ceiling: spec §4.1 step 7 allows `Δt → 2Δt → 4Δt` (two
/// doublings) before falling back to spatial coarsening (`Δx → 2Δx`,
/// one doubling). Four temporal steps plus one spatial step is the
/// maximal ladder; exceeding it is a `BudgetError`.
pub const MAX_TEMPORAL_COARSEN_STEPS: u32 = 2;
pub const MAX_SPATIAL_COARSEN_STEPS: u32 = 1;

/// Inputs to `bin_day` (spec §4.1 public contract).
#[derive(Debug, Clone)]
pub struct BinParams {
    pub dx: Kilometers,
    pub dt: Seconds,
    pub max_bins: usize,
    pub soft_timeout_ms: u64,
    pub rulebook: LosRulebook,
}

impl Default for BinParams {
    fn default() -> Self {
        Self {
            dx: Kilometers(DEFAULT_DX_KM),
            dt: Seconds(DEFAULT_DT_S),
            max_bins: 10_000,
            soft_timeout_ms: 30_000,
            rulebook: LosRulebook::default(),
        }
    }
}

/// Coarsening outcome attached to a `bin_day` run, so callers (and
/// `metadata.json`, spec §4.5) can observe whether/how much the grid was
/// coarsened from the requested `Δx`/`Δt`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoarseningMeta {
    pub temporal_steps: u32,
    pub spatial_steps: u32,
    pub final_dx: Kilometers,
    pub final_dt: Seconds,
    pub triggered_by_timeout: bool,
}

impl CoarseningMeta {
    pub fn none(dx: Kilometers, dt: Seconds) -> Self {
        Self {
            temporal_steps: 0,
            spatial_steps: 0,
            final_dx: dx,
            final_dt: dt,
            triggered_by_timeout: false,
        }
    }

    pub fn was_coarsened(&self) -> bool {
        self.temporal_steps > 0 || self.spatial_steps > 0
    }
}
