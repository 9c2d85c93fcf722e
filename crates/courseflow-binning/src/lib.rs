//! # courseflow-binning: Spatio-Temporal Binning Engine
//!
//! Grids a day's runners into `(segment, distance bin, time window)`
//! cells and classifies crowd density per cell.
//!
//! - [`engine::bin_day`] runs the binning algorithm for one day,
//!   coarsening `Δx`/`Δt` under a bin-count or soft-timeout budget.
//! - [`timeline::GlobalTimeline`] builds the day's shared clock grid
//!   that both this crate and `courseflow-flow` read from.
//! - [`rulebook::LosRulebook`] holds the LOS thresholds and flow
//!   capacities used to classify each bin.
//! - [`params::BinParams`] is the engine's full configuration surface.

pub mod engine;
pub mod params;
pub mod rulebook;
pub mod timeline;

pub use engine::bin_day;
pub use params::{BinParams, CoarseningMeta};
pub use rulebook::{FlowCapacities, LosRulebook, LosThresholds};
pub use timeline::GlobalTimeline;
