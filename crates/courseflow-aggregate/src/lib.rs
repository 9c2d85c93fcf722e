//! # courseflow-aggregate: canonical segment rollup and reconciliation
//!
//! The Canonical Aggregator (spec §4.3) is the single source of truth
//! for segment-level density: every report and map layer reads
//! `SegmentWindow`, never the raw bins, directly. The Reconciler (spec
//! §4.3, §6.3, §8) is the independent check that keeps that trust
//! warranted — it recomputes peak density a second way and fails the
//! day if the two disagree by more than 2%.

pub mod aggregator;
pub mod reconciler;

pub use aggregator::aggregate_day;
pub use reconciler::{reconcile_day, reconcile_or_fail, ReconcileReport, RECONCILE_REL_ERR_THRESHOLD};
