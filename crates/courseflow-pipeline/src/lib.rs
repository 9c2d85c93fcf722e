//! # courseflow-pipeline: day partitioning and run orchestration
//!
//! Wires the binning, flow, and aggregate engines together: partitions
//! a run's events into independent days (spec §4, Day Partitioner), then
//! runs each day's load → bin → flow → aggregate → reconcile → emit
//! pass as its own unit of work, continuing past a single day's failure
//! (spec §4.4).

pub mod day_partitioner;
pub mod orchestrator;

pub use day_partitioner::build_day_plans;
pub use orchestrator::{run_pipeline, DaySummary, RunSummary, VALIDATOR_VERSION};
