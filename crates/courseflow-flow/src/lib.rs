//! # courseflow-flow: Flow Analysis Engine
//!
//! Detects and scores runner-to-runner encounters declared by `FlowPair`s
//! on a course — overtakes, merges, counterflow crossings — and rolls
//! them up into per-pair [`courseflow_core::FlowSummary`] rows backed by
//! the full [`courseflow_core::OverlapAudit`] detail.

pub mod engine;
pub mod params;

pub use engine::flow_day;
pub use params::FlowParams;
