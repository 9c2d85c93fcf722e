//! # courseflow-io: static-file ingestion and artifact emission
//!
//! Loaders for the three CSV input contracts (`segments.csv`, `flow.csv`,
//! `{event}_runners.csv`, spec §6.1), the `AnalysisRequest` configuration
//! object (§6.1), and the per-day artifact writers that turn engine
//! output into the Parquet/CSV/GeoJSON files and manifest spec §4.5/§6.2
//! describe.

pub mod course_loader;
pub mod exporters;
pub mod helpers;
pub mod manifest;
pub mod participant_loader;
pub mod request;

pub use course_loader::{load_course, load_flow_pairs, load_segments};
pub use exporters::DayArtifactWriter;
pub use manifest::{compute_sha256, DayMetadata, FileInfo, RunMetadata, RunStatus};
pub use participant_loader::load_participants;
pub use request::{AnalysisRequest, EventRequest, LosRulebookOverride};
