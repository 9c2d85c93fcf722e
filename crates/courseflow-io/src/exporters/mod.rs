//! Per-day artifact writers: Parquet/CSV tables, gzip'd GeoJSON, and the
//! metadata manifest (spec §4.5, §6.2).

pub mod directory_writer;
pub mod geojson;
pub mod schema_version;

pub use directory_writer::DayArtifactWriter;
