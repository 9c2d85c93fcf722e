//! Schema version and analysis hash stamped onto every emitted row
//! (spec §6.2, `bins.parquet` columns `schema_version`, `analysis_hash`).

/// Current output schema version. Bumped whenever a column is added,
/// removed, or reinterpreted in `bins.parquet`/`segment_windows_from_bins.parquet`.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// A short, stable hash identifying the analysis configuration that
/// produced a run (bin widths, thresholds, rulebook). Computed from the
/// request's serialized form by the caller; this module only defines the
/// column contract, not the hashing itself, since only `courseflow-pipeline`
/// has the full `AnalysisRequest` in scope.
pub fn stamp_analysis_hash(request_json: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(request_json.as_bytes());
    format!("{:x}", hasher.finalize())[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_hash_is_deterministic() {
        let a = stamp_analysis_hash(r#"{"bin_dx_km":0.1}"#);
        let b = stamp_analysis_hash(r#"{"bin_dx_km":0.1}"#);
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn analysis_hash_differs_for_different_config() {
        let a = stamp_analysis_hash(r#"{"bin_dx_km":0.1}"#);
        let b = stamp_analysis_hash(r#"{"bin_dx_km":0.2}"#);
        assert_ne!(a, b);
    }
}
