//! Manifest schema for per-day artifact directories (spec §4.5, §6.2).
//!
//! Each day's output directory carries a `metadata.json` that records
//! validation status, element counts, the reconciliation max relative
//! error, and a SHA256 checksum per emitted file — the race-analytics
//! equivalent of the Arrow directory format's versioned manifest, minus
//! the schema-compatibility machinery a single-producer pipeline doesn't
//! need.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Run-level or day-level validation outcome (spec §4.3, §6.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    Pass,
    Fail,
}

/// Checksum and row-count metadata for one emitted artifact file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfo {
    pub sha256: String,
    pub row_count: u64,
    pub file_size_bytes: u64,
}

/// Per-day metadata written to `{day}/metadata.json` (spec §4.5, §6.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayMetadata {
    pub day: String,
    pub status: RunStatus,
    pub created_at: DateTime<Utc>,
    pub validator_version: String,
    pub segment_count: usize,
    pub event_count: usize,
    pub runner_count: usize,
    pub runners_skipped: usize,
    pub bin_count: usize,
    pub audit_row_count: usize,
    pub flow_pair_count: usize,
    /// Maximum relative error observed during reconciliation (spec §4.3).
    /// `0.0` when no discrepancy was found.
    pub max_reconcile_rel_err: f64,
    pub files: HashMap<String, FileInfo>,
}

impl DayMetadata {
    pub fn new(day: impl Into<String>, validator_version: impl Into<String>) -> Self {
        Self {
            day: day.into(),
            status: RunStatus::Pass,
            created_at: Utc::now(),
            validator_version: validator_version.into(),
            segment_count: 0,
            event_count: 0,
            runner_count: 0,
            runners_skipped: 0,
            bin_count: 0,
            audit_row_count: 0,
            flow_pair_count: 0,
            max_reconcile_rel_err: 0.0,
            files: HashMap::new(),
        }
    }

    pub fn add_file(&mut self, name: impl Into<String>, info: FileInfo) {
        self.files.insert(name.into(), info);
    }

    pub fn mark_failed(&mut self) {
        self.status = RunStatus::Fail;
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .expect("DayMetadata serialization is infallible for well-formed fields");
        fs::write(path, json)
    }
}

/// Top-level manifest for a full multi-day run, collecting each day's
/// status so the orchestrator can report "other days continue" (spec
/// §4.4) without re-reading every per-day `metadata.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub created_at: DateTime<Utc>,
    pub validator_version: String,
    pub days: HashMap<String, RunStatus>,
}

impl RunMetadata {
    pub fn new(validator_version: impl Into<String>) -> Self {
        Self {
            created_at: Utc::now(),
            validator_version: validator_version.into(),
            days: HashMap::new(),
        }
    }

    pub fn record_day(&mut self, day: impl Into<String>, status: RunStatus) {
        self.days.insert(day.into(), status);
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .expect("RunMetadata serialization is infallible for well-formed fields");
        fs::write(path, json)
    }
}

/// Compute the SHA256 hash of a file, used to populate `FileInfo::sha256`
/// for every emitted artifact.
pub fn compute_sha256(path: &Path) -> std::io::Result<String> {
    use sha2::{Digest, Sha256};
    use std::io::Read;

    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_metadata_defaults_to_pass() {
        let meta = DayMetadata::new("sun", "0.1.0");
        assert_eq!(meta.status, RunStatus::Pass);
        assert_eq!(meta.max_reconcile_rel_err, 0.0);
    }

    #[test]
    fn day_metadata_mark_failed() {
        let mut meta = DayMetadata::new("sun", "0.1.0");
        meta.mark_failed();
        assert_eq!(meta.status, RunStatus::Fail);
    }

    #[test]
    fn day_metadata_serialization_round_trips() {
        let mut meta = DayMetadata::new("sun", "0.1.0");
        meta.add_file(
            "bins.parquet",
            FileInfo {
                sha256: "abc123".to_string(),
                row_count: 10,
                file_size_bytes: 1024,
            },
        );

        let json = serde_json::to_string(&meta).unwrap();
        let restored: DayMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.day, "sun");
        assert_eq!(restored.files.len(), 1);
    }

    #[test]
    fn run_metadata_tracks_per_day_status() {
        let mut run = RunMetadata::new("0.1.0");
        run.record_day("sat", RunStatus::Pass);
        run.record_day("sun", RunStatus::Fail);
        assert_eq!(run.days.get("sat"), Some(&RunStatus::Pass));
        assert_eq!(run.days.get("sun"), Some(&RunStatus::Fail));
    }

    #[test]
    fn sha256_is_stable_for_same_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.txt");
        fs::write(&path, b"hello").unwrap();
        let h1 = compute_sha256(&path).unwrap();
        let h2 = compute_sha256(&path).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
    }
}
