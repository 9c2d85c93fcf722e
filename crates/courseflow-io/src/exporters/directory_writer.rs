//! Atomic per-day artifact directory writer (spec §4.5, §6.2).
//!
//! Mirrors the teacher workspace's `ArrowDirectoryWriter`: everything is
//! written into a temp directory first, and only `commit()` performs the
//! atomic rename into the final location. `purge()` discards a failed
//! day's partial writes without ever exposing them (spec §4.4: "partial
//! artifacts purged from the manifest, but other days continue").

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use courseflow_core::{Bin, CourseflowError, CourseflowResult, FlowSummary, OverlapAudit, Seconds, SegmentWindow};
use polars::prelude::*;

use super::geojson::build_bins_geojson_gz;
use super::schema_version::SCHEMA_VERSION;
use crate::manifest::{compute_sha256, DayMetadata, FileInfo};
use courseflow_core::Course;

/// Seconds-since-midnight (spec §3 `Seconds`) has no calendar date in the
/// input contract (`Event.day` is a tag like `"sun"`, not a date) so
/// `time_start`/`time_end` are emitted as UTC timestamps relative to the
/// Unix epoch rather than a wall-clock calendar date — downstream report
/// rendering re-anchors them to the real event date, which this crate
/// does not know (open question, spec §9; resolved in DESIGN.md).
fn seconds_to_utc(t: Seconds) -> DateTime<Utc> {
    let whole = t.value().floor() as i64;
    let nanos = ((t.value() - whole as f64) * 1e9).round() as u32;
    Utc.timestamp_opt(whole, nanos).single().unwrap_or(Utc.timestamp_opt(0, 0).single().unwrap())
}

/// Writes one day's artifacts (spec §4.5):
/// `bins/bins.parquet`, `bins/bins.geojson.gz`,
/// `bins/segment_windows_from_bins.parquet`, `reports/Flow.csv`,
/// `audit/audit_{day}.parquet`, `metadata.json`.
pub struct DayArtifactWriter {
    day: String,
    temp_dir: PathBuf,
    final_dir: PathBuf,
}

impl DayArtifactWriter {
    pub fn new(output_root: impl AsRef<Path>, day: &str) -> CourseflowResult<Self> {
        let final_dir = output_root.as_ref().join(day);
        let temp_dir = output_root.as_ref().join(format!(".{day}.tmp"));
        if temp_dir.exists() {
            fs::remove_dir_all(&temp_dir)?;
        }
        fs::create_dir_all(temp_dir.join("bins"))?;
        fs::create_dir_all(temp_dir.join("reports"))?;
        fs::create_dir_all(temp_dir.join("audit"))?;
        Ok(Self {
            day: day.to_string(),
            temp_dir,
            final_dir,
        })
    }

    fn write_table(&self, rel_path: &str, df: &mut DataFrame) -> CourseflowResult<FileInfo> {
        let path = self.temp_dir.join(rel_path);
        {
            let mut file = fs::File::create(&path)?;
            ParquetWriter::new(&mut file)
                .finish(df)
                .map_err(|e| CourseflowError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?;
        }
        let sha256 = compute_sha256(&path)?;
        let file_size_bytes = fs::metadata(&path)?.len();
        Ok(FileInfo {
            sha256,
            row_count: df.height() as u64,
            file_size_bytes,
        })
    }

    /// `bins/bins.parquet` (spec §6.2 schema).
    pub fn write_bins(
        &self,
        bins: &[Bin],
        analysis_hash: &str,
        manifest: &mut DayMetadata,
    ) -> CourseflowResult<()> {
        let seg_id: Vec<&str> = bins.iter().map(|b| b.seg_id.as_str()).collect();
        let km_start: Vec<f64> = bins.iter().map(|b| b.km_start.value()).collect();
        let km_end: Vec<f64> = bins.iter().map(|b| b.km_end.value()).collect();
        let time_start: Vec<i64> = bins
            .iter()
            .map(|b| seconds_to_utc(b.t_start).timestamp_millis())
            .collect();
        let time_end: Vec<i64> = bins
            .iter()
            .map(|b| seconds_to_utc(b.t_end).timestamp_millis())
            .collect();
        let concurrent: Vec<i32> = bins.iter().map(|b| b.concurrent_count as i32).collect();
        let density: Vec<f64> = bins.iter().map(|b| b.areal_density_p_per_m2.value()).collect();
        let rate: Vec<f64> = bins.iter().map(|b| b.linear_rate_per_m_per_min.value()).collect();
        let utilization: Vec<f64> = bins.iter().map(|b| b.flow_utilization).collect();
        let los: Vec<String> = bins.iter().map(|b| b.los_class.to_string()).collect();
        let severity: Vec<String> = bins.iter().map(|b| b.severity.to_string()).collect();
        let flag_reason: Vec<Option<String>> = bins.iter().map(|b| b.flag_reason.clone()).collect();
        let schema_version = vec![SCHEMA_VERSION; bins.len()];
        let analysis_hash_col = vec![analysis_hash; bins.len()];

        let mut df = DataFrame::new(vec![
            Series::new("seg_id", seg_id),
            Series::new("km_start", km_start),
            Series::new("km_end", km_end),
            Series::new("time_start", time_start)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, Some("UTC".into())))
                .map_err(polars_err)?,
            Series::new("time_end", time_end)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, Some("UTC".into())))
                .map_err(polars_err)?,
            Series::new("concurrent", concurrent),
            Series::new("density_p_m2", density),
            Series::new("rate_per_m_per_min", rate),
            Series::new("flow_utilization", utilization),
            Series::new("los", los),
            Series::new("severity", severity),
            Series::new("flag_reason", flag_reason),
            Series::new("schema_version", schema_version),
            Series::new("analysis_hash", analysis_hash_col),
        ])
        .map_err(polars_err)?;

        let info = self.write_table("bins/bins.parquet", &mut df)?;
        manifest.bin_count = bins.len();
        manifest.add_file("bins/bins.parquet", info);
        Ok(())
    }

    /// `bins/bins.geojson.gz` (spec §6.2): one Polygon feature per bin,
    /// gzip-compressed.
    pub fn write_bins_geojson(&self, course: &Course, bins: &[Bin], manifest: &mut DayMetadata) -> CourseflowResult<()> {
        let gz = build_bins_geojson_gz(course, bins)?;
        let path = self.temp_dir.join("bins/bins.geojson.gz");
        fs::write(&path, &gz)?;
        let sha256 = compute_sha256(&path)?;
        manifest.add_file(
            "bins/bins.geojson.gz",
            FileInfo {
                sha256,
                row_count: bins.len() as u64,
                file_size_bytes: gz.len() as u64,
            },
        );
        Ok(())
    }

    /// `bins/segment_windows_from_bins.parquet` (spec §6.2 schema). Only
    /// called when reconciliation passed (spec §4.3: "the artifact
    /// emitter refuses to publish segment metrics" on failure).
    pub fn write_segment_windows(
        &self,
        windows: &[SegmentWindow],
        manifest: &mut DayMetadata,
    ) -> CourseflowResult<()> {
        let seg_id: Vec<&str> = windows.iter().map(|w| w.seg_id.as_str()).collect();
        let t_start: Vec<i64> = windows
            .iter()
            .map(|w| seconds_to_utc(w.t_start).timestamp_millis())
            .collect();
        let t_end: Vec<i64> = windows
            .iter()
            .map(|w| seconds_to_utc(w.t_end).timestamp_millis())
            .collect();
        let density_mean: Vec<f64> = windows.iter().map(|w| w.density_mean.value()).collect();
        let density_peak: Vec<f64> = windows.iter().map(|w| w.density_peak.value()).collect();
        let n_bins: Vec<i32> = windows.iter().map(|w| w.n_bins as i32).collect();

        let mut df = DataFrame::new(vec![
            Series::new("seg_id", seg_id),
            Series::new("t_start", t_start)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, Some("UTC".into())))
                .map_err(polars_err)?,
            Series::new("t_end", t_end)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, Some("UTC".into())))
                .map_err(polars_err)?,
            Series::new("density_mean", density_mean),
            Series::new("density_peak", density_peak),
            Series::new("n_bins", n_bins),
        ])
        .map_err(polars_err)?;

        let info = self.write_table("bins/segment_windows_from_bins.parquet", &mut df)?;
        manifest.add_file("bins/segment_windows_from_bins.parquet", info);
        Ok(())
    }

    /// `audit/audit_{day}.parquet` (spec §3 `OverlapAudit`, §6.2).
    pub fn write_audit(&self, audits: &[OverlapAudit], manifest: &mut DayMetadata) -> CourseflowResult<()> {
        let seg_id: Vec<&str> = audits.iter().map(|a| a.seg_id.as_str()).collect();
        let event_a: Vec<&str> = audits.iter().map(|a| a.event_a.as_str()).collect();
        let event_b: Vec<&str> = audits.iter().map(|a| a.event_b.as_str()).collect();
        let runner_id_a: Vec<&str> = audits.iter().map(|a| a.runner_id_a.as_str()).collect();
        let runner_id_b: Vec<&str> = audits.iter().map(|a| a.runner_id_b.as_str()).collect();
        let entry_km_a: Vec<f64> = audits.iter().map(|a| a.entry_km_a.value()).collect();
        let exit_km_a: Vec<f64> = audits.iter().map(|a| a.exit_km_a.value()).collect();
        let entry_time_a: Vec<f64> = audits.iter().map(|a| a.entry_time_a.value()).collect();
        let exit_time_a: Vec<f64> = audits.iter().map(|a| a.exit_time_a.value()).collect();
        let entry_km_b: Vec<f64> = audits.iter().map(|a| a.entry_km_b.value()).collect();
        let exit_km_b: Vec<f64> = audits.iter().map(|a| a.exit_km_b.value()).collect();
        let entry_time_b: Vec<f64> = audits.iter().map(|a| a.entry_time_b.value()).collect();
        let exit_time_b: Vec<f64> = audits.iter().map(|a| a.exit_time_b.value()).collect();
        let overlap_dwell_s: Vec<f64> = audits.iter().map(|a| a.overlap_dwell_s.value()).collect();
        let entry_delta_s: Vec<f64> = audits.iter().map(|a| a.entry_delta_s.value()).collect();
        let exit_delta_s: Vec<f64> = audits.iter().map(|a| a.exit_delta_s.value()).collect();
        let rel_order_entry: Vec<String> = audits.iter().map(|a| format!("{:?}", a.rel_order_entry)).collect();
        let rel_order_exit: Vec<String> = audits.iter().map(|a| format!("{:?}", a.rel_order_exit)).collect();
        let order_flip: Vec<bool> = audits.iter().map(|a| a.order_flip).collect();
        let directional_gain_s: Vec<f64> = audits.iter().map(|a| a.directional_gain_s.value()).collect();
        let pass_flag_raw: Vec<bool> = audits.iter().map(|a| a.pass_flag_raw).collect();
        let pass_flag_strict: Vec<bool> = audits.iter().map(|a| a.pass_flag_strict).collect();
        let in_conflict_zone: Vec<bool> = audits.iter().map(|a| a.in_conflict_zone).collect();
        let flow_type: Vec<String> = audits.iter().map(|a| a.flow_type.to_string()).collect();

        let mut df = DataFrame::new(vec![
            Series::new("seg_id", seg_id),
            Series::new("event_a", event_a),
            Series::new("event_b", event_b),
            Series::new("runner_id_a", runner_id_a),
            Series::new("runner_id_b", runner_id_b),
            Series::new("entry_km_a", entry_km_a),
            Series::new("exit_km_a", exit_km_a),
            Series::new("entry_time_a", entry_time_a),
            Series::new("exit_time_a", exit_time_a),
            Series::new("entry_km_b", entry_km_b),
            Series::new("exit_km_b", exit_km_b),
            Series::new("entry_time_b", entry_time_b),
            Series::new("exit_time_b", exit_time_b),
            Series::new("overlap_dwell_s", overlap_dwell_s),
            Series::new("entry_delta_s", entry_delta_s),
            Series::new("exit_delta_s", exit_delta_s),
            Series::new("rel_order_entry", rel_order_entry),
            Series::new("rel_order_exit", rel_order_exit),
            Series::new("order_flip", order_flip),
            Series::new("directional_gain_s", directional_gain_s),
            Series::new("pass_flag_raw", pass_flag_raw),
            Series::new("pass_flag_strict", pass_flag_strict),
            Series::new("in_conflict_zone", in_conflict_zone),
            Series::new("flow_type", flow_type),
        ])
        .map_err(polars_err)?;

        let info = self.write_table(&format!("audit/audit_{}.parquet", self.day), &mut df)?;
        manifest.audit_row_count = audits.len();
        manifest.add_file(format!("audit/audit_{}.parquet", self.day), info);
        Ok(())
    }

    /// `reports/Flow.csv` (spec §6.2): one row per flow pair summary,
    /// stamped with `app_version`/`analysis_timestamp`/`environment`.
    pub fn write_flow_summaries(
        &self,
        summaries: &[FlowSummary],
        app_version: &str,
        analysis_timestamp: &DateTime<Utc>,
        environment: &str,
        manifest: &mut DayMetadata,
    ) -> CourseflowResult<()> {
        let path = self.temp_dir.join("reports/Flow.csv");
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record([
            "seg_id",
            "event_a",
            "event_b",
            "overtaking_a",
            "overtaking_b",
            "copresence_count",
            "has_convergence",
            "cz_start_a",
            "cz_end_a",
            "cz_start_b",
            "cz_end_b",
            "app_version",
            "analysis_timestamp",
            "environment",
        ])?;
        for s in summaries {
            writer.write_record(&[
                s.seg_id.clone(),
                s.event_a.clone(),
                s.event_b.clone(),
                s.overtaking_a.to_string(),
                s.overtaking_b.to_string(),
                s.copresence_count.to_string(),
                s.has_convergence.to_string(),
                s.cz_start_a.value().to_string(),
                s.cz_end_a.value().to_string(),
                s.cz_start_b.value().to_string(),
                s.cz_end_b.value().to_string(),
                app_version.to_string(),
                analysis_timestamp.to_rfc3339(),
                environment.to_string(),
            ])?;
        }
        writer.flush()?;

        let sha256 = compute_sha256(&path)?;
        let file_size_bytes = fs::metadata(&path)?.len();
        manifest.flow_pair_count = summaries.len();
        manifest.add_file(
            "reports/Flow.csv",
            FileInfo {
                sha256,
                row_count: summaries.len() as u64,
                file_size_bytes,
            },
        );
        Ok(())
    }

    pub fn write_metadata(&self, manifest: &DayMetadata) -> CourseflowResult<()> {
        let path = self.temp_dir.join("metadata.json");
        manifest.write_to(&path)?;
        Ok(())
    }

    /// Atomically publish the day's artifacts: rename the temp directory
    /// into its final location, replacing any prior attempt.
    pub fn commit(self) -> CourseflowResult<PathBuf> {
        if self.final_dir.exists() {
            fs::remove_dir_all(&self.final_dir)?;
        }
        fs::rename(&self.temp_dir, &self.final_dir)?;
        Ok(self.final_dir)
    }

    /// Discard a failed day's partial writes without ever publishing
    /// them (spec §4.4).
    pub fn purge(self) -> CourseflowResult<()> {
        if self.temp_dir.exists() {
            fs::remove_dir_all(&self.temp_dir)?;
        }
        Ok(())
    }

    pub fn bins_path(&self) -> PathBuf {
        self.temp_dir.join("bins/bins.parquet")
    }

    pub fn geojson_path(&self) -> PathBuf {
        self.temp_dir.join("bins/bins.geojson.gz")
    }
}

fn polars_err(e: PolarsError) -> CourseflowError {
    CourseflowError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use courseflow_core::{BinSeverity, Kilometers, LosClass, RatePerMeterPerMin};

    fn sample_bin() -> Bin {
        Bin {
            seg_id: "A1".to_string(),
            j: 0,
            k: 0,
            km_start: Kilometers(0.0),
            km_end: Kilometers(0.1),
            t_start: Seconds(0.0),
            t_end: Seconds(30.0),
            concurrent_count: 5,
            areal_density_p_per_m2: courseflow_core::PerSquareMeter(0.2),
            linear_rate_per_m_per_min: RatePerMeterPerMin(1.0),
            flow_utilization: 0.1,
            los_class: LosClass::A,
            severity: BinSeverity::None,
            flag_reason: None,
        }
    }

    #[test]
    fn writes_bins_parquet_and_records_manifest_entry() {
        let dir = tempfile::tempdir().unwrap();
        let writer = DayArtifactWriter::new(dir.path(), "sun").unwrap();
        let mut meta = DayMetadata::new("sun", "0.1.0");
        writer.write_bins(&[sample_bin()], "deadbeef", &mut meta).unwrap();
        assert_eq!(meta.bin_count, 1);
        assert!(meta.files.contains_key("bins/bins.parquet"));
        let path = writer.bins_path();
        assert!(path.exists());
    }

    #[test]
    fn commit_moves_temp_into_final_location() {
        let dir = tempfile::tempdir().unwrap();
        let writer = DayArtifactWriter::new(dir.path(), "sun").unwrap();
        let mut meta = DayMetadata::new("sun", "0.1.0");
        writer.write_bins(&[sample_bin()], "hash", &mut meta).unwrap();
        writer.write_metadata(&meta).unwrap();
        let final_dir = writer.commit().unwrap();
        assert!(final_dir.join("bins/bins.parquet").exists());
        assert!(final_dir.join("metadata.json").exists());
    }

    #[test]
    fn purge_removes_temp_dir_entirely() {
        let dir = tempfile::tempdir().unwrap();
        let writer = DayArtifactWriter::new(dir.path(), "sun").unwrap();
        let temp = writer.temp_dir.clone();
        writer.purge().unwrap();
        assert!(!temp.exists());
    }
}
