use crate::error::Result;
use crate::statistics::SpeedHistogram;
use gas_common::{EnsembleSnapshot, FrameStatistics};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// End-of-run data handed to external plotting/reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub ticks: u64,
    pub particle_count: usize,
    /// Placement seed; None when the run started from explicit particles.
    pub seed: Option<u64>,
    pub collisions_resolved: u64,
    pub degenerate_collisions: u64,
    pub wall_hits: u64,
    /// Average speed of every tick, oldest first.
    pub average_speed_series: Vec<f64>,
    /// Per-particle speeds of the final tick, indexed by particle identity.
    pub final_speeds: Vec<f64>,
    pub final_speed_histogram: SpeedHistogram,
    pub final_frame: Option<FrameStatistics>,
}

/// Serialization used for the report file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Bincode,
    MessagePack,
}

impl ReportFormat {
    /// Maps the `output.format` setting; unknown names fall back to JSON.
    pub fn from_setting(setting: Option<&str>) -> Self {
        match setting.unwrap_or("json") {
            "json" => ReportFormat::Json,
            "bincode" => ReportFormat::Bincode,
            "messagepack" => ReportFormat::MessagePack,
            other => {
                error!("Unknown output format: {}. Using JSON instead.", other);
                ReportFormat::Json
            }
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Bincode => "bin",
            ReportFormat::MessagePack => "msgpack",
        }
    }
}

/// Writes `report` to `<base_filename>_report.<ext>` and returns the path.
pub fn write_report(report: &RunReport, base_filename: &str, format: ReportFormat) -> Result<PathBuf> {
    let path = PathBuf::from(format!("{}_report.{}", base_filename, format.extension()));
    let mut writer = BufWriter::new(File::create(&path)?);
    match format {
        ReportFormat::Json => serde_json::to_writer(&mut writer, report)?,
        ReportFormat::Bincode => bincode::serialize_into(&mut writer, report)?,
        ReportFormat::MessagePack => rmp_serde::encode::write(&mut writer, report)?,
    }
    writer.flush()?;
    info!("Run report saved to {}", path.display());
    Ok(path)
}

/// Writes the average-speed series as `tick,average_speed` rows (ticks start at 1).
pub fn write_speed_series_csv<P: AsRef<Path>>(series: &[f64], path: P) -> Result<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    writer.write_record(["tick", "average_speed"])?;
    for (idx, speed) in series.iter().enumerate() {
        writer.write_record(&[(idx + 1).to_string(), format!("{:.6e}", speed)])?;
    }
    writer.flush()?;
    info!("Average speed series saved to {}", path.as_ref().display());
    Ok(())
}

/// Writes the full ensemble state as pretty JSON for post-mortem inspection.
pub fn write_state_dump<P: AsRef<Path>>(snapshot: &EnsembleSnapshot, path: P) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    serde_json::to_writer_pretty(&mut writer, snapshot)?;
    writer.flush()?;
    info!("State dump saved to {}", path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gas_common::Vec2;

    fn temp_base(name: &str) -> String {
        std::env::temp_dir()
            .join(format!("gas_engine_{}_{}", name, std::process::id()))
            .display()
            .to_string()
    }

    fn report() -> RunReport {
        RunReport {
            ticks: 2,
            particle_count: 2,
            seed: Some(42),
            collisions_resolved: 1,
            degenerate_collisions: 0,
            wall_hits: 3,
            average_speed_series: vec![1.5, 1.25],
            final_speeds: vec![1.0, 1.5],
            final_speed_histogram: SpeedHistogram { edges: vec![1.0, 1.5], counts: vec![2] },
            final_frame: None,
        }
    }

    #[test]
    fn unknown_format_falls_back_to_json() {
        assert_eq!(ReportFormat::from_setting(None), ReportFormat::Json);
        assert_eq!(ReportFormat::from_setting(Some("bincode")), ReportFormat::Bincode);
        assert_eq!(ReportFormat::from_setting(Some("messagepack")), ReportFormat::MessagePack);
        assert_eq!(ReportFormat::from_setting(Some("yaml")), ReportFormat::Json);
    }

    #[test]
    fn json_report_reads_back() -> Result<()> {
        let base = temp_base("json");
        let path = write_report(&report(), &base, ReportFormat::Json)?;
        let text = std::fs::read_to_string(&path)?;
        let back: RunReport = serde_json::from_str(&text)?;
        assert_eq!(back.average_speed_series, vec![1.5, 1.25]);
        assert_eq!(back.seed, Some(42));
        assert!(back.final_frame.is_none());
        std::fs::remove_file(path)?;
        Ok(())
    }

    #[test]
    fn binary_reports_are_written() -> Result<()> {
        let base = temp_base("binary");
        for format in [ReportFormat::Bincode, ReportFormat::MessagePack] {
            let path = write_report(&report(), &base, format)?;
            assert!(path.to_string_lossy().ends_with(format.extension()));
            assert!(std::fs::metadata(&path)?.len() > 0);
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    #[test]
    fn speed_series_csv_has_header_and_rows() -> Result<()> {
        let path = PathBuf::from(format!("{}_series.csv", temp_base("csv")));
        write_speed_series_csv(&[2.0, 3.5], &path)?;
        let text = std::fs::read_to_string(&path)?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "tick,average_speed");
        assert_eq!(lines.len(), 3);
        assert!(lines[2].starts_with("2,3.5"));
        std::fs::remove_file(path)?;
        Ok(())
    }

    #[test]
    fn state_dump_is_pretty_json() -> Result<()> {
        let path = PathBuf::from(format!("{}_dump.json", temp_base("dump")));
        let snapshot = EnsembleSnapshot {
            tick: 9,
            radius: 1.0,
            positions: vec![Vec2::new(1.0, 2.0)],
            velocities: vec![Vec2::new(0.0, -1.0)],
        };
        write_state_dump(&snapshot, &path)?;
        let back: EnsembleSnapshot = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        assert_eq!(back, snapshot);
        std::fs::remove_file(path)?;
        Ok(())
    }
}
