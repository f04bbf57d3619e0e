//! CSV export for episode step results.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::types::StepResult;

/// Column header for step-result CSV export.
const HEADER: &str = "step,datetime,action,requested_power,feasible_power,\
                       grid_power,storage,lmp,moer,reward,terminal";

/// Exports step results to a CSV file at the given path.
///
/// Writes a header row followed by one data row per step. Produces
/// deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(results: &[StepResult], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(results, buf)
}

/// Writes step results as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(results: &[StepResult], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in results {
        wtr.write_record(&[
            r.step.to_string(),
            r.datetime.to_rfc3339(),
            format!("{:.4}", r.action),
            format!("{:.4}", r.requested_power),
            format!("{:.4}", r.feasible_power),
            format!("{:.4}", r.grid_power),
            format!("{:.4}", r.storage),
            format!("{:.4}", r.lmp),
            format!("{:.4}", r.moer),
            format!("{:.4}", r.reward),
            r.terminal.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn make_step(k: usize) -> StepResult {
        StepResult {
            step: k + 1,
            datetime: Utc.with_ymd_and_hms(2021, 10, 1, 0, 0, 0).unwrap()
                + Duration::minutes(5 * (k as i64 + 1)),
            action: -1.0,
            requested_power: -15.0,
            feasible_power: -15.0,
            grid_power: 15.0,
            storage: 30.0 + k as f64,
            lmp: 42.5,
            moer: 910.0,
            reward: -(42.5 + 910.0) * 15.0,
            terminal: k == 3,
        }
    }

    #[test]
    fn header_matches_schema() {
        let mut buf = Vec::new();
        write_csv(&[make_step(0)], &mut buf).ok();
        let output = String::from_utf8(buf).ok();
        let first_line = output.as_deref().unwrap_or("").lines().next().unwrap_or("");
        assert_eq!(
            first_line,
            "step,datetime,action,requested_power,feasible_power,grid_power,storage,lmp,moer,reward,terminal"
        );
    }

    #[test]
    fn row_count_matches_step_count() {
        let results: Vec<StepResult> = (0..24).map(make_step).collect();
        let mut buf = Vec::new();
        write_csv(&results, &mut buf).ok();
        let output = String::from_utf8(buf).ok();
        let lines: Vec<&str> = output.as_deref().unwrap_or("").lines().collect();
        // 1 header + 24 data rows
        assert_eq!(lines.len(), 25);
    }

    #[test]
    fn rows_parse_back() {
        let results: Vec<StepResult> = (0..4).map(make_step).collect();
        let mut buf = Vec::new();
        write_csv(&results, &mut buf).ok();

        let mut rdr = csv::ReaderBuilder::new().from_reader(buf.as_slice());
        let mut rows = 0;
        for record in rdr.records() {
            let rec = record.unwrap();
            assert!(chrono::DateTime::parse_from_rfc3339(&rec[1]).is_ok());
            for i in 2..10 {
                assert!(rec[i].parse::<f64>().is_ok(), "column {i} should parse as f64");
            }
            assert_eq!(rec[10].parse::<bool>().unwrap(), rows == 3);
            rows += 1;
        }
        assert_eq!(rows, 4);
    }

    #[test]
    fn export_writes_file() {
        let path = std::env::temp_dir().join(format!("storage_env_export_{}.csv", std::process::id()));
        export_csv(&[make_step(0), make_step(1)], &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);
        std::fs::remove_file(&path).ok();
    }
}
