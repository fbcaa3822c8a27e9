use crate::scanner::models::ScanReport;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const BREAKOUTS_FILE: &str = "breakouts.csv";
pub const COVERED_CALLS_FILE: &str = "covered_calls.csv";
pub const PUT_SPREADS_FILE: &str = "put_credit_spreads.csv";

/// Serialize flat records to CSV text, header row first.
/// An empty slice yields an empty string.
pub fn to_csv<T: Serialize>(records: &[T]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(record)?;
    }
    let bytes = writer.into_inner().context("Failed to flush CSV writer")?;
    Ok(String::from_utf8(bytes)?)
}

pub fn write_csv<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    std::fs::write(path, to_csv(records)?)
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Write the three result collections into `dir`, returning the written paths
pub fn write_report(dir: &Path, report: &ScanReport) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let breakouts = dir.join(BREAKOUTS_FILE);
    let covered_calls = dir.join(COVERED_CALLS_FILE);
    let put_spreads = dir.join(PUT_SPREADS_FILE);

    write_csv(&breakouts, &report.breakouts)?;
    write_csv(&covered_calls, &report.covered_calls)?;
    write_csv(&put_spreads, &report.put_spreads)?;

    Ok(vec![breakouts, covered_calls, put_spreads])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::models::{CoveredCallCandidate, PutCreditSpreadCandidate};
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[test]
    fn test_to_csv_covered_calls() {
        let rows = vec![CoveredCallCandidate {
            ticker: "AAA".to_string(),
            strike: 105.0,
            premium: 1.5,
            dte: 5,
            expiration: date(7),
            entry_date: date(2),
            exit_date: date(7),
        }];

        let text = to_csv(&rows).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("ticker,strike,premium,dte,expiration,entry_date,exit_date")
        );
        assert_eq!(lines.next(), Some("AAA,105.0,1.5,5,2025-06-07,2025-06-02,2025-06-07"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_to_csv_empty() {
        let rows: Vec<PutCreditSpreadCandidate> = Vec::new();
        assert_eq!(to_csv(&rows).unwrap(), "");
    }

    #[test]
    fn test_write_report_creates_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let paths = write_report(&out, &ScanReport::empty(date(2))).unwrap();

        assert_eq!(paths.len(), 3);
        for path in paths {
            assert!(path.exists());
        }
        assert!(out.join(PUT_SPREADS_FILE).exists());
    }
}
