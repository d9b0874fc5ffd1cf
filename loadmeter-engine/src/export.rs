use loadmeter_common::{LoadMeterError, Result};
use std::fs::{self, OpenOptions};
use std::path::Path;

use crate::report::Report;

pub const CSV_HEADER: [&str; 11] = [
    "name",
    "totalRequests",
    "successCount",
    "errorCount",
    "errorRate",
    "meanMs",
    "medianMs",
    "p95Ms",
    "p99Ms",
    "maxMs",
    "active",
];

/// One CSV row: error rate at 2 decimal places, latencies at 3.
pub fn csv_record(report: &Report) -> [String; 11] {
    [
        report.name.clone(),
        report.total_requests.to_string(),
        report.success_count.to_string(),
        report.error_count.to_string(),
        format!("{:.2}", report.error_rate_percent),
        format!("{:.3}", report.mean_ms),
        format!("{:.3}", report.median_ms),
        format!("{:.3}", report.p95_ms),
        format!("{:.3}", report.p99_ms),
        format!("{:.3}", report.max_ms),
        report.active_requests.to_string(),
    ]
}

/// Append `report` to `path`, writing the header first if the file is empty.
/// Missing parent directories are created.
pub fn append_report(path: &Path, report: &Report) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(export_error)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(export_error)?;
    let is_new = file.metadata().map_err(export_error)?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(file);
    if is_new {
        writer.write_record(CSV_HEADER).map_err(export_error)?;
    }
    writer.write_record(csv_record(report)).map_err(export_error)?;
    writer.flush().map_err(export_error)?;
    Ok(())
}

fn export_error(e: impl std::fmt::Display) -> LoadMeterError {
    LoadMeterError::Export(e.to_string())
}
