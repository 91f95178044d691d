//! CSV export for the history window.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::types::SimulationDataPoint;

/// Column header for CSV history export.
const HEADER: &str = "hour,timestamp,flow_lps,inlet_m,outlet_m,critical_point_m,head_loss_m";

/// Exports data points to a CSV file at the given path.
///
/// Writes a header row followed by one row per point, oldest first.
/// Produces deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv<'a>(
    points: impl IntoIterator<Item = &'a SimulationDataPoint>,
    path: &Path,
) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(points, buf)
}

/// Writes data points as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv<'a>(
    points: impl IntoIterator<Item = &'a SimulationDataPoint>,
    writer: impl Write,
) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(','))?;

    for p in points {
        wtr.write_record(&[
            p.hour.to_string(),
            p.timestamp.clone(),
            format!("{:.4}", p.flow_lps),
            format!("{:.4}", p.inlet_pressure_m),
            format!("{:.4}", p.outlet_pressure_m),
            format!("{:.4}", p.critical_point_pressure_m),
            format!("{:.4}", p.head_loss_m),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
