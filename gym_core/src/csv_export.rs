//! CSV export of the progress log.
//!
//! One row per date and slot, for spreadsheets and external charts. The JSON
//! export stays the lossless format; this one carries counters only.

use crate::progress::ProgressLog;
use crate::{Result, Slot};
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    date: String,
    slot: &'static str,
    pushups: u32,
    dumb_r: u32,
    dumb_l: u32,
}

/// Write every logged date to `csv_path`, replacing any existing file.
///
/// Returns the number of rows written (three per date).
pub fn write_progress_csv(log: &ProgressLog, csv_path: &Path) -> Result<usize> {
    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_path(csv_path)?;

    let mut rows = 0;
    for (date, progress) in log {
        for slot in Slot::ALL {
            let counts = progress.slot(slot);
            writer.serialize(CsvRow {
                date: date.to_string(),
                slot: slot.as_str(),
                pushups: counts.pushups,
                dumb_r: counts.dumb_r,
                dumb_l: counts.dumb_l,
            })?;
            rows += 1;
        }
    }

    writer.flush()?;
    tracing::info!("Exported {} CSV rows to {:?}", rows, csv_path);
    Ok(rows)
}
