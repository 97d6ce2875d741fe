//! CSV export of the combined progress view.

use crate::types::CombinedDayRecord;
use crate::Result;
use std::fs::File;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    date: String,
    water_ml: Option<f64>,
    calories: Option<f64>,
    protein: Option<f64>,
    carbs: Option<f64>,
    fats: Option<f64>,
    exercises: usize,
    total_volume_kg: f64,
    sleep_hours: Option<f64>,
    sleep_quality: Option<u8>,
}

impl From<&CombinedDayRecord> for CsvRow {
    fn from(day: &CombinedDayRecord) -> Self {
        let nutrition = day.nutrition.as_ref();
        CsvRow {
            date: day.date.format("%Y-%m-%d").to_string(),
            water_ml: day.hydration.as_ref().map(|h| h.amount_ml),
            calories: nutrition.map(|n| n.calories),
            protein: nutrition.map(|n| n.protein),
            carbs: nutrition.map(|n| n.carbs),
            fats: nutrition.map(|n| n.fats),
            exercises: day.exercises.len(),
            total_volume_kg: day.exercises.iter().map(|e| e.total_volume()).sum(),
            sleep_hours: day.sleep.as_ref().map(|s| s.duration_hours),
            sleep_quality: day.sleep.as_ref().map(|s| s.quality),
        }
    }
}

/// Write one row per day to `csv_path`, replacing any previous export.
///
/// The file is synced to disk before returning. Returns the row count.
pub fn export_combined_csv(records: &[CombinedDayRecord], csv_path: &Path) -> Result<usize> {
    if let Some(parent) = csv_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(csv_path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(file);

    for day in records {
        writer.serialize(CsvRow::from(day))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Exported {} days to {:?}", records.len(), csv_path);
    Ok(records.len())
}
