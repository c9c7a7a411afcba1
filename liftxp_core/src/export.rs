//! CSV export of workout logs.
//!
//! Each export is a full snapshot: rows go to a temp file beside the target,
//! which is fsynced and renamed over any previous export.

use crate::{Result, WorkoutLog};
use std::path::Path;
use tempfile::NamedTempFile;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    user_id: String,
    date: String,
    exercise_name: String,
    muscle_group: String,
    sets: Option<u32>,
    reps: Option<u32>,
    weight: Option<f64>,
    xp_awarded: u64,
    upper_body_xp: u64,
    lower_body_xp: u64,
    core_xp: u64,
    endurance_xp: u64,
    discipline_xp: u64,
    vitality_xp: u64,
}

impl From<&WorkoutLog> for CsvRow {
    fn from(log: &WorkoutLog) -> Self {
        CsvRow {
            id: log.id.to_string(),
            user_id: log.user_id.clone(),
            date: log.date.format("%Y-%m-%d").to_string(),
            exercise_name: log.exercise_name.clone(),
            muscle_group: log.muscle_group.to_string(),
            sets: log.sets,
            reps: log.reps,
            weight: log.weight,
            xp_awarded: log.xp_awarded,
            upper_body_xp: log.xp_gains.upper_body_xp,
            lower_body_xp: log.xp_gains.lower_body_xp,
            core_xp: log.xp_gains.core_xp,
            endurance_xp: log.xp_gains.endurance_xp,
            discipline_xp: log.xp_gains.discipline_xp,
            vitality_xp: log.xp_gains.vitality_xp,
        }
    }
}

/// Write logs to a CSV file, returning the number of rows written
pub fn export_logs_csv(logs: &[WorkoutLog], csv_path: &Path) -> Result<usize> {
    if logs.is_empty() {
        tracing::info!("No workout logs to export");
        return Ok(0);
    }

    let parent = match csv_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(temp);

    for log in logs {
        writer.serialize(CsvRow::from(log))?;
    }

    writer.flush()?;
    let temp = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    temp.as_file().sync_all()?;
    temp.persist(csv_path).map_err(|e| e.error)?;

    tracing::info!("Exported {} workout logs to {:?}", logs.len(), csv_path);
    Ok(logs.len())
}
