//! Append-only ledger of XP changes.
//!
//! Every reconciled operation appends one event to a JSONL (JSON Lines) file
//! with file locking, giving an audit trail of how an avatar's XP moved.

use crate::engine::{Deletion, Outcome};
use crate::{Attribute, Result, XpGains};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Which operation produced an event
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum XpEventKind {
    Created,
    Edited,
    Deleted,
}

/// Signed per-attribute change
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttributeDelta {
    pub upper_body_xp: i64,
    pub lower_body_xp: i64,
    pub core_xp: i64,
    pub endurance_xp: i64,
    pub discipline_xp: i64,
    pub vitality_xp: i64,
}

impl AttributeDelta {
    /// `after - before`, field by field
    pub fn between(before: &XpGains, after: &XpGains) -> Self {
        let diff = |a: Attribute| signed(after.get(a)) - signed(before.get(a));
        Self {
            upper_body_xp: diff(Attribute::UpperBody),
            lower_body_xp: diff(Attribute::LowerBody),
            core_xp: diff(Attribute::Core),
            endurance_xp: diff(Attribute::Endurance),
            discipline_xp: diff(Attribute::Discipline),
            vitality_xp: diff(Attribute::Vitality),
        }
    }
}

fn signed(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// One recorded XP change
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct XpEvent {
    pub id: Uuid,
    pub at: DateTime<Utc>,
    pub user_id: String,
    pub log_id: Uuid,
    pub kind: XpEventKind,
    pub total_delta: i64,
    pub gains_delta: AttributeDelta,
}

impl XpEvent {
    /// Event for a create or edit outcome
    pub fn from_outcome(outcome: &Outcome, at: DateTime<Utc>) -> Self {
        let (kind, before) = match &outcome.replaced {
            Some(old) => (XpEventKind::Edited, *old),
            None => (XpEventKind::Created, Default::default()),
        };
        Self {
            id: Uuid::new_v4(),
            at,
            user_id: outcome.log.user_id.clone(),
            log_id: outcome.log.id,
            kind,
            total_delta: signed(outcome.award.total) - signed(before.total),
            gains_delta: AttributeDelta::between(&before.gains, &outcome.award.gains),
        }
    }

    /// Event for a delete; attribute XP is not reversed
    pub fn from_deletion(deletion: &Deletion, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            at,
            user_id: deletion.log.user_id.clone(),
            log_id: deletion.log.id,
            kind: XpEventKind::Deleted,
            total_delta: -signed(deletion.xp_removed),
            gains_delta: AttributeDelta::default(),
        }
    }
}

/// Event sink trait for persisting ledger entries
pub trait EventSink {
    fn append(&mut self, event: &XpEvent) -> Result<()>;
}

/// JSONL-based ledger with file locking
pub struct JsonlLedger {
    path: PathBuf,
}

impl JsonlLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl EventSink for JsonlLedger {
    fn append(&mut self, event: &XpEvent) -> Result<()> {
        self.ensure_parent_dir()?;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        // A crash mid-append leaves a line without its newline; terminate it
        // so the new event starts on a line of its own
        let torn = ends_without_newline(&mut file)?;

        let mut writer = std::io::BufWriter::new(&file);
        if torn {
            tracing::warn!("Ledger {:?} ends in a partial line, starting a new one", self.path);
            writer.write_all(b"\n")?;
        }
        let line = serde_json::to_string(event)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        file.unlock()?;

        tracing::debug!("Appended {:?} event for log {} to ledger", event.kind, event.log_id);
        Ok(())
    }
}

fn ends_without_newline(file: &mut File) -> Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

/// Read all events from a ledger file, skipping lines that fail to parse
pub fn read_events(path: &Path) -> Result<Vec<XpEvent>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut events = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<XpEvent>(&line) {
            Ok(event) => events.push(event),
            Err(e) => {
                tracing::warn!("Failed to parse ledger event at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} events from ledger", events.len());
    Ok(events)
}

/// Replay a user's `total_delta`s, clamping at zero like the avatar does
pub fn replay_total(events: &[XpEvent], user_id: &str) -> u64 {
    events
        .iter()
        .filter(|e| e.user_id == user_id)
        .fold(0u64, |total, e| {
            if e.total_delta >= 0 {
                total.saturating_add(e.total_delta.unsigned_abs())
            } else {
                total.saturating_sub(e.total_delta.unsigned_abs())
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{delete_workout, edit_workout, log_workout, select_avatar};
    use crate::store::Database;
    use crate::{Context, MuscleGroup, WorkoutInput, XpRules};
    use chrono::NaiveDate;

    fn input(group: MuscleGroup) -> WorkoutInput {
        WorkoutInput {
            date: NaiveDate::from_ymd_opt(2024, 3, 6).unwrap(),
            exercise_name: "Row".into(),
            muscle_group: group,
            sets: Some(4),
            reps: Some(10),
            weight: Some(50.0),
        }
    }

    #[test]
    fn test_append_and_read_events() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("ledger").join("xp.jsonl");
        let ctx = Context::new(NaiveDate::from_ymd_opt(2024, 3, 6).unwrap());
        let rules = XpRules::default();

        let mut db = Database::default();
        select_avatar(&mut db, "u1", "ranger").unwrap();
        let created = log_workout(&mut db, "u1", &input(MuscleGroup::Back), &ctx, &rules).unwrap();

        let mut ledger = JsonlLedger::new(&path);
        ledger.append(&XpEvent::from_outcome(&created, Utc::now())).unwrap();

        let events = read_events(&path).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, XpEventKind::Created);
        assert_eq!(events[0].total_delta, 105);
        assert_eq!(events[0].gains_delta.upper_body_xp, 50);
    }

    #[test]
    fn test_replay_matches_avatar_total() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("xp.jsonl");
        let ctx = Context::new(NaiveDate::from_ymd_opt(2024, 3, 6).unwrap());
        let rules = XpRules::default();
        let mut ledger = JsonlLedger::new(&path);

        let mut db = Database::default();
        select_avatar(&mut db, "u1", "ranger").unwrap();
        let a = log_workout(&mut db, "u1", &input(MuscleGroup::Legs), &ctx, &rules).unwrap();
        ledger.append(&XpEvent::from_outcome(&a, Utc::now())).unwrap();
        let b = log_workout(&mut db, "u1", &input(MuscleGroup::Abs), &ctx, &rules).unwrap();
        ledger.append(&XpEvent::from_outcome(&b, Utc::now())).unwrap();
        let edited =
            edit_workout(&mut db, a.log.id, &input(MuscleGroup::Chest), &ctx, &rules).unwrap();
        let edit_event = XpEvent::from_outcome(&edited, Utc::now());
        assert_eq!(edit_event.kind, XpEventKind::Edited);
        assert_eq!(edit_event.gains_delta.lower_body_xp, -50);
        assert_eq!(edit_event.gains_delta.upper_body_xp, 50);
        ledger.append(&edit_event).unwrap();
        let deleted = delete_workout(&mut db, b.log.id, &rules).unwrap();
        ledger.append(&XpEvent::from_deletion(&deleted, Utc::now())).unwrap();

        let events = read_events(&path).unwrap();
        assert_eq!(events.len(), 4);
        assert_eq!(replay_total(&events, "u1"), deleted.avatar.total_xp);
        assert_eq!(replay_total(&events, "someone_else"), 0);
    }

    #[test]
    fn test_corrupted_lines_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("xp.jsonl");
        std::fs::write(&path, "{ not json }\n\n").unwrap();

        let events = read_events(&path).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_append_after_partial_line_keeps_new_event() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("xp.jsonl");
        std::fs::write(&path, r#"{"id":"partial"#).unwrap();
        let ctx = Context::new(NaiveDate::from_ymd_opt(2024, 3, 6).unwrap());
        let rules = XpRules::default();

        let mut db = Database::default();
        select_avatar(&mut db, "u1", "ranger").unwrap();
        let created = log_workout(&mut db, "u1", &input(MuscleGroup::Abs), &ctx, &rules).unwrap();
        let mut ledger = JsonlLedger::new(&path);
        ledger.append(&XpEvent::from_outcome(&created, Utc::now())).unwrap();

        let events = read_events(&path).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].log_id, created.log.id);
        assert!(std::fs::read_to_string(&path).unwrap().ends_with('\n'));
    }

    #[test]
    fn test_read_missing_ledger() {
        let temp_dir = tempfile::tempdir().unwrap();
        let events = read_events(&temp_dir.path().join("nope.jsonl")).unwrap();
        assert!(events.is_empty());
    }
}
