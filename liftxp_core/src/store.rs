//! Workout log and avatar stores.
//!
//! The engine talks to storage through three small traits. [`Database`]
//! implements all of them in memory and persists as a single JSON document,
//! so every operation's writes land together or not at all.

use crate::rules::week_start;
use crate::{Error, Result, UserAvatar, WorkoutLog};
use chrono::NaiveDate;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Criteria for listing workout logs
#[derive(Clone, Debug, Default)]
pub struct LogFilter {
    pub user_id: Option<String>,
    /// Inclusive lower bound on the log date
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on the log date
    pub to: Option<NaiveDate>,
}

impl LogFilter {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Default::default()
        }
    }

    pub fn matches(&self, log: &WorkoutLog) -> bool {
        self.user_id.as_deref().map_or(true, |u| log.user_id == u)
            && self.from.map_or(true, |from| log.date >= from)
            && self.to.map_or(true, |to| log.date <= to)
    }
}

/// Persistence for workout logs
pub trait WorkoutLogStore {
    fn create_log(&mut self, log: WorkoutLog) -> Result<WorkoutLog>;
    fn update_log(&mut self, id: Uuid, log: WorkoutLog) -> Result<WorkoutLog>;
    fn delete_log(&mut self, id: Uuid) -> Result<()>;
    fn get_log(&self, id: Uuid) -> Result<Option<WorkoutLog>>;
    /// Matching logs, newest date first
    fn filter_logs(&self, filter: &LogFilter) -> Result<Vec<WorkoutLog>>;
}

/// Persistence for trainee avatars
pub trait AvatarStore {
    fn find_avatar(&self, user_id: &str) -> Result<Option<UserAvatar>>;
    fn insert_avatar(&mut self, avatar: UserAvatar) -> Result<UserAvatar>;
    fn update_avatar(&mut self, id: Uuid, avatar: UserAvatar) -> Result<UserAvatar>;
}

/// Number of workouts per trainee per Sunday-start week
pub trait WeeklyCounter {
    fn weekly_count(&self, user_id: &str, week_start: NaiveDate) -> Result<u32>;
}

/// Count of logs for one (user, week) pair
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WeekCount {
    pub user_id: String,
    pub week_start: NaiveDate,
    pub count: u32,
}

/// In-memory store holding logs, avatars and weekly counters
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Database {
    #[serde(default)]
    pub logs: Vec<WorkoutLog>,
    #[serde(default)]
    pub avatars: Vec<UserAvatar>,
    #[serde(default)]
    pub week_counts: Vec<WeekCount>,
}

impl Database {
    fn bump_week(&mut self, user_id: &str, date: NaiveDate) {
        let start = week_start(date);
        match self
            .week_counts
            .iter_mut()
            .find(|w| w.user_id == user_id && w.week_start == start)
        {
            Some(entry) => entry.count += 1,
            None => self.week_counts.push(WeekCount {
                user_id: user_id.to_string(),
                week_start: start,
                count: 1,
            }),
        }
    }

    fn drop_week(&mut self, user_id: &str, date: NaiveDate) {
        let start = week_start(date);
        if let Some(entry) = self
            .week_counts
            .iter_mut()
            .find(|w| w.user_id == user_id && w.week_start == start)
        {
            entry.count = entry.count.saturating_sub(1);
        }
        self.week_counts.retain(|w| w.count > 0);
    }

    /// Recompute every weekly counter from the stored logs
    ///
    /// Returns the number of (user, week) entries after the rebuild.
    pub fn rebuild_weekly_counts(&mut self) -> usize {
        self.week_counts.clear();
        let entries: Vec<(String, NaiveDate)> = self
            .logs
            .iter()
            .map(|log| (log.user_id.clone(), log.date))
            .collect();
        for (user_id, date) in entries {
            self.bump_week(&user_id, date);
        }
        tracing::info!("Rebuilt {} weekly counters", self.week_counts.len());
        self.week_counts.len()
    }

    /// Load the database from a file with shared locking
    ///
    /// Returns an empty database if the file doesn't exist. A file that
    /// cannot be parsed is moved aside to `<name>.corrupt` and an empty
    /// database is returned.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No database file found at {:?}, starting empty", path);
            return Ok(Self::default());
        }

        let file = File::open(path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        match serde_json::from_str::<Database>(&contents) {
            Ok(db) => {
                tracing::debug!(
                    "Loaded {} logs and {} avatars from {:?}",
                    db.logs.len(),
                    db.avatars.len(),
                    path
                );
                Ok(db)
            }
            Err(e) => {
                let aside = corrupt_path(path);
                tracing::warn!(
                    "Failed to parse database {:?}: {}. Moved it to {:?} and starting empty.",
                    path,
                    e,
                    aside
                );
                std::fs::rename(path, &aside)?;
                Ok(Self::default())
            }
        }
    }

    /// Save the database while holding the writer lock
    pub fn save(&self, path: &Path) -> Result<()> {
        let _lock = WriteLock::acquire(path)?;
        self.write_to(path)
    }

    /// Load, run `f`, and save only if `f` succeeds
    ///
    /// The writer lock is held from load to save, so concurrent updates run
    /// one after another. An error from `f` leaves the file untouched, so an
    /// operation's avatar and log writes are never persisted halfway.
    pub fn update<T, F>(path: &Path, f: F) -> Result<T>
    where
        F: FnOnce(&mut Database) -> Result<T>,
    {
        let _lock = WriteLock::acquire(path)?;
        let mut db = Self::load(path)?;
        let value = f(&mut db)?;
        db.write_to(path)?;
        Ok(value)
    }

    /// Write to a temp file in the same directory, sync it, then rename it
    /// over the original. Callers hold the writer lock.
    fn write_to(&self, path: &Path) -> Result<()> {
        let parent = parent_dir(path);
        let temp = NamedTempFile::new_in(parent)?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved database to {:?}", path);
        Ok(())
    }
}

/// Exclusive lock on `<db>.lock`, released on drop
///
/// The database file itself is replaced by rename on every save, so writers
/// coordinate on this sidecar whose inode never changes.
struct WriteLock {
    file: File,
}

impl WriteLock {
    fn acquire(db_path: &Path) -> Result<Self> {
        std::fs::create_dir_all(parent_dir(db_path))?;
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(lock_path(db_path))?;
        file.lock_exclusive()?;
        Ok(Self { file })
    }
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            tracing::warn!("Failed to release database lock: {}", e);
        }
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

fn lock_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    path.with_file_name(name)
}

fn corrupt_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".corrupt");
    path.with_file_name(name)
}

impl WorkoutLogStore for Database {
    fn create_log(&mut self, log: WorkoutLog) -> Result<WorkoutLog> {
        if self.logs.iter().any(|l| l.id == log.id) {
            return Err(Error::Other(format!("Workout log {} already exists", log.id)));
        }
        self.bump_week(&log.user_id, log.date);
        self.logs.push(log.clone());
        Ok(log)
    }

    fn update_log(&mut self, id: Uuid, log: WorkoutLog) -> Result<WorkoutLog> {
        let index = self
            .logs
            .iter()
            .position(|l| l.id == id)
            .ok_or(Error::LogNotFound(id))?;
        let previous = self.logs[index].clone();
        if previous.user_id != log.user_id || previous.date != log.date {
            self.drop_week(&previous.user_id, previous.date);
            self.bump_week(&log.user_id, log.date);
        }
        self.logs[index] = WorkoutLog { id, ..log };
        Ok(self.logs[index].clone())
    }

    fn delete_log(&mut self, id: Uuid) -> Result<()> {
        let index = self
            .logs
            .iter()
            .position(|l| l.id == id)
            .ok_or(Error::LogNotFound(id))?;
        let removed = self.logs.remove(index);
        self.drop_week(&removed.user_id, removed.date);
        Ok(())
    }

    fn get_log(&self, id: Uuid) -> Result<Option<WorkoutLog>> {
        Ok(self.logs.iter().find(|l| l.id == id).cloned())
    }

    fn filter_logs(&self, filter: &LogFilter) -> Result<Vec<WorkoutLog>> {
        let mut logs: Vec<WorkoutLog> = self
            .logs
            .iter()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect();
        logs.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(logs)
    }
}

impl AvatarStore for Database {
    fn find_avatar(&self, user_id: &str) -> Result<Option<UserAvatar>> {
        Ok(self.avatars.iter().find(|a| a.user_id == user_id).cloned())
    }

    fn insert_avatar(&mut self, avatar: UserAvatar) -> Result<UserAvatar> {
        if self.avatars.iter().any(|a| a.user_id == avatar.user_id) {
            return Err(Error::AvatarExists {
                user_id: avatar.user_id,
            });
        }
        self.avatars.push(avatar.clone());
        Ok(avatar)
    }

    fn update_avatar(&mut self, id: Uuid, avatar: UserAvatar) -> Result<UserAvatar> {
        let slot = self
            .avatars
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| Error::NoAvatar {
                user_id: avatar.user_id.clone(),
            })?;
        *slot = UserAvatar { id, ..avatar };
        Ok(slot.clone())
    }
}

impl WeeklyCounter for Database {
    fn weekly_count(&self, user_id: &str, week_start: NaiveDate) -> Result<u32> {
        Ok(self
            .week_counts
            .iter()
            .find(|w| w.user_id == user_id && w.week_start == week_start)
            .map_or(0, |w| w.count))
    }
}
