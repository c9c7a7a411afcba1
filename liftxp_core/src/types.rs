//! Core domain types for the liftxp system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Muscle groups and XP attributes
//! - Workout logs and the form input they are built from
//! - The trainee's avatar profile that XP accrues on

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Muscle Groups and Attributes
// ============================================================================

/// Muscle group targeted by a workout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MuscleGroup {
    Chest,
    Back,
    Shoulders,
    Biceps,
    Triceps,
    Legs,
    Abs,
    Cardio,
    FullBody,
    Other(String),
}

impl MuscleGroup {
    /// Parse a muscle group name, case-insensitively.
    ///
    /// Unknown names are kept as `Other` rather than rejected; they simply
    /// earn no base award.
    pub fn parse(name: &str) -> Self {
        let normalized = name.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "chest" => MuscleGroup::Chest,
            "back" => MuscleGroup::Back,
            "shoulders" => MuscleGroup::Shoulders,
            "biceps" => MuscleGroup::Biceps,
            "triceps" => MuscleGroup::Triceps,
            "legs" => MuscleGroup::Legs,
            "abs" => MuscleGroup::Abs,
            "cardio" => MuscleGroup::Cardio,
            "full_body" | "fullbody" => MuscleGroup::FullBody,
            _ => MuscleGroup::Other(name.trim().to_string()),
        }
    }
}

impl fmt::Display for MuscleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MuscleGroup::Chest => "Chest",
            MuscleGroup::Back => "Back",
            MuscleGroup::Shoulders => "Shoulders",
            MuscleGroup::Biceps => "Biceps",
            MuscleGroup::Triceps => "Triceps",
            MuscleGroup::Legs => "Legs",
            MuscleGroup::Abs => "Abs",
            MuscleGroup::Cardio => "Cardio",
            MuscleGroup::FullBody => "Full Body",
            MuscleGroup::Other(name) => name.as_str(),
        };
        f.pad(name)
    }
}

/// One of the six XP sub-categories tracked on an avatar
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    UpperBody,
    LowerBody,
    Core,
    Endurance,
    Discipline,
    Vitality,
}

impl Attribute {
    pub const ALL: [Attribute; 6] = [
        Attribute::UpperBody,
        Attribute::LowerBody,
        Attribute::Core,
        Attribute::Endurance,
        Attribute::Discipline,
        Attribute::Vitality,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Attribute::UpperBody => "Upper Body",
            Attribute::LowerBody => "Lower Body",
            Attribute::Core => "Core",
            Attribute::Endurance => "Endurance",
            Attribute::Discipline => "Discipline",
            Attribute::Vitality => "Vitality",
        }
    }
}

// ============================================================================
// XP Gains
// ============================================================================

/// Per-attribute XP awarded by a single workout
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct XpGains {
    pub upper_body_xp: u64,
    pub lower_body_xp: u64,
    pub core_xp: u64,
    pub endurance_xp: u64,
    pub discipline_xp: u64,
    pub vitality_xp: u64,
}

impl XpGains {
    pub fn get(&self, attribute: Attribute) -> u64 {
        match attribute {
            Attribute::UpperBody => self.upper_body_xp,
            Attribute::LowerBody => self.lower_body_xp,
            Attribute::Core => self.core_xp,
            Attribute::Endurance => self.endurance_xp,
            Attribute::Discipline => self.discipline_xp,
            Attribute::Vitality => self.vitality_xp,
        }
    }

    pub fn get_mut(&mut self, attribute: Attribute) -> &mut u64 {
        match attribute {
            Attribute::UpperBody => &mut self.upper_body_xp,
            Attribute::LowerBody => &mut self.lower_body_xp,
            Attribute::Core => &mut self.core_xp,
            Attribute::Endurance => &mut self.endurance_xp,
            Attribute::Discipline => &mut self.discipline_xp,
            Attribute::Vitality => &mut self.vitality_xp,
        }
    }

    /// Sum of all six attribute gains
    pub fn total(&self) -> u64 {
        Attribute::ALL
            .iter()
            .fold(0u64, |sum, a| sum.saturating_add(self.get(*a)))
    }
}

// ============================================================================
// Workout Logs
// ============================================================================

/// A recorded workout with the XP it earned
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutLog {
    pub id: Uuid,
    pub user_id: String,
    pub date: NaiveDate,
    pub exercise_name: String,
    pub muscle_group: MuscleGroup,
    pub sets: Option<u32>,
    pub reps: Option<u32>,
    pub weight: Option<f64>,
    pub xp_awarded: u64,
    pub xp_gains: XpGains,
}

/// Workout fields as submitted from the log form
#[derive(Clone, Debug, PartialEq)]
pub struct WorkoutInput {
    pub date: NaiveDate,
    pub exercise_name: String,
    pub muscle_group: MuscleGroup,
    pub sets: Option<u32>,
    pub reps: Option<u32>,
    pub weight: Option<f64>,
}

impl WorkoutInput {
    /// Check the form fields before any store is touched
    pub fn validate(&self) -> crate::Result<()> {
        if self.exercise_name.trim().is_empty() {
            return Err(crate::Error::InvalidInput(
                "exercise name is required".into(),
            ));
        }
        if let MuscleGroup::Other(name) = &self.muscle_group {
            if name.trim().is_empty() {
                return Err(crate::Error::InvalidInput(
                    "muscle group is required".into(),
                ));
            }
        }
        if let Some(weight) = self.weight {
            if !weight.is_finite() || weight < 0.0 {
                return Err(crate::Error::InvalidInput(format!(
                    "weight must be a non-negative number, got {}",
                    weight
                )));
            }
        }
        Ok(())
    }

    /// Form input pre-filled from an existing log (used when editing)
    pub fn from_log(log: &WorkoutLog) -> Self {
        Self {
            date: log.date,
            exercise_name: log.exercise_name.clone(),
            muscle_group: log.muscle_group.clone(),
            sets: log.sets,
            reps: log.reps,
            weight: log.weight,
        }
    }
}

// ============================================================================
// Avatar
// ============================================================================

/// The trainee's XP profile; one per user
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserAvatar {
    pub id: Uuid,
    pub user_id: String,
    #[serde(default)]
    pub archetype: String,
    pub total_xp: u64,
    pub level: u32,
    pub upper_body_xp: u64,
    pub lower_body_xp: u64,
    pub core_xp: u64,
    pub endurance_xp: u64,
    pub discipline_xp: u64,
    pub vitality_xp: u64,
}

impl UserAvatar {
    /// A fresh level-1 avatar with no XP
    pub fn new(user_id: impl Into<String>, archetype: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            archetype: archetype.into(),
            total_xp: 0,
            level: 1,
            upper_body_xp: 0,
            lower_body_xp: 0,
            core_xp: 0,
            endurance_xp: 0,
            discipline_xp: 0,
            vitality_xp: 0,
        }
    }

    /// Attribute XP held by this avatar, as a gains record
    pub fn attributes(&self) -> XpGains {
        XpGains {
            upper_body_xp: self.upper_body_xp,
            lower_body_xp: self.lower_body_xp,
            core_xp: self.core_xp,
            endurance_xp: self.endurance_xp,
            discipline_xp: self.discipline_xp,
            vitality_xp: self.vitality_xp,
        }
    }

    pub fn set_attributes(&mut self, gains: XpGains) {
        self.upper_body_xp = gains.upper_body_xp;
        self.lower_body_xp = gains.lower_body_xp;
        self.core_xp = gains.core_xp;
        self.endurance_xp = gains.endurance_xp;
        self.discipline_xp = gains.discipline_xp;
        self.vitality_xp = gains.vitality_xp;
    }
}

/// Runtime context for XP operations
#[derive(Clone, Copy, Debug)]
pub struct Context {
    /// The day the weekly discipline window is measured from
    pub today: NaiveDate,
}

impl Context {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    /// Context for the current local date
    pub fn now() -> Self {
        Self::new(chrono::Local::now().date_naive())
    }
}
