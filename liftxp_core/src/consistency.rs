//! Drift check between an avatar's attribute XP and its total.
//!
//! Deleting a workout only reduces `total_xp`, so the attribute fields can
//! sum to more than the total. This module reports the gap; it never
//! corrects it.

use crate::level::level_for_xp;
use crate::{UserAvatar, XpRules};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConsistencyReport {
    pub attribute_sum: u64,
    pub total_xp: u64,
    /// `attribute_sum - total_xp`; positive after deletes
    pub drift: i128,
    /// Stored level matches the level curve for `total_xp`
    pub level_ok: bool,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.drift == 0 && self.level_ok
    }
}

pub fn check_avatar(avatar: &UserAvatar, rules: &XpRules) -> ConsistencyReport {
    let attribute_sum = avatar.attributes().total();
    let report = ConsistencyReport {
        attribute_sum,
        total_xp: avatar.total_xp,
        drift: i128::from(attribute_sum) - i128::from(avatar.total_xp),
        level_ok: avatar.level == level_for_xp(avatar.total_xp, rules),
    };

    if !report.is_consistent() {
        tracing::warn!(
            "Avatar for {} is inconsistent: attributes sum to {}, total_xp {}, level_ok {}",
            avatar.user_id,
            report.attribute_sum,
            report.total_xp,
            report.level_ok
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{delete_workout, log_workout, select_avatar};
    use crate::store::{AvatarStore, Database};
    use crate::{Context, MuscleGroup, WorkoutInput};
    use chrono::NaiveDate;

    #[test]
    fn test_fresh_avatar_is_consistent() {
        let avatar = UserAvatar::new("u1", "monk");
        let report = check_avatar(&avatar, &XpRules::default());
        assert!(report.is_consistent());
        assert_eq!(report.drift, 0);
    }

    #[test]
    fn test_delete_leaves_positive_drift() {
        let rules = XpRules::default();
        let ctx = Context::new(NaiveDate::from_ymd_opt(2024, 3, 6).unwrap());
        let input = WorkoutInput {
            date: ctx.today,
            exercise_name: "Plank".into(),
            muscle_group: MuscleGroup::Abs,
            sets: None,
            reps: None,
            weight: None,
        };

        let mut db = Database::default();
        select_avatar(&mut db, "u1", "monk").unwrap();
        let created = log_workout(&mut db, "u1", &input, &ctx, &rules).unwrap();
        assert!(check_avatar(&created.avatar, &rules).is_consistent());

        delete_workout(&mut db, created.log.id, &rules).unwrap();
        let avatar = db.find_avatar("u1").unwrap().unwrap();
        let report = check_avatar(&avatar, &rules);

        assert_eq!(report.total_xp, 0);
        assert_eq!(report.attribute_sum, 55);
        assert_eq!(report.drift, 55);
        assert!(report.level_ok);
    }

    #[test]
    fn test_stale_level_flagged() {
        let mut avatar = UserAvatar::new("u1", "monk");
        avatar.total_xp = 500;
        avatar.vitality_xp = 500;
        let report = check_avatar(&avatar, &XpRules::default());
        assert_eq!(report.drift, 0);
        assert!(!report.level_ok);
    }
}
