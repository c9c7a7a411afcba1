//! XP award rules for a single workout.
//!
//! A workout earns XP on up to four attributes:
//! - **Base award**: the muscle group's attribute gets a flat award
//!   (Cardio → endurance, Legs → lower body, Abs → core, push/pull groups → upper body)
//! - **Endurance bonus**: `round(weight * reps * factor)` when both are logged
//! - **Vitality**: flat award for any workout
//! - **Discipline**: awarded on exactly the Nth workout of the Sunday-start week

use crate::{Attribute, MuscleGroup, WorkoutInput, XpGains, XpRules};
use chrono::{Datelike, Duration, NaiveDate};

/// XP computed for one workout
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct XpAward {
    pub total: u64,
    pub gains: XpGains,
}

/// Attribute receiving the base award for a muscle group, if any
pub fn base_attribute(group: &MuscleGroup) -> Option<Attribute> {
    match group {
        MuscleGroup::Cardio => Some(Attribute::Endurance),
        MuscleGroup::Legs => Some(Attribute::LowerBody),
        MuscleGroup::Abs => Some(Attribute::Core),
        MuscleGroup::Chest
        | MuscleGroup::Back
        | MuscleGroup::Shoulders
        | MuscleGroup::Biceps
        | MuscleGroup::Triceps => Some(Attribute::UpperBody),
        MuscleGroup::FullBody | MuscleGroup::Other(_) => None,
    }
}

/// Sunday on or before `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// Endurance bonus from load volume; zero unless weight and reps are both positive
pub fn endurance_bonus(weight: Option<f64>, reps: Option<u32>, rules: &XpRules) -> u64 {
    match (weight, reps) {
        (Some(w), Some(r)) if w > 0.0 && r > 0 => {
            let bonus = (w * f64::from(r) * rules.endurance_factor).round();
            if bonus.is_finite() && bonus > 0.0 {
                bonus as u64
            } else {
                0
            }
        }
        _ => 0,
    }
}

/// Map a workout to per-attribute XP
///
/// `weekly_count` is the number of the trainee's *other* workouts already
/// logged in the current week.
pub fn attribute_gains(input: &WorkoutInput, weekly_count: u32, rules: &XpRules) -> XpGains {
    let mut gains = XpGains::default();

    if let Some(attribute) = base_attribute(&input.muscle_group) {
        let field = gains.get_mut(attribute);
        *field = field.saturating_add(rules.base_award);
    }

    gains.endurance_xp = gains
        .endurance_xp
        .saturating_add(endurance_bonus(input.weight, input.reps, rules));
    gains.vitality_xp = gains.vitality_xp.saturating_add(rules.vitality_award);

    if weekly_count.saturating_add(1) == rules.discipline_threshold {
        gains.discipline_xp = gains.discipline_xp.saturating_add(rules.discipline_award);
    }

    gains
}

/// Compute the full award for a workout
pub fn award(input: &WorkoutInput, weekly_count: u32, rules: &XpRules) -> XpAward {
    let gains = attribute_gains(input, weekly_count, rules);
    let award = XpAward {
        total: gains.total(),
        gains,
    };

    tracing::debug!(
        "Award for {} ({}): {} XP, week count {}",
        input.exercise_name,
        input.muscle_group,
        award.total,
        weekly_count
    );

    award
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(group: MuscleGroup, weight: Option<f64>, reps: Option<u32>) -> WorkoutInput {
        WorkoutInput {
            date: NaiveDate::from_ymd_opt(2024, 3, 6).unwrap(),
            exercise_name: "Test".into(),
            muscle_group: group,
            sets: Some(3),
            reps,
            weight,
        }
    }

    #[test]
    fn test_legs_first_and_second_of_week() {
        let rules = XpRules::default();
        for weekly_count in [0, 1] {
            let award = award(&input(MuscleGroup::Legs, Some(100.0), Some(10)), weekly_count, &rules);
            assert_eq!(award.gains.lower_body_xp, 50);
            assert_eq!(award.gains.endurance_xp, 100);
            assert_eq!(award.gains.vitality_xp, 5);
            assert_eq!(award.gains.discipline_xp, 0);
            assert_eq!(award.total, 155);
            assert_eq!(award.total, award.gains.total());
        }
    }

    #[test]
    fn test_discipline_only_on_third_workout() {
        let rules = XpRules::default();
        let workout = input(MuscleGroup::FullBody, None, None);
        assert_eq!(award(&workout, 2, &rules).gains.discipline_xp, 20);
        assert_eq!(award(&workout, 3, &rules).gains.discipline_xp, 0);
        assert_eq!(award(&workout, 1, &rules).gains.discipline_xp, 0);
    }

    #[test]
    fn test_discipline_regardless_of_group() {
        let rules = XpRules::default();
        for group in [MuscleGroup::Chest, MuscleGroup::Cardio, MuscleGroup::Other("Yoga".into())] {
            assert_eq!(award(&input(group, None, None), 2, &rules).gains.discipline_xp, 20);
        }
    }

    #[test]
    fn test_base_attribute_mapping() {
        assert_eq!(base_attribute(&MuscleGroup::Cardio), Some(Attribute::Endurance));
        assert_eq!(base_attribute(&MuscleGroup::Abs), Some(Attribute::Core));
        for group in [
            MuscleGroup::Chest,
            MuscleGroup::Back,
            MuscleGroup::Shoulders,
            MuscleGroup::Biceps,
            MuscleGroup::Triceps,
        ] {
            assert_eq!(base_attribute(&group), Some(Attribute::UpperBody));
        }
        assert_eq!(base_attribute(&MuscleGroup::FullBody), None);
    }

    #[test]
    fn test_cardio_endurance_is_additive() {
        let rules = XpRules::default();
        let award = award(&input(MuscleGroup::Cardio, Some(20.0), Some(15)), 0, &rules);
        assert_eq!(award.gains.endurance_xp, 50 + 30);
        assert_eq!(award.total, 85);
    }

    #[test]
    fn test_endurance_bonus_rounds() {
        let rules = XpRules::default();
        assert_eq!(endurance_bonus(Some(12.5), Some(5), &rules), 6); // 6.25
        assert_eq!(endurance_bonus(Some(13.0), Some(5), &rules), 7); // 6.5 rounds up
        assert_eq!(endurance_bonus(Some(100.0), None, &rules), 0);
        assert_eq!(endurance_bonus(None, Some(10), &rules), 0);
        assert_eq!(endurance_bonus(Some(0.0), Some(10), &rules), 0);
    }

    #[test]
    fn test_unrecognized_group_gets_vitality_only() {
        let rules = XpRules::default();
        let award = award(&input(MuscleGroup::Other("Forearms".into()), None, None), 0, &rules);
        assert_eq!(award.total, 5);
        assert_eq!(award.gains.vitality_xp, 5);
    }

    #[test]
    fn test_huge_load_saturates_instead_of_overflowing() {
        let rules = XpRules::default();
        let workout = input(MuscleGroup::Cardio, Some(1e20), Some(1000));
        assert!(workout.validate().is_ok());

        let award = award(&workout, 2, &rules);
        assert_eq!(award.gains.endurance_xp, u64::MAX);
        assert_eq!(award.gains.discipline_xp, 20);
        assert_eq!(award.total, u64::MAX);
    }

    #[test]
    fn test_week_starts_on_sunday() {
        let sunday = NaiveDate::from_ymd_opt(2024, 3, 3).unwrap();
        let wednesday = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
        let saturday = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let next_sunday = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();

        assert_eq!(week_start(sunday), sunday);
        assert_eq!(week_start(wednesday), sunday);
        assert_eq!(week_start(saturday), sunday);
        assert_eq!(week_start(next_sunday), next_sunday);
    }
}
