//! XP reconciliation for workout log create, edit and delete.
//!
//! Every operation keeps the trainee's avatar in step with their log history:
//!
//! 1. **Create**: award XP for the new workout and add it to the avatar
//! 2. **Edit**: reverse the log's stored award (clamped at zero per field),
//!    then apply the freshly computed one
//! 3. **Delete**: subtract only the log's `xp_awarded` from `total_xp`
//!
//! Delete intentionally leaves the attribute fields alone, so the sum of
//! attribute XP can drift above `total_xp`. See [`crate::consistency`].

use crate::level::{level_for_xp, LevelChange};
use crate::rules::{award, week_start, XpAward};
use crate::store::{AvatarStore, WeeklyCounter, WorkoutLogStore};
use crate::{
    Attribute, Context, Error, Result, UserAvatar, WorkoutInput, WorkoutLog, XpGains, XpRules,
};
use uuid::Uuid;

/// Result of a create or edit
#[derive(Clone, Debug)]
pub struct Outcome {
    pub log: WorkoutLog,
    pub avatar: UserAvatar,
    pub award: XpAward,
    /// Award that was reversed, for edits
    pub replaced: Option<XpAward>,
    pub level_change: LevelChange,
}

/// Result of a delete
#[derive(Clone, Debug)]
pub struct Deletion {
    pub log: WorkoutLog,
    pub avatar: UserAvatar,
    /// XP actually taken off `total_xp` after clamping
    pub xp_removed: u64,
    pub level_change: LevelChange,
}

/// Create a zero-XP avatar for a trainee
pub fn select_avatar<S>(store: &mut S, user_id: &str, archetype: &str) -> Result<UserAvatar>
where
    S: AvatarStore,
{
    if user_id.trim().is_empty() {
        return Err(Error::InvalidInput("user id is required".into()));
    }
    let avatar = store.insert_avatar(UserAvatar::new(user_id, archetype))?;
    tracing::info!("User {} selected avatar '{}'", user_id, archetype);
    Ok(avatar)
}

/// Log a new workout and credit its XP to the trainee's avatar
pub fn log_workout<S>(
    store: &mut S,
    user_id: &str,
    input: &WorkoutInput,
    ctx: &Context,
    rules: &XpRules,
) -> Result<Outcome>
where
    S: WorkoutLogStore + AvatarStore + WeeklyCounter,
{
    input.validate()?;
    let mut avatar = require_avatar(store, user_id)?;

    let weekly_count = store.weekly_count(user_id, week_start(ctx.today))?;
    let award = award(input, weekly_count, rules);

    let before = avatar.level;
    credit(&mut avatar, &award);
    avatar.level = level_for_xp(avatar.total_xp, rules);
    let level_change = LevelChange::between(before, avatar.level);

    let avatar = store.update_avatar(avatar.id, avatar)?;
    let log = store.create_log(WorkoutLog {
        id: Uuid::new_v4(),
        user_id: user_id.to_string(),
        date: input.date,
        exercise_name: input.exercise_name.trim().to_string(),
        muscle_group: input.muscle_group.clone(),
        sets: input.sets,
        reps: input.reps,
        weight: input.weight,
        xp_awarded: award.total,
        xp_gains: award.gains,
    })?;

    tracing::info!(
        "Logged {} for {}: +{} XP (total {}, level {})",
        log.exercise_name,
        user_id,
        award.total,
        avatar.total_xp,
        avatar.level
    );

    Ok(Outcome {
        log,
        avatar,
        award,
        replaced: None,
        level_change,
    })
}

/// Replace a logged workout's fields and re-reconcile its XP
pub fn edit_workout<S>(
    store: &mut S,
    log_id: Uuid,
    input: &WorkoutInput,
    ctx: &Context,
    rules: &XpRules,
) -> Result<Outcome>
where
    S: WorkoutLogStore + AvatarStore + WeeklyCounter,
{
    input.validate()?;
    let existing = store.get_log(log_id)?.ok_or(Error::LogNotFound(log_id))?;
    let mut avatar = require_avatar(store, &existing.user_id)?;

    let current_week = week_start(ctx.today);
    let mut weekly_count = store.weekly_count(&existing.user_id, current_week)?;
    if week_start(existing.date) == current_week {
        weekly_count = weekly_count.saturating_sub(1);
    }

    let old = XpAward {
        total: existing.xp_awarded,
        gains: existing.xp_gains,
    };
    let new = award(input, weekly_count, rules);

    let before = avatar.level;
    debit(&mut avatar, &old);
    credit(&mut avatar, &new);
    avatar.level = level_for_xp(avatar.total_xp, rules);
    let level_change = LevelChange::between(before, avatar.level);

    let avatar = store.update_avatar(avatar.id, avatar)?;
    let log = store.update_log(
        log_id,
        WorkoutLog {
            id: log_id,
            user_id: existing.user_id.clone(),
            date: input.date,
            exercise_name: input.exercise_name.trim().to_string(),
            muscle_group: input.muscle_group.clone(),
            sets: input.sets,
            reps: input.reps,
            weight: input.weight,
            xp_awarded: new.total,
            xp_gains: new.gains,
        },
    )?;

    tracing::info!(
        "Edited log {} for {}: {} XP -> {} XP (total {}, level {})",
        log_id,
        log.user_id,
        old.total,
        new.total,
        avatar.total_xp,
        avatar.level
    );

    Ok(Outcome {
        log,
        avatar,
        award: new,
        replaced: Some(old),
        level_change,
    })
}

/// Delete a logged workout, removing its total XP from the avatar
pub fn delete_workout<S>(store: &mut S, log_id: Uuid, rules: &XpRules) -> Result<Deletion>
where
    S: WorkoutLogStore + AvatarStore,
{
    let existing = store.get_log(log_id)?.ok_or(Error::LogNotFound(log_id))?;
    let mut avatar = require_avatar(store, &existing.user_id)?;

    let before = avatar.level;
    let xp_removed = existing.xp_awarded.min(avatar.total_xp);
    avatar.total_xp -= xp_removed;
    avatar.level = level_for_xp(avatar.total_xp, rules);
    let level_change = LevelChange::between(before, avatar.level);

    let avatar = store.update_avatar(avatar.id, avatar)?;
    store.delete_log(log_id)?;

    if existing.xp_gains.total() > 0 {
        tracing::warn!(
            "Deleted log {} for {}: attribute XP ({}) left on avatar, only total_xp reduced",
            log_id,
            existing.user_id,
            existing.xp_gains.total()
        );
    }
    tracing::info!(
        "Deleted log {} for {}: -{} XP (total {}, level {})",
        log_id,
        existing.user_id,
        xp_removed,
        avatar.total_xp,
        avatar.level
    );

    Ok(Deletion {
        log: existing,
        avatar,
        xp_removed,
        level_change,
    })
}

fn require_avatar<S: AvatarStore + ?Sized>(store: &S, user_id: &str) -> Result<UserAvatar> {
    store.find_avatar(user_id)?.ok_or_else(|| {
        tracing::warn!("No avatar for user {}, refusing to touch workout logs", user_id);
        Error::NoAvatar {
            user_id: user_id.to_string(),
        }
    })
}

fn credit(avatar: &mut UserAvatar, award: &XpAward) {
    avatar.total_xp = avatar.total_xp.saturating_add(award.total);
    let mut attributes = avatar.attributes();
    for attribute in Attribute::ALL {
        let field = attributes.get_mut(attribute);
        *field = field.saturating_add(award.gains.get(attribute));
    }
    avatar.set_attributes(attributes);
}

fn debit(avatar: &mut UserAvatar, award: &XpAward) {
    avatar.total_xp = avatar.total_xp.saturating_sub(award.total);
    let mut attributes: XpGains = avatar.attributes();
    for attribute in Attribute::ALL {
        let field = attributes.get_mut(attribute);
        *field = field.saturating_sub(award.gains.get(attribute));
    }
    avatar.set_attributes(attributes);
}
