//! Level curve over cumulative XP.
//!
//! `level(xp) = floor((xp / divisor) ^ exponent) + 1`, with the standard
//! rules using a divisor of 100 and an exponent of 0.7.

use crate::XpRules;

/// How a mutation moved the avatar's level
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelChange {
    Up { from: u32, to: u32 },
    Down { from: u32, to: u32 },
    Unchanged(u32),
}

impl LevelChange {
    pub fn between(from: u32, to: u32) -> Self {
        match to.cmp(&from) {
            std::cmp::Ordering::Greater => LevelChange::Up { from, to },
            std::cmp::Ordering::Less => LevelChange::Down { from, to },
            std::cmp::Ordering::Equal => LevelChange::Unchanged(to),
        }
    }
}

/// Level reached with `xp` cumulative XP
pub fn level_for_xp(xp: u64, rules: &XpRules) -> u32 {
    let scaled = (xp as f64 / rules.level_divisor).powf(rules.level_exponent);
    let floor = scaled.floor();
    if !floor.is_finite() || floor >= f64::from(u32::MAX - 1) {
        return u32::MAX;
    }
    floor as u32 + 1
}

/// Minimum cumulative XP at which `level` is reached
///
/// Returns `u64::MAX` when no representable XP total reaches `level`.
pub fn xp_for_level(level: u32, rules: &XpRules) -> u64 {
    if level <= 1 {
        return 0;
    }
    if level_for_xp(u64::MAX, rules) < level {
        return u64::MAX;
    }

    // Smallest xp with level_for_xp(xp) >= level; the curve is monotonic
    let (mut lo, mut hi) = (0u64, u64::MAX);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if level_for_xp(mid, rules) >= level {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    lo
}

/// Position inside the current level
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelProgress {
    pub level: u32,
    /// XP earned since reaching `level`
    pub into_level: u64,
    /// XP between `level` and the next one
    pub level_span: u64,
}

pub fn progress(total_xp: u64, rules: &XpRules) -> LevelProgress {
    let level = level_for_xp(total_xp, rules);
    let floor = xp_for_level(level, rules);
    let next = xp_for_level(level.saturating_add(1), rules);
    LevelProgress {
        level,
        into_level: total_xp.saturating_sub(floor),
        level_span: next.saturating_sub(floor),
    }
}
