//! Habit consistency rules.
//!
//! Everything here is pure: no database access, no mutation. The operations in
//! `ops` resolve the related habit first and then hand both records to
//! [`validate_habit`].

use crate::{Habit, ResultEngine, ValidationErrors};

pub const MAX_PLACE_LEN: usize = 100;
pub const MAX_ACTION_LEN: usize = 255;
pub const MAX_REWARD_LEN: usize = 255;
pub const MIN_FREQUENCY: i32 = 1;
pub const MAX_FREQUENCY: i32 = 7;
pub const MIN_DURATION: i32 = 1;
pub const MAX_DURATION: i32 = 120;

/// A single consistency rule a habit can break.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HabitRule {
    RewardWithRelated,
    PleasantWithExtras,
    RelatedNotPleasant,
    SelfRelated,
    FrequencyOutOfRange,
    DurationOutOfRange,
    EmptyPlace,
    PlaceTooLong,
    EmptyAction,
    ActionTooLong,
    RewardTooLong,
    StillReferenced,
}

impl HabitRule {
    pub fn message(self) -> &'static str {
        match self {
            Self::RewardWithRelated => "cannot have both a reward and a related habit",
            Self::PleasantWithExtras => "pleasant habits cannot have a reward or a related habit",
            Self::RelatedNotPleasant => "related habit must be a pleasant habit",
            Self::SelfRelated => "a habit cannot be related to itself",
            Self::FrequencyOutOfRange => {
                "frequency must be between 1 and 7: a habit cannot be performed less often than once every 7 days"
            }
            Self::DurationOutOfRange => "duration must be between 1 and 120 seconds",
            Self::EmptyPlace => "place must not be empty",
            Self::PlaceTooLong => "place must be at most 100 characters",
            Self::EmptyAction => "action must not be empty",
            Self::ActionTooLong => "action must be at most 255 characters",
            Self::RewardTooLong => "reward must be at most 255 characters",
            Self::StillReferenced => {
                "habit is the related habit of other habits and must stay pleasant"
            }
        }
    }
}

/// Rules that only need the habit's own fields.
///
/// This is the set re-checked by the storage guard before every write.
pub fn field_violations(habit: &Habit) -> Vec<HabitRule> {
    let mut violations = Vec::new();
    let has_reward = !habit.reward.is_empty();
    let has_related = habit.related_habit_id.is_some();

    if has_reward && has_related {
        violations.push(HabitRule::RewardWithRelated);
    }
    if habit.is_pleasant && (has_reward || has_related) {
        violations.push(HabitRule::PleasantWithExtras);
    }
    if !(MIN_FREQUENCY..=MAX_FREQUENCY).contains(&habit.frequency) {
        violations.push(HabitRule::FrequencyOutOfRange);
    }
    if !(MIN_DURATION..=MAX_DURATION).contains(&habit.duration) {
        violations.push(HabitRule::DurationOutOfRange);
    }

    if habit.place.trim().is_empty() {
        violations.push(HabitRule::EmptyPlace);
    } else if habit.place.chars().count() > MAX_PLACE_LEN {
        violations.push(HabitRule::PlaceTooLong);
    }
    if habit.action.trim().is_empty() {
        violations.push(HabitRule::EmptyAction);
    } else if habit.action.chars().count() > MAX_ACTION_LEN {
        violations.push(HabitRule::ActionTooLong);
    }
    if habit.reward.chars().count() > MAX_REWARD_LEN {
        violations.push(HabitRule::RewardTooLong);
    }

    violations
}

/// Rules involving the resolved related habit.
///
/// `related` must be the record `habit.related_habit_id` points to. A habit
/// pointing at itself is rejected whatever its pleasant flag says.
pub fn relation_violations(habit: &Habit, related: Option<&Habit>) -> Vec<HabitRule> {
    let Some(related_id) = habit.related_habit_id else {
        return Vec::new();
    };
    if related_id == habit.id {
        return vec![HabitRule::SelfRelated];
    }
    match related {
        Some(related) if related.is_pleasant => Vec::new(),
        _ => vec![HabitRule::RelatedNotPleasant],
    }
}

/// Every rule `habit` breaks, given its resolved related habit.
pub fn violations(habit: &Habit, related: Option<&Habit>) -> Vec<HabitRule> {
    let mut rules = field_violations(habit);
    rules.extend(relation_violations(habit, related));
    rules
}

/// Turn a list of broken rules into the engine's validation error.
fn reject(rules: Vec<HabitRule>) -> ResultEngine<()> {
    let mut errors = ValidationErrors::default();
    for rule in rules {
        errors.push(rule.message());
    }
    errors.into_result()
}

/// Validate a candidate habit at the submission boundary.
///
/// Evaluates every rule and reports all of them together.
pub fn validate_habit(habit: &Habit, related: Option<&Habit>) -> ResultEngine<()> {
    reject(violations(habit, related))
}
