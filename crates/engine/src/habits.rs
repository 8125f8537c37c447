//! The module contains the `Habit` struct, the submission types used to build
//! it and the `habits` table entity.

use std::fmt;

use chrono::NaiveTime;
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::validation::{
    HabitRule, MAX_DURATION, MAX_FREQUENCY, MIN_DURATION, MIN_FREQUENCY,
};

pub const DEFAULT_FREQUENCY: i32 = 1;

/// A habit.
///
/// "Perform `action` at `time` in `place`, at least once every `frequency`
/// days, for `duration` seconds". A regular habit is rewarded either with a
/// free-text `reward` or by a pleasant `related_habit_id`, never both.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Habit {
    /// Stable identifier. UUID v7, so sorting by id follows creation order.
    pub id: Uuid,
    /// Owner username.
    pub user_id: String,
    pub place: String,
    pub time: NaiveTime,
    pub action: String,
    pub is_pleasant: bool,
    /// Weak reference to a pleasant habit of the same owner.
    ///
    /// Cleared when the referenced habit is deleted.
    pub related_habit_id: Option<Uuid>,
    /// Perform at least once every `frequency` days.
    pub frequency: i32,
    /// Empty when there is no reward.
    pub reward: String,
    /// Seconds.
    pub duration: i32,
    pub is_public: bool,
}

impl Habit {
    pub fn new(user_id: &str, draft: HabitDraft) -> Self {
        Self::with_id(Uuid::now_v7(), user_id, draft)
    }

    pub fn with_id(id: Uuid, user_id: &str, draft: HabitDraft) -> Self {
        Self {
            id,
            user_id: user_id.to_string(),
            place: draft.place,
            time: draft.time,
            action: draft.action,
            is_pleasant: draft.is_pleasant,
            related_habit_id: draft.related_habit_id,
            frequency: draft.frequency,
            reward: draft.reward,
            duration: draft.duration,
            is_public: draft.is_public,
        }
    }

    /// Overwrite every field present in `patch`.
    pub fn apply(&mut self, patch: HabitPatch) {
        if let Some(place) = patch.place {
            self.place = place;
        }
        if let Some(time) = patch.time {
            self.time = time;
        }
        if let Some(action) = patch.action {
            self.action = action;
        }
        if let Some(is_pleasant) = patch.is_pleasant {
            self.is_pleasant = is_pleasant;
        }
        if let Some(related_habit_id) = patch.related_habit_id {
            self.related_habit_id = related_habit_id;
        }
        if let Some(frequency) = patch.frequency {
            self.frequency = frequency;
        }
        if let Some(reward) = patch.reward {
            self.reward = reward;
        }
        if let Some(duration) = patch.duration {
            self.duration = duration;
        }
        if let Some(is_public) = patch.is_public {
            self.is_public = is_public;
        }
    }
}

impl fmt::Display for Habit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {} in {}",
            self.action,
            self.time.format("%H:%M:%S"),
            self.place
        )
    }
}

/// Full set of client-editable fields, used for create and full update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HabitDraft {
    pub place: String,
    pub time: NaiveTime,
    pub action: String,
    pub is_pleasant: bool,
    pub related_habit_id: Option<Uuid>,
    pub frequency: i32,
    pub reward: String,
    pub duration: i32,
    pub is_public: bool,
}

impl HabitDraft {
    /// A draft with the required fields set and every other field defaulted.
    pub fn new(place: &str, time: NaiveTime, action: &str, duration: i32) -> Self {
        Self {
            place: place.to_string(),
            time,
            action: action.to_string(),
            is_pleasant: false,
            related_habit_id: None,
            frequency: DEFAULT_FREQUENCY,
            reward: String::new(),
            duration,
            is_public: false,
        }
    }
}

/// Partial update. `related_habit_id: Some(None)` clears the relation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HabitPatch {
    pub place: Option<String>,
    pub time: Option<NaiveTime>,
    pub action: Option<String>,
    pub is_pleasant: Option<bool>,
    pub related_habit_id: Option<Option<Uuid>>,
    pub frequency: Option<i32>,
    pub reward: Option<String>,
    pub duration: Option<i32>,
    pub is_public: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "habits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub place: String,
    pub time: NaiveTime,
    pub action: String,
    pub is_pleasant: bool,
    pub related_habit_id: Option<Uuid>,
    pub frequency: i32,
    pub reward: String,
    pub duration: i32,
    pub is_public: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Username",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::RelatedHabitId",
        to = "Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    RelatedHabit,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

fn known<V: Into<Value>>(value: &ActiveValue<V>) -> Option<&V> {
    match value {
        ActiveValue::Set(v) | ActiveValue::Unchanged(v) => Some(v),
        ActiveValue::NotSet => None,
    }
}

impl ActiveModel {
    /// First rule broken by the fields this model carries.
    ///
    /// The relation rule needs a second lookup and is only checked by the
    /// engine operations.
    fn storage_violation(&self) -> Option<HabitRule> {
        let has_reward = known(&self.reward).is_some_and(|reward| !reward.is_empty());
        let has_related = known(&self.related_habit_id).is_some_and(Option::is_some);
        let is_pleasant = known(&self.is_pleasant).copied().unwrap_or(false);

        if has_reward && has_related {
            return Some(HabitRule::RewardWithRelated);
        }
        if is_pleasant && (has_reward || has_related) {
            return Some(HabitRule::PleasantWithExtras);
        }
        if known(&self.frequency)
            .is_some_and(|frequency| !(MIN_FREQUENCY..=MAX_FREQUENCY).contains(frequency))
        {
            return Some(HabitRule::FrequencyOutOfRange);
        }
        if known(&self.duration)
            .is_some_and(|duration| !(MIN_DURATION..=MAX_DURATION).contains(duration))
        {
            return Some(HabitRule::DurationOutOfRange);
        }
        None
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if let Some(rule) = self.storage_violation() {
            return Err(DbErr::Custom(rule.message().to_string()));
        }
        Ok(self)
    }
}

impl From<Model> for Habit {
    fn from(value: Model) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            place: value.place,
            time: value.time,
            action: value.action,
            is_pleasant: value.is_pleasant,
            related_habit_id: value.related_habit_id,
            frequency: value.frequency,
            reward: value.reward,
            duration: value.duration,
            is_public: value.is_public,
        }
    }
}

impl From<&Habit> for ActiveModel {
    fn from(value: &Habit) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            user_id: ActiveValue::Set(value.user_id.clone()),
            place: ActiveValue::Set(value.place.clone()),
            time: ActiveValue::Set(value.time),
            action: ActiveValue::Set(value.action.clone()),
            is_pleasant: ActiveValue::Set(value.is_pleasant),
            related_habit_id: ActiveValue::Set(value.related_habit_id),
            frequency: ActiveValue::Set(value.frequency),
            reward: ActiveValue::Set(value.reward.clone()),
            duration: ActiveValue::Set(value.duration),
            is_public: ActiveValue::Set(value.is_public),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn habit() -> Habit {
        Habit::new(
            "alice",
            HabitDraft::new(
                "Home",
                NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
                "Read a book",
                60,
            ),
        )
    }

    #[test]
    fn display() {
        assert_eq!(habit().to_string(), "Read a book at 12:00:00 in Home");
    }

    #[test]
    fn draft_defaults() {
        let habit = habit();
        assert_eq!(habit.frequency, 1);
        assert!(habit.reward.is_empty());
        assert!(!habit.is_pleasant);
        assert!(!habit.is_public);
        assert_eq!(habit.related_habit_id, None);
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let mut habit = habit();
        habit.related_habit_id = Some(Uuid::now_v7());
        habit.apply(HabitPatch {
            place: Some("Park".to_string()),
            related_habit_id: Some(None),
            ..Default::default()
        });
        assert_eq!(habit.place, "Park");
        assert_eq!(habit.action, "Read a book");
        assert_eq!(habit.related_habit_id, None);
    }

    #[test]
    fn storage_guard_checks_known_fields() {
        let mut model = ActiveModel::from(&habit());
        assert_eq!(model.storage_violation(), None);

        model.reward = ActiveValue::Set("Cookie".to_string());
        model.related_habit_id = ActiveValue::Set(Some(Uuid::now_v7()));
        assert_eq!(
            model.storage_violation(),
            Some(HabitRule::RewardWithRelated)
        );

        let partial = ActiveModel {
            frequency: ActiveValue::Set(8),
            ..Default::default()
        };
        assert_eq!(
            partial.storage_violation(),
            Some(HabitRule::FrequencyOutOfRange)
        );
    }
}
