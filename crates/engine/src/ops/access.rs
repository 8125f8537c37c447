use sea_orm::{ConnectionTrait, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, habits, users};

use super::Engine;

impl Engine {
    /// Load a habit owned by `user_id`.
    ///
    /// A habit owned by someone else is reported exactly like a missing one.
    pub(super) async fn require_habit_owned<C: ConnectionTrait>(
        &self,
        db: &C,
        habit_id: Uuid,
        user_id: &str,
        label: &str,
    ) -> ResultEngine<habits::Model> {
        habits::Entity::find_by_id(habit_id)
            .filter(habits::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("{label} not exists")))
    }

    pub(super) async fn require_user<C: ConnectionTrait>(
        &self,
        db: &C,
        username: &str,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(username.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }

    /// Whether any habit points at `habit_id` as its related habit.
    pub(super) async fn is_related_target<C: ConnectionTrait>(
        &self,
        db: &C,
        habit_id: Uuid,
    ) -> ResultEngine<bool> {
        let count = habits::Entity::find()
            .filter(habits::Column::RelatedHabitId.eq(habit_id))
            .count(db)
            .await?;
        Ok(count > 0)
    }
}
