use sea_orm::{
    ActiveModelTrait, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    EngineError, Habit, HabitDraft, HabitPatch, ResultEngine, ValidationErrors, habits,
    validation::{self, HabitRule},
};

use super::{Engine, with_tx};

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

/// 1-based page selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl PageRequest {
    /// Build a request from optional query values, clamping to sane bounds.
    pub fn new(page: Option<u64>, page_size: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<T> {
    /// Total items across all pages.
    pub count: u64,
    pub page: u64,
    pub page_size: u64,
    pub results: Vec<T>,
}

impl Engine {
    /// Create a new habit owned by `user_id`.
    pub async fn create_habit(&self, user_id: &str, draft: HabitDraft) -> ResultEngine<Habit> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let habit = Habit::new(user_id, draft);
            self.check_candidate(&db_tx, &habit, None).await?;
            habits::ActiveModel::from(&habit).insert(&db_tx).await?;
            tracing::debug!("created habit {} for {user_id}", habit.id);
            Ok(habit)
        })
    }

    /// Return one of the caller's habits.
    pub async fn habit(&self, habit_id: Uuid, user_id: &str) -> ResultEngine<Habit> {
        let model = self
            .require_habit_owned(&self.database, habit_id, user_id, "habit")
            .await?;
        Ok(model.into())
    }

    /// List the caller's habits in creation order.
    pub async fn list_habits(&self, user_id: &str, page: PageRequest) -> ResultEngine<Page<Habit>> {
        let query = habits::Entity::find()
            .filter(habits::Column::UserId.eq(user_id))
            .order_by_asc(habits::Column::Id);
        self.fetch_page(query, page).await
    }

    /// List every public habit, whoever owns it.
    pub async fn public_habits(&self, page: PageRequest) -> ResultEngine<Page<Habit>> {
        let query = habits::Entity::find()
            .filter(habits::Column::IsPublic.eq(true))
            .order_by_asc(habits::Column::Id);
        self.fetch_page(query, page).await
    }

    /// Replace every editable field of a habit.
    pub async fn update_habit(
        &self,
        habit_id: Uuid,
        user_id: &str,
        draft: HabitDraft,
    ) -> ResultEngine<Habit> {
        with_tx!(self, |db_tx| {
            let existing: Habit = self
                .require_habit_owned(&db_tx, habit_id, user_id, "habit")
                .await?
                .into();
            let candidate = Habit::with_id(habit_id, user_id, draft);
            self.save_existing(&db_tx, &existing, candidate).await
        })
    }

    /// Change only the fields present in `patch`; the merged habit is
    /// validated as a whole.
    pub async fn patch_habit(
        &self,
        habit_id: Uuid,
        user_id: &str,
        patch: HabitPatch,
    ) -> ResultEngine<Habit> {
        with_tx!(self, |db_tx| {
            let existing: Habit = self
                .require_habit_owned(&db_tx, habit_id, user_id, "habit")
                .await?
                .into();
            let mut candidate = existing.clone();
            candidate.apply(patch);
            self.save_existing(&db_tx, &existing, candidate).await
        })
    }

    /// Delete a habit.
    ///
    /// Habits using it as their related habit lose the relation; they are
    /// not deleted.
    pub async fn delete_habit(&self, habit_id: Uuid, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_habit_owned(&db_tx, habit_id, user_id, "habit")
                .await?;

            let cleared = habits::Entity::update_many()
                .col_expr(
                    habits::Column::RelatedHabitId,
                    Expr::value(Option::<Uuid>::None),
                )
                .filter(habits::Column::RelatedHabitId.eq(habit_id))
                .exec(&db_tx)
                .await?;
            habits::Entity::delete_by_id(habit_id).exec(&db_tx).await?;

            tracing::debug!(
                "deleted habit {habit_id}, cleared {} related references",
                cleared.rows_affected
            );
            Ok(())
        })
    }

    async fn save_existing(
        &self,
        db_tx: &DatabaseTransaction,
        existing: &Habit,
        candidate: Habit,
    ) -> ResultEngine<Habit> {
        self.check_candidate(db_tx, &candidate, Some(existing))
            .await?;
        habits::ActiveModel::from(&candidate).update(db_tx).await?;
        Ok(candidate)
    }

    /// Run every boundary rule against `candidate`.
    ///
    /// The related habit must exist and belong to the same owner. `existing`
    /// is the stored version when updating.
    async fn check_candidate(
        &self,
        db_tx: &DatabaseTransaction,
        candidate: &Habit,
        existing: Option<&Habit>,
    ) -> ResultEngine<()> {
        let related: Option<Habit> = match candidate.related_habit_id {
            Some(related_id) if related_id != candidate.id => Some(
                self.require_habit_owned(db_tx, related_id, &candidate.user_id, "related habit")
                    .await?
                    .into(),
            ),
            _ => None,
        };

        let result = validation::validate_habit(candidate, related.as_ref());

        let demoted = existing.is_some_and(|existing| existing.is_pleasant && !candidate.is_pleasant);
        if !demoted || !self.is_related_target(db_tx, candidate.id).await? {
            return result;
        }

        let mut errors = match result {
            Ok(()) => ValidationErrors::default(),
            Err(EngineError::Validation(errors)) => errors,
            Err(err) => return Err(err),
        };
        errors.push(HabitRule::StillReferenced.message());
        errors.into_result()
    }

    async fn fetch_page(
        &self,
        query: Select<habits::Entity>,
        page: PageRequest,
    ) -> ResultEngine<Page<Habit>> {
        let paginator = query.paginate(&self.database, page.page_size);
        let count = paginator.num_items().await?;
        let results = paginator
            .fetch_page(page.page.saturating_sub(1))
            .await?
            .into_iter()
            .map(Habit::from)
            .collect();

        Ok(Page {
            count,
            page: page.page,
            page_size: page.page_size,
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_defaults_and_clamps() {
        assert_eq!(
            PageRequest::default(),
            PageRequest {
                page: 1,
                page_size: DEFAULT_PAGE_SIZE
            }
        );
        assert_eq!(
            PageRequest::new(Some(0), Some(1000)),
            PageRequest {
                page: 1,
                page_size: MAX_PAGE_SIZE
            }
        );
        assert_eq!(PageRequest::new(Some(3), Some(0)).page_size, 1);
    }
}
