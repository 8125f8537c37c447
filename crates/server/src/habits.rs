//! Habit API endpoints

use api_types::{
    habit::{Habit, HabitNew, HabitPatch},
    page::{Page, PageQuery},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use engine::{HabitDraft, PageRequest, users};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn view(habit: engine::Habit) -> Habit {
    Habit {
        id: habit.id,
        user: habit.user_id,
        place: habit.place,
        time: habit.time,
        action: habit.action,
        is_pleasant: habit.is_pleasant,
        related_habit: habit.related_habit_id,
        frequency: habit.frequency,
        reward: Some(habit.reward).filter(|reward| !reward.is_empty()),
        duration: habit.duration,
        is_public: habit.is_public,
    }
}

fn page_view(page: engine::Page<engine::Habit>) -> Page<Habit> {
    Page {
        count: page.count,
        page: page.page,
        page_size: page.page_size,
        results: page.results.into_iter().map(view).collect(),
    }
}

fn draft(payload: HabitNew) -> HabitDraft {
    HabitDraft {
        place: payload.place,
        time: payload.time,
        action: payload.action,
        is_pleasant: payload.is_pleasant,
        related_habit_id: payload.related_habit,
        frequency: payload.frequency,
        reward: payload.reward.unwrap_or_default(),
        duration: payload.duration,
        is_public: payload.is_public,
    }
}

fn patch_of(payload: HabitPatch) -> engine::HabitPatch {
    engine::HabitPatch {
        place: payload.place,
        time: payload.time,
        action: payload.action,
        is_pleasant: payload.is_pleasant,
        related_habit_id: payload.related_habit,
        frequency: payload.frequency,
        reward: payload.reward,
        duration: payload.duration,
        is_public: payload.is_public,
    }
}

fn page_request(query: PageQuery) -> PageRequest {
    PageRequest::new(query.page, query.page_size)
}

/// List the caller's habits.
pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Habit>>, ServerError> {
    let page = state
        .engine
        .list_habits(&user.username, page_request(query))
        .await?;
    Ok(Json(page_view(page)))
}

/// List public habits of every user.
pub async fn public(
    State(state): State<ServerState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Habit>>, ServerError> {
    let page = state.engine.public_habits(page_request(query)).await?;
    Ok(Json(page_view(page)))
}

pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    payload: Result<Json<HabitNew>, JsonRejection>,
) -> Result<(StatusCode, Json<Habit>), ServerError> {
    let Json(payload) = payload?;
    let habit = state
        .engine
        .create_habit(&user.username, draft(payload))
        .await?;
    Ok((StatusCode::CREATED, Json(view(habit))))
}

pub async fn get(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Habit>, ServerError> {
    let habit = state.engine.habit(id, &user.username).await?;
    Ok(Json(view(habit)))
}

pub async fn update(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<HabitNew>, JsonRejection>,
) -> Result<Json<Habit>, ServerError> {
    let Json(payload) = payload?;
    let habit = state
        .engine
        .update_habit(id, &user.username, draft(payload))
        .await?;
    Ok(Json(view(habit)))
}

pub async fn patch(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<HabitPatch>, JsonRejection>,
) -> Result<Json<Habit>, ServerError> {
    let Json(payload) = payload?;
    let habit = state
        .engine
        .patch_habit(id, &user.username, patch_of(payload))
        .await?;
    Ok(Json(view(habit)))
}

pub async fn delete(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_habit(id, &user.username).await?;
    Ok(StatusCode::NO_CONTENT)
}
