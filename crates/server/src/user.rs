//! Account endpoints: registration and Telegram chat linking.

use api_types::user::{ChatId, Register, Registered};
use axum::{Extension, Json, extract::State, extract::rejection::JsonRejection, http::StatusCode};
use engine::users;

use crate::{ServerError, server::ServerState};

pub async fn register(
    State(state): State<ServerState>,
    payload: Result<Json<Register>, JsonRejection>,
) -> Result<(StatusCode, Json<Registered>), ServerError> {
    let Json(payload) = payload?;
    state
        .engine
        .register_user(&payload.username, &payload.password, payload.email.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(Registered {
            username: payload.username.trim().to_string(),
        }),
    ))
}

/// Link the caller to the Telegram chat reminders are delivered to.
pub async fn set_telegram_chat_id(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    payload: Result<Json<ChatId>, JsonRejection>,
) -> Result<Json<ChatId>, ServerError> {
    let Json(payload) = payload?;
    let Some(chat_id) = payload.chat_id.filter(|id| !id.trim().is_empty()) else {
        return Err(ServerError::Generic("chat_id is required".to_string()));
    };

    state
        .engine
        .set_telegram_chat_id(&user.username, &chat_id)
        .await?;

    Ok(Json(ChatId {
        chat_id: Some(chat_id.trim().to_string()),
    }))
}
