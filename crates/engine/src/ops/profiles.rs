use sea_orm::{ActiveValue, TransactionTrait, prelude::*};

use crate::{EngineError, ResultEngine, user_profiles};

use super::{Engine, normalize_required_text, with_tx};

const MAX_CHAT_ID_LEN: usize = 100;

impl Engine {
    /// Link a Telegram chat to the user, creating the profile on first use.
    pub async fn set_telegram_chat_id(&self, user_id: &str, chat_id: &str) -> ResultEngine<()> {
        let chat_id = normalize_required_text(chat_id, "chat_id")?;
        if chat_id.chars().count() > MAX_CHAT_ID_LEN {
            return Err(EngineError::InvalidInput(format!(
                "chat_id must be at most {MAX_CHAT_ID_LEN} characters"
            )));
        }

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;

            let existing = user_profiles::Entity::find_by_id(user_id.to_string())
                .one(&db_tx)
                .await?;
            match existing {
                Some(profile) => {
                    let mut profile: user_profiles::ActiveModel = profile.into();
                    profile.telegram_chat_id = ActiveValue::Set(Some(chat_id));
                    profile.update(&db_tx).await?;
                }
                None => {
                    user_profiles::ActiveModel {
                        user_id: ActiveValue::Set(user_id.to_string()),
                        telegram_chat_id: ActiveValue::Set(Some(chat_id)),
                    }
                    .insert(&db_tx)
                    .await?;
                }
            }
            tracing::info!("linked telegram chat for {user_id}");
            Ok(())
        })
    }

    /// The user's notification profile, if one was ever created.
    pub async fn profile(&self, user_id: &str) -> ResultEngine<Option<user_profiles::Model>> {
        user_profiles::Entity::find_by_id(user_id.to_string())
            .one(&self.database)
            .await
            .map_err(Into::into)
    }
}
