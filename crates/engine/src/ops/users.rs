use sea_orm::{ActiveValue, TransactionTrait, prelude::*};

use crate::{
    EngineError, ResultEngine,
    password::{hash_password, verify_password},
    users,
};

use super::{Engine, normalize_optional_text, normalize_required_text, with_tx};

impl Engine {
    /// Register a new user. The password is stored hashed.
    pub async fn register_user(
        &self,
        username: &str,
        password: &str,
        email: Option<&str>,
    ) -> ResultEngine<()> {
        let username = normalize_required_text(username, "username")?;
        if password.is_empty() {
            return Err(EngineError::InvalidInput(
                "password must not be empty".to_string(),
            ));
        }

        let password = hash_password(password)?;

        with_tx!(self, |db_tx| {
            let exists = users::Entity::find_by_id(username.clone())
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(username));
            }

            users::ActiveModel {
                username: ActiveValue::Set(username.clone()),
                password: ActiveValue::Set(password),
                email: ActiveValue::Set(normalize_optional_text(email)),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!("registered user {username}");
            Ok(())
        })
    }

    /// Check a username/password pair. `None` when they do not match.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> ResultEngine<Option<users::Model>> {
        let user = users::Entity::find_by_id(username.to_string())
            .one(&self.database)
            .await?;
        Ok(user.filter(|user| verify_password(password, &user.password)))
    }
}
