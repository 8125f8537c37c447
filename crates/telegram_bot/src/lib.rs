//! Telegram side of the habit tracker.
//!
//! [`TelegramChannel`] delivers reminders through the Bot API, [`Bot`] answers
//! `/start` and `/help` so users can find the chat id to link.

use teloxide::prelude::*;

pub use channel::{TelegramChannel, recipient};

mod channel;
mod commands;
mod handlers;

/// Credentials of the Telegram bot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TelegramConfig {
    pub token: String,
}

impl TelegramConfig {
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
        }
    }
}

pub struct Bot {
    token: String,
}

impl Bot {
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            token: config.token.clone(),
        }
    }

    pub fn builder() -> BotBuilder {
        BotBuilder::default()
    }

    pub async fn run(&self) {
        tracing::info!("Starting telegram bot...");

        let bot = teloxide::Bot::new(&self.token);

        Dispatcher::builder(bot, handlers::schema())
            .default_handler(|upd| async move {
                tracing::debug!("Unhandled update: {:?}", upd.id);
            })
            .error_handler(LoggingErrorHandler::with_custom_text(
                "An error has occurred in the dispatcher",
            ))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }
}

#[derive(Default, Debug)]
pub struct BotBuilder {
    config: TelegramConfig,
}

impl BotBuilder {
    pub fn token(mut self, token: &str) -> BotBuilder {
        self.config.token = token.to_string();
        self
    }

    pub fn build(self) -> Result<Bot, String> {
        tracing::info!("Initializing telegram bot...");
        if self.config.token.trim().is_empty() {
            return Err("telegram token must not be empty".to_string());
        }
        Ok(Bot::new(&self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_rejects_blank_token() {
        assert!(Bot::builder().build().is_err());
        assert!(Bot::builder().token("   ").build().is_err());
        assert!(Bot::builder().token("123456:abc").build().is_ok());
    }
}
