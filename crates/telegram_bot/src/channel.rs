//! Reminder delivery through the Telegram Bot API.

use engine::{DispatchError, NotificationChannel};
use teloxide::{
    prelude::*,
    types::{ChatId, Recipient},
};

use crate::TelegramConfig;

/// Turn a stored destination into a Telegram recipient.
///
/// Numeric ids (negative for groups) address a chat, anything else is taken
/// as a public channel username.
pub fn recipient(destination: &str) -> Result<Recipient, DispatchError> {
    let destination = destination.trim();
    if destination.is_empty() {
        return Err(DispatchError::Channel("empty destination".to_string()));
    }
    match destination.parse::<i64>() {
        Ok(id) => Ok(Recipient::Id(ChatId(id))),
        Err(_) if destination.starts_with('@') => {
            Ok(Recipient::ChannelUsername(destination.to_string()))
        }
        Err(_) => Ok(Recipient::ChannelUsername(format!("@{destination}"))),
    }
}

#[derive(Clone)]
pub struct TelegramChannel {
    bot: Bot,
}

impl TelegramChannel {
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            bot: Bot::new(&config.token),
        }
    }
}

impl NotificationChannel for TelegramChannel {
    async fn send(&self, destination: &str, message: &str) -> Result<(), DispatchError> {
        let recipient = recipient(destination)?;
        self.bot
            .send_message(recipient, message)
            .await
            .map_err(|err| DispatchError::Channel(err.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_destination_is_a_chat() {
        assert_eq!(
            recipient("123456789").unwrap(),
            Recipient::Id(ChatId(123456789))
        );
        assert_eq!(
            recipient("-100200300").unwrap(),
            Recipient::Id(ChatId(-100200300))
        );
    }

    #[test]
    fn other_destinations_are_channels() {
        assert_eq!(
            recipient("@habits").unwrap(),
            Recipient::ChannelUsername("@habits".to_string())
        );
        assert_eq!(
            recipient("habits").unwrap(),
            Recipient::ChannelUsername("@habits".to_string())
        );
    }

    #[test]
    fn empty_destination_is_rejected() {
        assert!(recipient("  ").is_err());
    }
}
