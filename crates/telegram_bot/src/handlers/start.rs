//! Handler for the /start and /help commands

use teloxide::{
    RequestError,
    dispatching::{HandlerExt, UpdateHandler},
    prelude::*,
    utils::command::BotCommands,
};

use crate::commands::Command;

/// Build the schema for `Command` commands
pub fn schema() -> UpdateHandler<RequestError> {
    Update::filter_message()
        .filter_command::<Command>()
        .endpoint(handle_command)
}

/// Reply sent to `/start`.
pub(crate) fn link_instructions(chat_id: ChatId) -> String {
    format!(
        "Your chat id is {chat_id}.\n\
         To receive habit reminders here, link it to your account with\n\
         POST /set-telegram-chat-id {{\"chat_id\": \"{chat_id}\"}}"
    )
}

async fn handle_command(bot: Bot, msg: Message, cmd: Command) -> ResponseResult<()> {
    match cmd {
        Command::Start => {
            tracing::debug!("start requested from chat {}", msg.chat.id);
            bot.send_message(msg.chat.id, link_instructions(msg.chat.id))
                .await?;
        }
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instructions_carry_the_chat_id() {
        let text = link_instructions(ChatId(42));
        assert!(text.contains("Your chat id is 42."));
        assert!(text.contains(r#"{"chat_id": "42"}"#));
    }
}
