//! Command structs

use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Habit reminder bot:")]
pub enum Command {
    #[command(description = "show how to link this chat to your account.")]
    Start,
    #[command(description = "show this message.")]
    Help,
}
