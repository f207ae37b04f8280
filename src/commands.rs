use std::sync::Arc;

use teloxide::{
    prelude::Requester,
    types::{Message, User},
    utils::command::BotCommands,
    Bot,
};

use crate::{
    runner::{Inbound, QuizEngine},
    HandlerResult,
};

#[derive(Debug, Clone, BotCommands)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "display help.")]
    Help,
    #[command(description = "start the test.")]
    Start,
}

/// The participant's username, or their first name when they have none.
pub(crate) fn user_display_name(user: &User) -> String {
    user.username
        .clone()
        .unwrap_or_else(|| user.first_name.clone())
}

pub(crate) async fn help(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;
    Ok(())
}

/// In groups the chat is shared, so the name comes from the sender.
fn start_event(msg: &Message) -> Inbound {
    Inbound::CommandStart {
        chat_id: msg.chat.id,
        display_name: msg.from.as_ref().map(user_display_name),
    }
}

pub(crate) async fn start(msg: Message, engine: Arc<QuizEngine>) -> HandlerResult {
    engine.handle(start_event(&msg)).await;
    Ok(())
}
