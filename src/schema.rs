use std::sync::Arc;

use teloxide::{
    dispatching::{dialogue::GetChatId, UpdateFilterExt, UpdateHandler},
    dptree,
    prelude::Requester,
    types::{CallbackQuery, ChatMemberUpdated, Update},
    Bot,
};
use tracing::instrument;

use crate::{
    commands::{help, start, user_display_name, Command},
    runner::{Inbound, QuizEngine},
    BoxError, HandlerResult,
};

#[instrument(level = "debug")]
pub fn schema() -> UpdateHandler<BoxError> {
    use dptree::case;

    log::debug!("Building the dispatching tree");
    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Help].endpoint(help))
        .branch(case![Command::Start].endpoint(start));

    dptree::entry()
        .branch(Update::filter_message().branch(command_handler))
        .branch(Update::filter_callback_query().endpoint(button_press))
        .branch(Update::filter_my_chat_member().endpoint(joined))
}

#[instrument(level = "info", skip(bot, engine))]
async fn button_press(bot: Bot, q: CallbackQuery, engine: Arc<QuizEngine>) -> HandlerResult {
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        log::warn!("Failed to answer callback query {}: {:?}", q.id, e);
    }

    let (Some(chat_id), Some(token)) = (q.chat_id(), q.data.clone()) else {
        return Ok(());
    };
    engine
        .handle(Inbound::ButtonPress {
            chat_id,
            token,
            display_name: Some(user_display_name(&q.from)),
        })
        .await;
    Ok(())
}

#[instrument(level = "info", skip(engine))]
async fn joined(update: ChatMemberUpdated, engine: Arc<QuizEngine>) -> HandlerResult {
    if update.new_chat_member.kind.is_member() {
        log::info!(
            "Added to chat {} ({:?})",
            update.chat.id.0,
            update.chat.title()
        );
        engine
            .handle(Inbound::Joined {
                chat_id: update.chat.id,
            })
            .await;
    }
    Ok(())
}
