use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::message::{ControlAction, Controls};

pub(crate) fn inline_keyboard(controls: &Controls) -> InlineKeyboardMarkup {
    let keyboard: Vec<Vec<InlineKeyboardButton>> = controls
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .map(|control| match control.action() {
                    ControlAction::Token(choice) => {
                        InlineKeyboardButton::callback(control.label(), choice.token())
                    }
                    ControlAction::Link(url) => {
                        InlineKeyboardButton::url(control.label(), url.clone())
                    }
                })
                .collect()
        })
        .collect();

    InlineKeyboardMarkup::new(keyboard)
}
