use std::sync::Arc;

use chrono::Utc;
use teloxide::types::{ChatId, Recipient};
use tracing::instrument;
use url::Url;

use crate::{
    database::connection::LoginLog,
    message::{answer_controls, begin_controls, Choice, Control, Controls, OutboundMessage},
    quiz::{compute_verdict, QUESTIONS, QUIZ_INTRO, QUIZ_TITLE},
    state::{Session, SessionStore},
    transport::{Notify, Transport},
};

pub const WELCOME: &str = "Welcome! Press the button below to start the test.";

/// Extra content sent after the verdict, in configured order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionAction {
    Image {
        url: Url,
        caption: String,
        /// Label and target of an optional link button under the photo.
        link: Option<(String, Url)>,
    },
    Link {
        text: String,
        label: String,
        url: Url,
    },
}

impl CompletionAction {
    fn message(&self) -> OutboundMessage {
        match self {
            CompletionAction::Image { url, caption, link } => OutboundMessage::Image {
                url: url.clone(),
                caption: caption.clone(),
                controls: link
                    .as_ref()
                    .map(|(label, url)| Controls::single(Control::link(label, url.clone()))),
            },
            CompletionAction::Link { text, label, url } => OutboundMessage::text(text.as_str())
                .with_controls(Controls::single(Control::link(label, url.clone()))),
        }
    }
}

/// Events handed over by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    CommandStart {
        chat_id: ChatId,
        display_name: Option<String>,
    },
    ButtonPress {
        chat_id: ChatId,
        token: String,
        display_name: Option<String>,
    },
    /// The bot was added to a chat.
    Joined { chat_id: ChatId },
}

struct Notification {
    notifier: Arc<dyn Notify>,
    recipients: Vec<Recipient>,
}

/// Drives the questionnaire for every conversation.
///
/// No operation returns an error: failed sends are logged and the remaining
/// steps still run.
pub struct QuizEngine {
    sessions: SessionStore,
    transport: Arc<dyn Transport>,
    completion_actions: Vec<CompletionAction>,
    notification: Option<Notification>,
    login_log: Option<Arc<dyn LoginLog>>,
}

impl QuizEngine {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            sessions: SessionStore::new(),
            transport,
            completion_actions: Vec::new(),
            notification: None,
            login_log: None,
        }
    }

    pub fn with_completion_actions(mut self, actions: Vec<CompletionAction>) -> Self {
        self.completion_actions = actions;
        self
    }

    pub fn with_notifier(
        mut self,
        notifier: Arc<dyn Notify>,
        recipients: Vec<Recipient>,
    ) -> Self {
        self.notification = Some(Notification {
            notifier,
            recipients,
        });
        self
    }

    pub fn with_login_log(mut self, login_log: Arc<dyn LoginLog>) -> Self {
        self.login_log = Some(login_log);
        self
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub async fn handle(&self, event: Inbound) {
        match event {
            Inbound::CommandStart {
                chat_id,
                display_name,
            } => self.start_quiz(chat_id, display_name).await,
            Inbound::ButtonPress {
                chat_id,
                token,
                display_name,
            } => match Choice::from_token(&token) {
                Some(Choice::Begin) => self.start_quiz(chat_id, display_name).await,
                Some(Choice::Yes) => self.submit_answer(chat_id, true).await,
                Some(Choice::No) => self.submit_answer(chat_id, false).await,
                None => log::debug!("{}: ignoring unknown token '{}'", chat_id.0, token),
            },
            Inbound::Joined { chat_id } => self.greet(chat_id).await,
        }
    }

    #[instrument(level = "info", skip(self))]
    pub async fn greet(&self, chat_id: ChatId) {
        let welcome = OutboundMessage::text(WELCOME).with_controls(begin_controls());
        self.deliver(chat_id, &welcome, "welcome").await;
    }

    /// Starts the quiz over from the first question, dropping any progress.
    #[instrument(level = "info", skip(self))]
    pub async fn start_quiz(&self, chat_id: ChatId, display_name: Option<String>) {
        let _gate = self.sessions.lock(chat_id).await;

        let session = self.sessions.create(chat_id, display_name);
        log::info!(
            "{}: starting quiz for {}",
            chat_id.0,
            session.display_name().unwrap_or("<unknown>")
        );

        // Fire and forget, the chat does not wait on the database.
        if let (Some(login_log), Some(login)) = (&self.login_log, session.display_name()) {
            let login_log = login_log.clone();
            let login = login.to_owned();
            tokio::spawn(async move {
                if let Err(e) = login_log.record_login(&login, Utc::now()).await {
                    log::error!("Failed to record login of {}: {:?}", login, e);
                }
            });
        }

        let intro = OutboundMessage::text(format!("Test \"{}\"\n{}", QUIZ_TITLE, QUIZ_INTRO));
        self.deliver(chat_id, &intro, "intro").await;

        if let Some(prompt) = Self::render_prompt(session.cursor()) {
            self.deliver(chat_id, &prompt, "question").await;
        }
    }

    /// Records an answer for the current question. Input without a running
    /// quiz is dropped silently.
    #[instrument(level = "info", skip(self))]
    pub async fn submit_answer(&self, chat_id: ChatId, is_yes: bool) {
        let _gate = self.sessions.lock(chat_id).await;

        let Some(session) = self.sessions.record_answer(chat_id, is_yes) else {
            log::debug!("{}: no quiz in progress, answer dropped", chat_id.0);
            return;
        };

        if session.is_complete() {
            self.finish(session).await;
        } else if let Some(prompt) = Self::render_prompt(session.cursor()) {
            self.deliver(chat_id, &prompt, "question").await;
        }
    }

    /// The message asking question `cursor` (0-based), or `None` past the end.
    pub fn render_prompt(cursor: usize) -> Option<OutboundMessage> {
        let question = QUESTIONS.get(cursor)?;
        Some(
            OutboundMessage::text(format!("Question {}: {}", cursor + 1, question))
                .with_controls(answer_controls()),
        )
    }

    async fn finish(&self, session: Session) {
        let chat_id = session.chat_id();
        let verdict = compute_verdict(session.answers());
        log::info!(
            "{}: {} completed the quiz, verdict {:?}",
            chat_id.0,
            session.display_name().unwrap_or("<unknown>"),
            verdict
        );

        self.deliver(chat_id, &OutboundMessage::text(verdict.message()), "verdict")
            .await;

        for action in &self.completion_actions {
            self.deliver(chat_id, &action.message(), "completion content")
                .await;
        }

        if let Some(notification) = &self.notification {
            let who = session
                .display_name()
                .map(str::to_owned)
                .unwrap_or_else(|| format!("Chat {}", chat_id.0));
            let text = format!("{} completed the quiz: {}", who, verdict);

            for recipient in &notification.recipients {
                if let Err(e) = notification.notifier.notify(recipient, &text).await {
                    log::error!("Failed to notify {:?}: {:?}", recipient, e);
                }
            }
        }

        self.sessions.delete(chat_id);
    }

    async fn deliver(&self, chat_id: ChatId, message: &OutboundMessage, what: &str) {
        let sent = match message {
            OutboundMessage::Text { text, controls } => {
                self.transport
                    .send_text(chat_id, text, controls.as_ref())
                    .await
            }
            OutboundMessage::Image {
                url,
                caption,
                controls,
            } => {
                self.transport
                    .send_image(chat_id, url, caption, controls.as_ref())
                    .await
            }
        };

        if let Err(e) = sent {
            log::error!("{}: failed to send {}: {:?}", chat_id.0, what, e);
        }
    }
}
