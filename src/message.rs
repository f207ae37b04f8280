use url::Url;

/// Short identifiers bound to inline buttons.
///
/// Answer tokens carry no position data; the session cursor decides which
/// question an answer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Begin,
    Yes,
    No,
}

impl Choice {
    pub fn token(&self) -> &'static str {
        match self {
            Choice::Begin => "begin",
            Choice::Yes => "yes",
            Choice::No => "no",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "begin" => Some(Choice::Begin),
            "yes" => Some(Choice::Yes),
            "no" => Some(Choice::No),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlAction {
    Token(Choice),
    Link(Url),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    label: String,
    action: ControlAction,
}

impl Control {
    pub fn token(label: impl Into<String>, choice: Choice) -> Self {
        Self {
            label: label.into(),
            action: ControlAction::Token(choice),
        }
    }

    pub fn link(label: impl Into<String>, url: Url) -> Self {
        Self {
            label: label.into(),
            action: ControlAction::Link(url),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn action(&self) -> &ControlAction {
        &self.action
    }
}

/// Rows of buttons attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Controls {
    rows: Vec<Vec<Control>>,
}

impl Controls {
    pub fn new(rows: Vec<Vec<Control>>) -> Self {
        Self { rows }
    }

    pub fn single(control: Control) -> Self {
        Self::new(vec![vec![control]])
    }

    pub fn rows(&self) -> &[Vec<Control>] {
        &self.rows
    }

    #[cfg(test)]
    pub(crate) fn tokens(&self) -> Vec<&'static str> {
        self.rows
            .iter()
            .flatten()
            .filter_map(|control| match control.action() {
                ControlAction::Token(choice) => Some(choice.token()),
                ControlAction::Link(_) => None,
            })
            .collect()
    }
}

pub fn begin_controls() -> Controls {
    Controls::single(Control::token("Start the test", Choice::Begin))
}

pub fn answer_controls() -> Controls {
    Controls::new(vec![vec![
        Control::token("✅ Yes", Choice::Yes),
        Control::token("❌ No", Choice::No),
    ]])
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    Text {
        text: String,
        controls: Option<Controls>,
    },
    Image {
        url: Url,
        caption: String,
        controls: Option<Controls>,
    },
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        OutboundMessage::Text {
            text: text.into(),
            controls: None,
        }
    }

    pub fn with_controls(self, new_controls: Controls) -> Self {
        match self {
            OutboundMessage::Text { text, .. } => OutboundMessage::Text {
                text,
                controls: Some(new_controls),
            },
            OutboundMessage::Image { url, caption, .. } => OutboundMessage::Image {
                url,
                caption,
                controls: Some(new_controls),
            },
        }
    }

    #[cfg(test)]
    pub(crate) fn controls(&self) -> Option<&Controls> {
        match self {
            OutboundMessage::Text { controls, .. } | OutboundMessage::Image { controls, .. } => {
                controls.as_ref()
            }
        }
    }
}
