use std::net::SocketAddr;
use std::time::Duration;

use teloxide::types::Recipient;
use thiserror::Error;
use url::Url;

use crate::{runner::CompletionAction, transport::parse_recipients};

pub const WEBHOOK_PATH: &str = "webhook";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_LINK_LABEL: &str = "Watch";
const DEFAULT_LINK_TEXT: &str = "There is more for you here:";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} should be set.")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub url: Url,
    pub address: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct NotifyConfig {
    pub token: String,
    pub recipients: Vec<Recipient>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    /// Long polling is used when absent.
    pub webhook: Option<WebhookConfig>,
    pub notify: Option<NotifyConfig>,
    pub database_url: Option<String>,
    pub completion_actions: Vec<CompletionAction>,
    pub session_idle: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Blank values count as unset.
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let token = var("TELOXIDE_TOKEN").ok_or(ConfigError::Missing("TELOXIDE_TOKEN"))?;

        let port = match var("PORT") {
            Some(port) => port.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: "PORT",
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let webhook = var("WEBHOOK_URL")
            .map(|raw| {
                let base = parse_url("WEBHOOK_URL", &raw)?;
                let url = base.join(WEBHOOK_PATH).map_err(|e| ConfigError::Invalid {
                    name: "WEBHOOK_URL",
                    reason: e.to_string(),
                })?;
                Ok(WebhookConfig {
                    url,
                    address: SocketAddr::from(([0, 0, 0, 0], port)),
                })
            })
            .transpose()?;

        let notify = match (var("NOTIFY_BOT_TOKEN"), var("NOTIFY_CHAT_IDS")) {
            (Some(token), Some(raw)) => {
                let recipients = parse_recipients(&raw).map_err(|reason| ConfigError::Invalid {
                    name: "NOTIFY_CHAT_IDS",
                    reason,
                })?;
                Some(NotifyConfig { token, recipients })
            }
            _ => None,
        };

        let session_idle = var("SESSION_IDLE_SECS")
            .map(|raw| match raw.trim().parse::<u64>() {
                Ok(0) => Err(ConfigError::Invalid {
                    name: "SESSION_IDLE_SECS",
                    reason: "must be at least 1".into(),
                }),
                Ok(secs) => Ok(Duration::from_secs(secs)),
                Err(e) => Err(ConfigError::Invalid {
                    name: "SESSION_IDLE_SECS",
                    reason: e.to_string(),
                }),
            })
            .transpose()?;

        let image = var("RESULT_IMAGE_URL")
            .map(|raw| parse_url("RESULT_IMAGE_URL", &raw))
            .transpose()?;
        let link = var("RESULT_LINK_URL")
            .map(|raw| parse_url("RESULT_LINK_URL", &raw))
            .transpose()?;
        let link_label = var("RESULT_LINK_LABEL").unwrap_or_else(|| DEFAULT_LINK_LABEL.into());

        let completion_actions = match (image, link) {
            (Some(url), link) => vec![CompletionAction::Image {
                url,
                caption: var("RESULT_IMAGE_CAPTION").unwrap_or_default(),
                link: link.map(|url| (link_label, url)),
            }],
            (None, Some(url)) => vec![CompletionAction::Link {
                text: var("RESULT_LINK_TEXT").unwrap_or_else(|| DEFAULT_LINK_TEXT.into()),
                label: link_label,
                url,
            }],
            (None, None) => Vec::new(),
        };

        Ok(Self {
            token,
            webhook,
            notify,
            database_url: var("DATABASE_URL"),
            completion_actions,
            session_idle,
        })
    }
}

fn parse_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
    raw.trim().parse::<Url>().map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}
