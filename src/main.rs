use std::sync::Arc;
use std::time::Duration;

use dotenvy::dotenv;
use lifequizbot::{
    config::Config,
    database::connection::Connection,
    runner::QuizEngine,
    schema::schema,
    transport::{SecondaryBot, TelegramTransport},
};
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks::{self, Options};
use tracing::level_filters::LevelFilter;
use tracing_log::{AsLog, LogTracer};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

const EVICTION_SWEEP: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL").unwrap_or("error".into());
    let filter = EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("error"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_span_events(FmtSpan::ENTER)
        .log_internal_errors(true)
        .with_line_number(true)
        .with_target(false)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install the tracing subscriber: {e}");
    }

    // The handlers log through `log`; forward those records at the filter's level.
    if let Err(e) = LogTracer::builder()
        .with_max_level(LevelFilter::current().as_log())
        .init()
    {
        eprintln!("Failed to route log records into tracing: {e}");
    }

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let bot = Bot::new(&config.token);
    log::info!("Starting bot...");

    let mut engine = QuizEngine::new(Arc::new(TelegramTransport::new(bot.clone())))
        .with_completion_actions(config.completion_actions.clone());

    if let Some(notify) = &config.notify {
        log::info!("Notifying {} recipient(s) on completion", notify.recipients.len());
        engine = engine.with_notifier(
            Arc::new(SecondaryBot::new(notify.token.clone())),
            notify.recipients.clone(),
        );
    }

    if let Some(database_url) = &config.database_url {
        match Connection::connect(database_url).await {
            Ok(connection) => {
                if let Err(e) = connection.perform_migrations().await {
                    log::error!("Migrations failed: {:?}", e);
                }
                engine = engine.with_login_log(Arc::new(connection));
            }
            Err(e) => log::error!("Login recording disabled, database unreachable: {:?}", e),
        }
    }

    let engine = Arc::new(engine);

    if let Some(max_idle) = config.session_idle {
        let sweeper = engine.clone();
        tokio::spawn(async move {
            let period = EVICTION_SWEEP.min(max_idle).max(Duration::from_secs(1));
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let evicted = sweeper.sessions().evict_idle(max_idle);
                if evicted > 0 {
                    log::info!("Evicted {} idle session(s)", evicted);
                }
            }
        });
    }

    let mut dispatcher = Dispatcher::builder(bot.clone(), schema())
        .dependencies(dptree::deps![engine])
        .default_handler(|update| async move {
            log::trace!("Unhandled update {:?}", update.id);
        })
        .enable_ctrlc_handler()
        .build();

    if let Some(webhook) = config.webhook {
        log::info!("Receiving updates at {}", webhook.url);
        let listener = match webhooks::axum(bot, Options::new(webhook.address, webhook.url)).await {
            Ok(listener) => listener,
            Err(e) => {
                log::error!("Failed to build a webhook listener: {:?}", e);
                std::process::exit(1);
            }
        };
        dispatcher
            .dispatch_with_listener(
                listener,
                LoggingErrorHandler::with_custom_text("An error from the update listener"),
            )
            .await
    } else {
        log::info!("Receiving updates by long polling");
        dispatcher.dispatch().await
    }
}
