//! SceneBridge demo bot
//!
//! Main application entry point

use std::sync::Arc;
use teloxide::{prelude::*, types::Update};
use tracing::{error, info, warn};

use SceneBridge::{
    config::Settings,
    handlers,
    middleware::{LoggingMiddleware, Pipeline, SessionMiddleware},
    scenes::{Stage, StageOptions},
    state::connect_store,
    utils::logging,
    BotApi, TelegramBridge,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging; the guard flushes the file writer on exit
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", SceneBridge::info());

    // Initialize session storage
    info!(backend = ?settings.session.backend, "Connecting session store...");
    let store = connect_store(&settings.session).await?;

    // Build scenes and the update pipeline
    let stage = Stage::new(StageOptions::from(&settings.stage)).register(handlers::scenes()?);
    info!(scenes = stage.registry().len(), "Scenes registered");

    let pipeline = Pipeline::new()
        .with(LoggingMiddleware::from_config(&settings.logging))
        .with(SessionMiddleware::new(store).with_default_session(handlers::default_session))
        .with(stage.middleware())
        .fallback(|ctx| {
            Box::pin(async move {
                if ctx.text().is_some() {
                    ctx.reply("Send /start to begin.").await?;
                }
                Ok(())
            })
        });

    // Initialize bot
    let bot = Bot::new(&settings.bot.token);
    let bridge = Arc::new(TelegramBridge::new(bot.clone(), pipeline));

    if let Err(e) = bridge.api().set_my_commands(&handlers::bot_commands()).await {
        warn!(error = %e, "Failed to register bot commands");
    }

    let handler = dptree::entry().endpoint(handle_update);

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![bridge])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd);
        })
        .enable_ctrlc_handler()
        .build();

    info!("Starting bot with polling mode...");
    dispatcher.dispatch().await;

    info!("SceneBridge bot has been shut down.");
    Ok(())
}

/// Run every update through the bridge. Errors are logged and swallowed so
/// the dispatcher keeps polling.
async fn handle_update(update: Update, bridge: Arc<TelegramBridge>) -> Result<(), std::convert::Infallible> {
    if let Err(e) = bridge.handle(&update).await {
        error!(update_id = update.id.0, error = %e, recoverable = e.is_recoverable(), "Failed to process update");
    }
    Ok(())
}
