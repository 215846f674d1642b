use std::sync::Arc;

use anyhow::Context;
use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use cheb_core::{app::AppContext, messaging::port::MessagingPort};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub ctx: AppContext,
    pub messenger: Arc<dyn MessagingPort>,
}

/// Identify the bot, drop updates queued while it was offline, then long-poll
/// until ctrl-c.
pub async fn run_polling(ctx: AppContext) -> anyhow::Result<()> {
    let bot = Bot::new(ctx.cfg.telegram_bot_token.clone());

    // An invalid token surfaces here, before any update is consumed.
    let me = bot
        .get_me()
        .await
        .context("telegram rejected the bot token (getMe failed)")?;
    let username = me.username().to_string();

    bot.delete_webhook()
        .drop_pending_updates(true)
        .await
        .context("failed to drop pending updates")?;

    tracing::info!(
        bot = %username,
        model = %ctx.cfg.gemini_model,
        "✅ Чебурашка на связи! Бот запущен!"
    );

    let messenger: Arc<dyn MessagingPort> = Arc::new(
        TelegramMessenger::new(bot.clone()).with_message_limit(ctx.cfg.telegram_message_limit),
    );

    let state = Arc::new(AppState {
        ctx: ctx.with_bot_username(username),
        messenger,
    });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    tracing::info!("polling stopped");
    Ok(())
}
