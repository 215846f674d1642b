use std::sync::Arc;

use crate::{
    commands::CommandDispatcher, config::Config, model::client::ModelClient, query::QueryClient,
    texts::BotTexts,
};

/// Everything the bot runtime needs, built once at startup and shared by `Arc`.
#[derive(Clone)]
pub struct AppContext {
    pub cfg: Arc<Config>,
    pub dispatcher: CommandDispatcher,
}

impl AppContext {
    pub fn new(cfg: Arc<Config>, model: Arc<dyn ModelClient>) -> Self {
        Self::with_texts(cfg, model, BotTexts::default())
    }

    pub fn with_texts(cfg: Arc<Config>, model: Arc<dyn ModelClient>, texts: BotTexts) -> Self {
        let texts = Arc::new(texts);
        let query = QueryClient::new(model, texts.clone()).with_timeout(cfg.query_timeout);
        Self {
            dispatcher: CommandDispatcher::new(query, texts),
            cfg,
        }
    }

    /// Known once the bot has identified itself to Telegram.
    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        self.dispatcher = self.dispatcher.with_bot_username(username);
        self
    }
}
