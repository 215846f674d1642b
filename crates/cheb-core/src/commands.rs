//! Command dispatch: `/start`, `/help`, `/ask`.

use std::sync::Arc;

use crate::{query::QueryClient, texts::BotTexts};

/// The leading `/command[@bot]` token of a message and the text after it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
    pub mention: Option<String>,
    pub args: String,
}

/// Split a message into its command token and arguments.
///
/// Returns `None` for text that is not a command.
pub fn parse_command(text: &str) -> Option<ParsedCommand> {
    // Telegram may send `/cmd@botname arg1 ...`
    let text = text.trim();
    let token = text.strip_prefix('/')?;

    let mut parts = token.splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("");
    let args = parts.next().unwrap_or("").trim().to_string();

    let (name, mention) = match first.split_once('@') {
        Some((name, bot)) => (name, Some(bot.to_string())),
        None => (first, None),
    };
    if name.is_empty() {
        return None;
    }

    Some(ParsedCommand {
        name: name.to_lowercase(),
        mention,
        args,
    })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Greeting,
    Help,
    /// The trimmed question; may be empty.
    Ask(String),
}

impl Command {
    pub fn parse(name: &str, args: &str) -> Option<Self> {
        match name {
            "start" | "привет" => Some(Command::Greeting),
            "help" => Some(Command::Help),
            "ask" => Some(Command::Ask(args.trim().to_string())),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Greeting => "start",
            Command::Help => "help",
            Command::Ask(_) => "ask",
        }
    }

    /// Whether handling this command calls the model.
    pub fn needs_model(&self) -> bool {
        matches!(self, Command::Ask(q) if !q.is_empty())
    }
}

/// Stateless command router. Every recognized command yields exactly one reply.
#[derive(Clone)]
pub struct CommandDispatcher {
    query: QueryClient,
    texts: Arc<BotTexts>,
    bot_username: Option<String>,
}

impl CommandDispatcher {
    pub fn new(query: QueryClient, texts: Arc<BotTexts>) -> Self {
        Self {
            query,
            texts,
            bot_username: None,
        }
    }

    /// Ignore commands addressed to other bots (`/ask@other_bot`).
    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        self.bot_username = Some(username.into());
        self
    }

    /// Map message text to a command we handle, if any.
    pub fn recognize(&self, text: &str) -> Option<Command> {
        let parsed = parse_command(text)?;
        if let (Some(mention), Some(me)) = (&parsed.mention, &self.bot_username) {
            if !mention.eq_ignore_ascii_case(me) {
                return None;
            }
        }
        Command::parse(&parsed.name, &parsed.args)
    }

    pub async fn handle(&self, command: Command) -> String {
        match command {
            Command::Greeting => self.texts.greeting.clone(),
            Command::Help => self.texts.help.clone(),
            Command::Ask(question) if question.is_empty() => self.texts.ask_prompt.clone(),
            Command::Ask(question) => self.query.query(&question).await,
        }
    }

    /// Reply to `text`, or `None` when it is not a command we handle.
    pub async fn dispatch(&self, text: &str) -> Option<String> {
        let command = self.recognize(text)?;
        tracing::debug!(?command, "dispatching command");
        Some(self.handle(command).await)
    }
}
