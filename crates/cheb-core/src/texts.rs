//! User-facing reply texts.
//!
//! All texts are Telegram HTML; anything interpolated into them must be escaped.

use crate::formatting::escape_html;

pub const GREETING: &str = "<em>Теперь я Чебурашка, мне каждая дворняжка при встрече сразу лапу подаёт.</em>\n\
Напиши /help, если хочешь узнать, что я умею.";

pub const HELP: &str = "<b>Вот что я умею!</b>\n\
/start - поздороваться со мной\n\
/help - типа забыл список команд? треш\n\
/ask &lt;твой вопрос&gt; - задай вопрос пжпж";

pub const ASK_PROMPT: &str =
    "Эй, не стесняйся! Напиши вопрос после команды /ask или подумай сам 😉";

pub const NO_ANSWER: &str = "ответа пока нет, подумай сам 🤷‍♂️";

pub const ERROR_PREFIX: &str = "Ошибка при запросе к ИИ: ";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BotTexts {
    pub greeting: String,
    pub help: String,
    pub ask_prompt: String,
    pub no_answer: String,
    pub error_prefix: String,
}

impl BotTexts {
    /// Reply for a failed query. `details` is plain text.
    pub fn error_reply(&self, details: &str) -> String {
        format!("{}{}", self.error_prefix, escape_html(details))
    }
}

impl Default for BotTexts {
    fn default() -> Self {
        Self {
            greeting: GREETING.to_string(),
            help: HELP.to_string(),
            ask_prompt: ASK_PROMPT.to_string(),
            no_answer: NO_ANSWER.to_string(),
            error_prefix: ERROR_PREFIX.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_reply_escapes_details() {
        let texts = BotTexts::default();
        assert_eq!(
            texts.error_reply("bad <json>"),
            "Ошибка при запросе к ИИ: bad &lt;json&gt;"
        );
    }

    #[test]
    fn help_lists_every_command() {
        for cmd in ["/start", "/help", "/ask"] {
            assert!(HELP.contains(cmd), "help is missing {cmd}");
        }
    }
}
