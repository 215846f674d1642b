//! Telegram update handlers.
//!
//! Recognized commands are answered on their own task, so a slow `/ask` never
//! holds up the update loop or other chats.

use std::{sync::Arc, time::Duration};

use teloxide::{prelude::*, types::Message};
use tokio::sync::oneshot;

use cheb_core::{
    commands::Command,
    domain::ChatId,
    messaging::{port::MessagingPort, reply::send_reply, types::ChatAction},
};

use crate::router::AppState;

const TYPING_INTERVAL: Duration = Duration::from_secs(4);

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let Some(command) = state.ctx.dispatcher.recognize(text) else {
        return Ok(());
    };

    let chat_id = ChatId(msg.chat.id.0);
    tracing::info!(
        chat_id = chat_id.0,
        user_id = ?msg.from().map(|u| u.id.0),
        command = command.name(),
        "command received"
    );

    tokio::spawn(respond(state, chat_id, command));
    Ok(())
}

async fn respond(state: Arc<AppState>, chat_id: ChatId, command: Command) {
    let typing = command
        .needs_model()
        .then(|| TypingIndicator::start(state.messenger.clone(), chat_id));

    let reply = state.ctx.dispatcher.handle(command).await;

    if let Some(typing) = typing {
        typing.stop();
    }

    if let Err(e) = send_reply(state.messenger.as_ref(), chat_id, &reply).await {
        tracing::warn!(chat_id = chat_id.0, error = %e, "failed to send reply");
    }
}

/// Re-sends the "typing" chat action until stopped (Telegram clears it after ~5s).
struct TypingIndicator {
    stop_tx: oneshot::Sender<()>,
}

impl TypingIndicator {
    fn start(messenger: Arc<dyn MessagingPort>, chat_id: ChatId) -> Self {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(TYPING_INTERVAL);
            loop {
                tokio::select! {
                    _ = tick.tick() => {
                        let _ = messenger.send_chat_action(chat_id, ChatAction::Typing).await;
                    }
                    _ = &mut stop_rx => break,
                }
            }
        });
        Self { stop_tx }
    }

    fn stop(self) {
        let _ = self.stop_tx.send(());
    }
}
