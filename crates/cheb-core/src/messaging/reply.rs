use crate::{
    domain::{ChatId, MessageRef},
    errors::Error,
    formatting::{html_to_plain, split_html_chunks},
    messaging::port::MessagingPort,
    Result,
};

/// Send an HTML reply, split to the messenger's length limit.
///
/// A chunk the messenger refuses as HTML is re-sent once as plain text. Any
/// other send failure is returned as is.
pub async fn send_reply(
    messenger: &dyn MessagingPort,
    chat_id: ChatId,
    html: &str,
) -> Result<Vec<MessageRef>> {
    let caps = messenger.capabilities();
    let limit = caps.max_message_len.max(200);

    let mut sent = Vec::new();
    for chunk in split_html_chunks(html, limit) {
        if chunk.trim().is_empty() {
            continue;
        }
        if !caps.supports_html {
            sent.push(messenger.send_text(chat_id, &html_to_plain(&chunk)).await?);
            continue;
        }
        match messenger.send_html(chat_id, &chunk).await {
            Ok(msg) => sent.push(msg),
            Err(Error::Rejected(e)) => {
                tracing::warn!(chat_id = chat_id.0, error = %e, "html send failed, retrying as plain text");
                sent.push(messenger.send_text(chat_id, &html_to_plain(&chunk)).await?);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(sent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::MessageId,
        messaging::types::{ChatAction, MessagingCapabilities},
    };
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeMessenger {
        reject_html: bool,
        fail_html: bool,
        plain_only: bool,
        max_len: usize,
        html: Mutex<Vec<String>>,
        text: Mutex<Vec<String>>,
    }

    impl FakeMessenger {
        fn with_limit(max_len: usize) -> Self {
            Self {
                max_len,
                ..Default::default()
            }
        }

        fn msg(chat_id: ChatId, n: usize) -> MessageRef {
            MessageRef {
                chat_id,
                message_id: MessageId(n as i32),
            }
        }
    }

    #[async_trait]
    impl MessagingPort for FakeMessenger {
        fn capabilities(&self) -> MessagingCapabilities {
            MessagingCapabilities {
                supports_html: !self.plain_only,
                supports_chat_actions: false,
                max_message_len: self.max_len,
            }
        }

        async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
            if self.reject_html {
                return Err(Error::Rejected("can't parse entities".to_string()));
            }
            if self.fail_html {
                return Err(Error::External("connection reset".to_string()));
            }
            let mut sent = self.html.lock().unwrap();
            sent.push(html.to_string());
            Ok(Self::msg(chat_id, sent.len()))
        }

        async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
            let mut sent = self.text.lock().unwrap();
            sent.push(text.to_string());
            Ok(Self::msg(chat_id, sent.len()))
        }

        async fn send_chat_action(&self, _chat_id: ChatId, _action: ChatAction) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn short_reply_is_one_message() {
        let m = FakeMessenger::with_limit(4096);
        let sent = send_reply(&m, ChatId(1), "<b>hi</b>").await.unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(*m.html.lock().unwrap(), vec!["<b>hi</b>".to_string()]);
    }

    #[tokio::test]
    async fn long_reply_is_split() {
        let m = FakeMessenger::with_limit(200);
        let html = "строка\n".repeat(100);
        let sent = send_reply(&m, ChatId(1), &html).await.unwrap();
        assert!(sent.len() > 1);
        let chunks = m.html.lock().unwrap();
        assert!(chunks.iter().all(|c| c.len() <= 200));
        assert_eq!(chunks.concat(), html);
    }

    #[tokio::test]
    async fn rejected_html_falls_back_to_plain_text() {
        let m = FakeMessenger {
            reject_html: true,
            max_len: 4096,
            ..Default::default()
        };
        send_reply(&m, ChatId(1), "<b>a &lt; b</b>").await.unwrap();
        assert_eq!(*m.text.lock().unwrap(), vec!["a < b".to_string()]);
    }

    #[tokio::test]
    async fn transport_failure_is_not_resent_as_plain_text() {
        let m = FakeMessenger {
            fail_html: true,
            max_len: 4096,
            ..Default::default()
        };
        let err = send_reply(&m, ChatId(1), "<b>hi</b>").await.unwrap_err();
        assert!(matches!(err, Error::External(_)));
        assert!(m.text.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn plain_only_messenger_gets_stripped_text() {
        let m = FakeMessenger {
            plain_only: true,
            max_len: 4096,
            ..Default::default()
        };
        send_reply(&m, ChatId(1), "<b>bold</b> &amp; <i>it</i>").await.unwrap();
        assert!(m.html.lock().unwrap().is_empty());
        assert_eq!(*m.text.lock().unwrap(), vec!["bold & it".to_string()]);
    }
}
