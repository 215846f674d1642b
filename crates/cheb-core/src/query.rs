//! LLM query client: one question in, one reply text out.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use crate::{
    errors::QueryError,
    formatting::{escape_html, MarkupConverter},
    model::{client::ModelClient, types::Answer},
    texts::BotTexts,
};

/// Runs questions against the model and renders the outcome as reply HTML.
///
/// The provider call is spawned onto its own task so the update loop is never
/// held up by it, and a panic inside the provider surfaces as an error reply.
#[derive(Clone)]
pub struct QueryClient {
    model: Arc<dyn ModelClient>,
    converter: Arc<MarkupConverter>,
    texts: Arc<BotTexts>,
    timeout: Option<Duration>,
}

impl QueryClient {
    pub fn new(model: Arc<dyn ModelClient>, texts: Arc<BotTexts>) -> Self {
        Self {
            model,
            converter: Arc::new(MarkupConverter::default()),
            texts,
            timeout: None,
        }
    }

    /// Give up on the provider after `timeout`. `None` leaves it to the provider client.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_converter(mut self, converter: MarkupConverter) -> Self {
        self.converter = Arc::new(converter);
        self
    }

    /// Run the provider call and return its structured outcome.
    pub async fn try_query(&self, question: &str) -> Result<Answer, QueryError> {
        let model = self.model.clone();
        let prompt = question.to_string();
        let mut handle = tokio::spawn(async move { model.generate(&prompt).await });

        let joined = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    handle.abort();
                    return Err(QueryError::Timeout(limit));
                }
            },
            None => handle.await,
        };

        joined.map_err(|e| QueryError::Worker(e.to_string()))?
    }

    /// Ask the model and render the reply. Never fails: errors become reply text.
    pub async fn query(&self, question: &str) -> String {
        let started = Instant::now();
        let outcome = self.try_query(question).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(Answer::Text(raw)) => {
                tracing::info!(
                    model = self.model.model(),
                    question_chars = question.chars().count(),
                    answer_chars = raw.chars().count(),
                    elapsed_ms,
                    "query answered"
                );
                self.render(&raw)
            }
            Ok(Answer::Empty) => {
                tracing::info!(model = self.model.model(), elapsed_ms, "query returned no text");
                self.texts.no_answer.clone()
            }
            Err(e) => {
                tracing::warn!(model = self.model.model(), elapsed_ms, error = %e, "query failed");
                self.texts.error_reply(&e.to_string())
            }
        }
    }

    /// Raw model Markdown → reply HTML.
    pub fn render(&self, raw: &str) -> String {
        self.converter.convert(&escape_html(raw.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedModel {
        reply: std::result::Result<Answer, String>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl FixedModel {
        fn ok(text: &str) -> Self {
            Self {
                reply: Ok(Answer::from_text(text)),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(msg: &str) -> Self {
            Self {
                reply: Err(msg.to_string()),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ModelClient for FixedModel {
        fn model(&self) -> &str {
            "fixed"
        }

        async fn generate(&self, _prompt: &str) -> Result<Answer, QueryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.reply.clone().map_err(QueryError::Http)
        }
    }

    struct PanickingModel;

    #[async_trait]
    impl ModelClient for PanickingModel {
        fn model(&self) -> &str {
            "panicking"
        }

        async fn generate(&self, _prompt: &str) -> Result<Answer, QueryError> {
            panic!("provider blew up");
        }
    }

    fn client(model: Arc<dyn ModelClient>) -> QueryClient {
        QueryClient::new(model, Arc::new(BotTexts::default()))
    }

    #[tokio::test]
    async fn trims_escapes_and_converts_answer() {
        let qc = client(Arc::new(FixedModel::ok("\n  **Да** <script>\n- пункт  \n")));
        assert_eq!(qc.query("вопрос").await, "<b>Да</b> &lt;script&gt;\n• пункт");
    }

    #[tokio::test]
    async fn empty_answer_yields_placeholder() {
        let qc = client(Arc::new(FixedModel::ok("   ")));
        assert_eq!(qc.query("вопрос").await, crate::texts::NO_ANSWER);
    }

    #[tokio::test]
    async fn provider_failure_becomes_error_text() {
        let model = Arc::new(FixedModel::failing("connection refused"));
        let qc = client(model.clone());
        let reply = qc.query("вопрос").await;
        assert!(reply.starts_with(crate::texts::ERROR_PREFIX));
        assert!(reply.contains("connection refused"));
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn provider_panic_becomes_error_text() {
        let qc = client(Arc::new(PanickingModel));
        assert!(matches!(
            qc.try_query("вопрос").await,
            Err(QueryError::Worker(_))
        ));
        assert!(qc.query("вопрос").await.starts_with(crate::texts::ERROR_PREFIX));
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let mut model = FixedModel::ok("late");
        model.delay = Duration::from_secs(5);
        let qc = client(Arc::new(model)).with_timeout(Some(Duration::from_millis(20)));
        assert!(matches!(
            qc.try_query("вопрос").await,
            Err(QueryError::Timeout(_))
        ));
    }
}
