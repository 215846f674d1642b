use async_trait::async_trait;

use crate::errors::QueryError;

use super::types::Answer;

/// Model client interface used by the query client.
///
/// Implementations are shared across concurrent queries and must not keep
/// per-request state.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Model identity, for logs.
    fn model(&self) -> &str;

    /// Run a single-turn prompt.
    async fn generate(&self, prompt: &str) -> Result<Answer, QueryError>;
}
