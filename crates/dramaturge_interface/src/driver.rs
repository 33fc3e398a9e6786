//! The model boundary trait.

use async_trait::async_trait;
use dramaturge_core::{GenerateRequest, GenerateResponse};
use dramaturge_error::DramaturgeResult;

/// Core trait that all model backends must implement.
///
/// This is the pipeline's only view of the model: send an ordered list
/// of role-tagged messages, receive one text completion. Provider,
/// model, and credential selection live entirely behind this trait.
#[async_trait]
pub trait AnalysisDriver: Send + Sync {
    /// Generate one text completion for the given request.
    async fn generate(&self, req: &GenerateRequest) -> DramaturgeResult<GenerateResponse>;

    /// Provider name (e.g. "deepseek", "anthropic", "openai").
    fn provider_name(&self) -> &'static str;

    /// Model identifier (e.g. "deepseek-chat").
    fn model_name(&self) -> &str;
}
