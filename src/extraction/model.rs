//! `LanguageModel` trait: the one network collaborator the extractor needs.

use crate::errors::CitationResult;

/// Prompt in, text out. May fail or stall; callers bound it with a deadline.
#[allow(async_fn_in_trait)]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> CitationResult<String>;
}

impl<T: LanguageModel> LanguageModel for std::sync::Arc<T> {
    async fn complete(&self, prompt: &str) -> CitationResult<String> {
        (**self).complete(prompt).await
    }
}
