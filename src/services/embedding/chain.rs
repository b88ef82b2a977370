//! Ordered provider chain: the first provider that answers wins.

use super::{Embedder, EmbeddingError, EmbeddingResult};
use tracing::warn;

/// Tries providers in priority order.
///
/// Each call is answered wholly by one provider; a batch is never split
/// across providers, so vectors of one call share a space.
pub struct FallbackEmbedder {
    chain: Vec<Box<dyn Embedder>>,
}

impl Default for FallbackEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl FallbackEmbedder {
    pub fn new() -> Self {
        Self { chain: Vec::new() }
    }

    /// Add a provider to the end of the chain.
    pub fn push(&mut self, provider: Box<dyn Embedder>) {
        self.chain.push(provider);
    }

    /// Name of the highest-priority provider.
    pub fn active_provider_name(&self) -> &str {
        self.chain.first().map(|p| p.model_name()).unwrap_or("none")
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    fn try_each<T>(
        &self,
        op: &str,
        f: impl Fn(&dyn Embedder) -> EmbeddingResult<T>,
    ) -> EmbeddingResult<T> {
        let mut last_error = None;
        for provider in &self.chain {
            match f(provider.as_ref()) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(
                        provider = provider.model_name(),
                        op,
                        error = %e,
                        "provider failed, trying next in chain"
                    );
                    last_error = Some(e);
                }
            }
        }
        Err(EmbeddingError::Unavailable(
            last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "empty provider chain".to_string()),
        ))
    }
}

impl Embedder for FallbackEmbedder {
    fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        self.try_each("embed", |p| p.embed(text))
    }

    fn embed_batch(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        self.try_each("embed_batch", |p| {
            let vectors = p.embed_batch(texts)?;
            if vectors.len() != texts.len() {
                return Err(EmbeddingError::CountMismatch {
                    expected: texts.len(),
                    actual: vectors.len(),
                });
            }
            Ok(vectors)
        })
    }

    fn dimension(&self) -> usize {
        self.chain.first().map(|p| p.dimension()).unwrap_or(0)
    }

    fn model_name(&self) -> &str {
        self.active_provider_name()
    }
}
