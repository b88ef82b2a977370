//! Sentence embedding capability.
//!
//! An [`Embedder`] maps text to a fixed-size dense vector. Loading a neural
//! encoder is expensive, so one instance is built per process (inside the
//! `Analyzer`) and shared read-only as [`SharedEmbedder`] by every service
//! that needs similarities: the generator, the summarizer and the
//! assessment engine.

pub mod chain;
#[cfg(feature = "fastembed")]
pub mod fastembed;
pub mod hashed;

use crate::services::config_store::EmbeddingConfig;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

pub use chain::FallbackEmbedder;
pub use hashed::HashedEmbedder;

/// Errors that can occur during embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The model could not be loaded.
    #[error("Embedding model initialization failed: {0}")]
    InitFailed(String),

    /// Inference ran but produced an error.
    #[error("Embedding inference failed: {0}")]
    InferenceFailed(String),

    /// The runtime returned a different number of vectors than inputs.
    #[error("Expected {expected} embeddings, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    /// Every provider in a fallback chain failed.
    #[error("No embedding provider available: {0}")]
    Unavailable(String),
}

/// Result type for embedding operations.
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Text embedding provider.
///
/// Implementations take `&self` only and must be safe to call from several
/// threads at once; any interior locking the runtime needs stays inside.
pub trait Embedder: Send + Sync {
    /// Embed a single text span.
    fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>>;

    /// Embed several spans, output order matching input order.
    ///
    /// All vectors of one call come from the same model, so similarities
    /// within a batch are always comparable.
    fn embed_batch(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Dimension of the produced vectors.
    fn dimension(&self) -> usize;

    /// Model identifier, used in logs.
    fn model_name(&self) -> &str;
}

/// Shared, read-only handle passed to every component that needs embeddings.
pub type SharedEmbedder = Arc<dyn Embedder>;

/// Cosine similarity in `[-1, 1]`; zero-norm or mismatched vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a <= f64::EPSILON || norm_b <= f64::EPSILON {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

/// Build the process-wide embedder described by `config`.
///
/// The hashed provider always sits last in the chain, so this never fails:
/// when the neural model cannot be loaded the chain degrades to it.
pub fn build_embedder(config: &EmbeddingConfig) -> SharedEmbedder {
    let mut chain = FallbackEmbedder::new();

    if config.provider.eq_ignore_ascii_case("fastembed") {
        push_neural_provider(&mut chain, config);
    }
    chain.push(Box::new(HashedEmbedder::new(config.dimensions)));

    info!(
        provider = chain.active_provider_name(),
        dims = config.dimensions,
        "embedder.initialized"
    );
    Arc::new(chain)
}

#[cfg(feature = "fastembed")]
fn push_neural_provider(chain: &mut FallbackEmbedder, config: &EmbeddingConfig) {
    match fastembed::FastEmbedProvider::new(&config.model, config.cache_dir.clone()) {
        Ok(provider) => chain.push(Box::new(provider)),
        Err(e) => warn!(model = %config.model, error = %e, "fastembed unavailable, using hashed embedder"),
    }
}

#[cfg(not(feature = "fastembed"))]
fn push_neural_provider(_chain: &mut FallbackEmbedder, config: &EmbeddingConfig) {
    warn!(
        model = %config.model,
        "built without the `fastembed` feature, using hashed embedder"
    );
}
