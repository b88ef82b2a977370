//! Local ONNX sentence encoder backed by the `fastembed` crate.
//!
//! The default model is all-MiniLM-L6-v2 (384 dimensions). Weights are
//! downloaded into the cache directory on first use.

use super::{Embedder, EmbeddingError, EmbeddingResult};
use ::fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;

pub struct FastEmbedProvider {
    model: Mutex<TextEmbedding>,
    model_name: String,
    dimensions: usize,
}

/// Map a configured model name to a fastembed model and its dimension.
fn resolve_model(name: &str) -> (EmbeddingModel, usize) {
    let key = name.to_ascii_lowercase();
    let key = key.rsplit('/').next().unwrap_or(&key);
    match key {
        "bge-small-en-v1.5" => (EmbeddingModel::BGESmallENV15, 384),
        "bge-base-en-v1.5" => (EmbeddingModel::BGEBaseENV15, 768),
        "paraphrase-multilingual-minilm-l12-v2" => (EmbeddingModel::ParaphraseMLMiniLML12V2, 384),
        "nomic-embed-text-v1.5" => (EmbeddingModel::NomicEmbedTextV15, 768),
        _ => (EmbeddingModel::AllMiniLML6V2, 384),
    }
}

impl FastEmbedProvider {
    pub fn new(model: &str, cache_dir: Option<String>) -> EmbeddingResult<Self> {
        let (model_type, dimensions) = resolve_model(model);

        let mut options = InitOptions::new(model_type);
        if let Some(dir) = cache_dir {
            options = options.with_cache_dir(PathBuf::from(dir));
        }

        let embedding = TextEmbedding::try_new(options)
            .map_err(|e| EmbeddingError::InitFailed(e.to_string()))?;

        info!(model, dims = dimensions, "fastembed model loaded");
        Ok(Self {
            model: Mutex::new(embedding),
            model_name: model.to_string(),
            dimensions,
        })
    }
}

impl Embedder for FastEmbedProvider {
    fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .into_iter()
            .next()
            .ok_or(EmbeddingError::CountMismatch { expected: 1, actual: 0 })
    }

    fn embed_batch(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let mut model = self
            .model
            .lock()
            .map_err(|_| EmbeddingError::InferenceFailed("model lock poisoned".to_string()))?;
        model
            .embed(texts.to_vec(), None)
            .map_err(|e| EmbeddingError::InferenceFailed(e.to_string()))
    }

    fn dimension(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

impl std::fmt::Debug for FastEmbedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedProvider")
            .field("model_name", &self.model_name)
            .field("dimensions", &self.dimensions)
            .finish()
    }
}
