//! Hashing-trick embedder over the pipeline's own word tokens.
//!
//! Content words and adjacent word pairs are hashed into a fixed number of
//! buckets with sublinear term frequency, then L2-normalized. Tokenization
//! and stop words are shared with key-phrase extraction, so "similar" here
//! means the same thing it means to the rest of the analysis.

use super::{Embedder, EmbeddingResult};
use crate::services::text_processor::{is_stop_word, tokenize_words};
use std::collections::HashMap;

const BIGRAM_WEIGHT: f32 = 0.5;

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325, |h, b| {
        (h ^ u64::from(*b)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

/// Lowercased word tokens without stop words. Text made only of stop words
/// keeps them all, so it still gets a non-zero vector.
fn content_terms(text: &str) -> Vec<String> {
    let words: Vec<String> = tokenize_words(text).into_iter().map(str::to_lowercase).collect();
    let content: Vec<String> = words.iter().filter(|w| !is_stop_word(w)).cloned().collect();
    if content.is_empty() {
        words
    } else {
        content
    }
}

pub struct HashedEmbedder {
    dimensions: usize,
}

impl HashedEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn bucket(&self, feature: &str) -> usize {
        (fnv1a(feature.as_bytes()) % self.dimensions as u64) as usize
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let terms = content_terms(text);
        let mut vector = vec![0.0f32; self.dimensions];

        let mut features: HashMap<String, (f32, u32)> = HashMap::new();
        for term in &terms {
            features.entry(term.clone()).or_insert((1.0, 0)).1 += 1;
        }
        for pair in terms.windows(2) {
            let key = format!("{} {}", pair[0], pair[1]);
            features.entry(key).or_insert((BIGRAM_WEIGHT, 0)).1 += 1;
        }

        for (feature, (weight, count)) in &features {
            vector[self.bucket(feature)] += weight * (1.0 + (*count as f32).ln());
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

impl Embedder for HashedEmbedder {
    fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        Ok(self.vectorize(text))
    }

    fn dimension(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        "tfidf-hashed"
    }
}
