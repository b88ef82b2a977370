// Detection Module
// Heuristic AI-content detection organized into specialized submodules:
// - features: sentence statistics, indicator words, repetition
// - readability: Flesch reading ease
// - scoring: fixed additive probability

pub mod features;
pub mod readability;
pub mod scoring;

pub use features::extract_features;
pub use readability::flesch_reading_ease;
pub use scoring::ai_probability;

use crate::models::{AiDetectionResult, Verdict};
use tracing::debug;

/// Score `text` for machine-generated patterns. Deterministic; empty text is
/// `Human-written` with probability 0.
pub fn analyze_text(text: &str) -> AiDetectionResult {
    if text.trim().is_empty() {
        return AiDetectionResult::default();
    }

    let features = extract_features(text);
    let probability = ai_probability(&features);
    let verdict = Verdict::from_probability(probability);
    debug!(
        words = features.word_count,
        probability,
        verdict = verdict.as_str(),
        "detection.analyzed"
    );

    AiDetectionResult {
        ai_probability: probability,
        features,
        verdict,
    }
}
