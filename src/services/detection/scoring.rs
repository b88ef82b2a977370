// Scoring
// Fixed additive heuristic over the extracted features.

use crate::models::DetectionFeatures;

pub const UNIFORM_LENGTH_RANGE: (f64, f64) = (15.0, 25.0);
pub const READABILITY_THRESHOLD: f64 = 60.0;
pub const REPETITION_THRESHOLD: f64 = 0.05;
pub const VARIATION_THRESHOLD: f64 = 5.0;

/// Each term is gated or capped on its own; the sum is clamped to [0, 1].
pub fn ai_probability(features: &DetectionFeatures) -> f64 {
    let mut probability = 0.0;

    let (lo, hi) = UNIFORM_LENGTH_RANGE;
    if (lo..=hi).contains(&features.avg_sentence_length) {
        probability += 0.2;
    }
    if features.readability_score > READABILITY_THRESHOLD {
        probability += 0.2;
    }
    probability += (features.ai_word_ratio * 10.0).min(0.3);
    if features.repetition_ratio > REPETITION_THRESHOLD {
        probability += 0.1;
    }
    if features.sentence_variation < VARIATION_THRESHOLD {
        probability += 0.2;
    }

    probability.clamp(0.0, 1.0)
}
