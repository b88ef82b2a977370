// Feature Extraction
// Linguistic signals the detector scores: sentence-length statistics,
// readability, indicator-word ratio and word repetition.

use super::readability::flesch_reading_ease;
use crate::models::DetectionFeatures;
use crate::services::text_processor::split_on_terminators;
use std::collections::HashMap;

/// Single-word markers, matched against tokens with edge punctuation removed.
pub const AI_INDICATOR_WORDS: [&str; 9] = [
    "highly",
    "delve",
    "tapestry",
    "realm",
    "testament",
    "moreover",
    "furthermore",
    "additionally",
    "however",
];

/// Multi-word markers, matched as whole-word phrases.
pub const AI_INDICATOR_PHRASES: [&str; 2] = ["it is important to note", "in conclusion"];

fn strip_edge_punctuation(token: &str) -> &str {
    token.trim_matches(|c: char| !c.is_alphanumeric())
}

/// Occurrences of `phrase` in a whitespace token stream.
fn count_phrase(tokens: &[&str], phrase: &str) -> usize {
    let parts: Vec<&str> = phrase.split(' ').collect();
    if parts.is_empty() || tokens.len() < parts.len() {
        return 0;
    }
    tokens
        .windows(parts.len())
        .filter(|w| w.iter().zip(&parts).all(|(t, p)| t == p))
        .count()
}

pub fn indicator_count(tokens: &[&str]) -> usize {
    let words = tokens
        .iter()
        .filter(|t| AI_INDICATOR_WORDS.contains(t))
        .count();
    let phrases: usize = AI_INDICATOR_PHRASES
        .iter()
        .map(|p| count_phrase(tokens, p))
        .sum();
    words + phrases
}

/// Population standard deviation.
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    var.sqrt()
}

pub fn extract_features(text: &str) -> DetectionFeatures {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = lowered
        .split_whitespace()
        .map(strip_edge_punctuation)
        .filter(|t| !t.is_empty())
        .collect();
    let word_count = tokens.len();
    if word_count == 0 {
        return DetectionFeatures::default();
    }

    let sentence_lengths: Vec<f64> = split_on_terminators(text)
        .iter()
        .map(|s| s.split_whitespace().count() as f64)
        .collect();
    let sentence_count = sentence_lengths.len().max(1);

    let mut freq: HashMap<&str, usize> = HashMap::new();
    for t in &tokens {
        *freq.entry(t).or_default() += 1;
    }
    let most_common = freq.values().copied().max().unwrap_or(0);

    DetectionFeatures {
        avg_sentence_length: word_count as f64 / sentence_count as f64,
        readability_score: flesch_reading_ease(text),
        ai_word_ratio: indicator_count(&tokens) as f64 / word_count as f64,
        repetition_ratio: most_common as f64 / word_count as f64,
        sentence_variation: population_std(&sentence_lengths),
        word_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indicator_matching_strips_punctuation() {
        let f = extract_features("Moreover, the realm is vast. However; we delve.");
        // moreover, realm, however, delve over 8 tokens
        assert_eq!(f.word_count, 8);
        assert!((f.ai_word_ratio - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_phrase_indicators_counted() {
        let tokens = ["in", "conclusion", "it", "is", "important", "to", "note", "this"];
        assert_eq!(indicator_count(&tokens), 2);
        assert_eq!(count_phrase(&["in"], "in conclusion"), 0);
    }

    #[test]
    fn test_population_std() {
        assert_eq!(population_std(&[]), 0.0);
        assert_eq!(population_std(&[4.0, 4.0]), 0.0);
        assert!((population_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_sentence_statistics() {
        let f = extract_features("One two three. Four five six seven eight nine ten.");
        assert_eq!(f.word_count, 10);
        assert!((f.avg_sentence_length - 5.0).abs() < 1e-9);
        assert!((f.sentence_variation - 2.0).abs() < 1e-9);
        assert!((f.repetition_ratio - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_empty_features() {
        assert_eq!(extract_features("   "), DetectionFeatures::default());
    }
}
