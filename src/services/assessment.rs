// Assessment Engine
// Scores a free-text answer: completeness from length, a relevance bonus from
// question/answer embedding similarity, and heuristic quality checks that
// drive the strengths/improvements lists.

use crate::models::{AnswerEvaluation, AnswerQuality};
use crate::services::embedding::{cosine_similarity, Embedder, EmbeddingError, EmbeddingResult};
use crate::services::text_processor::split_on_terminators;
use regex::Regex;
use std::sync::OnceLock;

pub const NO_ANSWER_FEEDBACK: &str = "No answer provided.";
pub const NO_ANSWER_IMPROVEMENT: &str = "Please provide a complete answer.";

const GOOD_LENGTH_WORDS: usize = 50;
const FULL_COMPLETENESS_WORDS: f64 = 100.0;
const STRUCTURE_THRESHOLD: f64 = 0.7;

const EXAMPLE_MARKERS: [&str; 3] = ["example", "for instance", "such as"];

fn ordinal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(first|second|third|finally)\b").expect("ordinal regex"))
}

fn connective_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(therefore|however|moreover)\b").expect("connective regex"))
}

/// Title-case test: every cased run starts uppercase and continues lowercase,
/// with at least one cased character. "Krebs" qualifies, "ATP" does not.
fn is_title_case(word: &str) -> bool {
    let mut saw_cased = false;
    let mut prev_cased = false;
    for ch in word.chars() {
        if ch.is_uppercase() {
            if prev_cased {
                return false;
            }
            prev_cased = true;
            saw_cased = true;
        } else if ch.is_lowercase() {
            if !prev_cased {
                return false;
            }
            prev_cased = true;
            saw_cased = true;
        } else {
            prev_cased = false;
        }
    }
    saw_cased
}

/// Fraction of the four structural indicators present.
pub fn structure_score(answer: &str) -> f64 {
    let lowered = answer.to_lowercase();
    let terminators = answer.chars().filter(|c| matches!(c, '.' | '!' | '?')).count();
    let indicators = [
        ordinal_re().is_match(&lowered),
        connective_re().is_match(&lowered),
        terminators >= 2,
        answer.contains('\n') || answer.matches(',').count() >= 3,
    ];
    indicators.iter().filter(|&&hit| hit).count() as f64 / indicators.len() as f64
}

pub fn analyze_answer_quality(answer: &str) -> AnswerQuality {
    let words: Vec<&str> = answer.split_whitespace().collect();
    let word_count = words.len();
    let sentence_count = split_on_terminators(answer).len();
    let title_words = words
        .iter()
        .filter(|w| w.chars().count() > 3 && is_title_case(w))
        .count();
    let lowered = answer.to_lowercase();

    AnswerQuality {
        word_count,
        sentence_count,
        avg_sentence_length: word_count as f64 / sentence_count.max(1) as f64,
        has_technical_terms: title_words > 2,
        has_examples: EXAMPLE_MARKERS.iter().any(|m| lowered.contains(m)),
        structure_score: structure_score(answer),
        completeness: (word_count as f64 / FULL_COMPLETENESS_WORDS).min(1.0),
    }
}

/// Each metric contributes exactly one strength or one improvement.
pub fn strengths_and_improvements(quality: &AnswerQuality) -> (Vec<String>, Vec<String>) {
    let checks = [
        (
            quality.word_count >= GOOD_LENGTH_WORDS,
            "Good answer length",
            "Provide more detailed explanation",
        ),
        (
            quality.has_technical_terms,
            "Uses appropriate terminology",
            "Include more technical terms",
        ),
        (
            quality.has_examples,
            "Includes examples",
            "Add specific examples to support your points",
        ),
        (
            quality.structure_score >= STRUCTURE_THRESHOLD,
            "Well-structured answer",
            "Improve answer structure with clear paragraphs",
        ),
    ];

    let mut strengths = Vec::new();
    let mut improvements = Vec::new();
    for (passed, strength, improvement) in checks {
        if passed {
            strengths.push(strength.to_string());
        } else {
            improvements.push(improvement.to_string());
        }
    }
    (strengths, improvements)
}

/// min(completeness * 10, 8) + min(relevance * 2, 2), clamped to [0, 10]
/// and rounded to one decimal.
pub fn score_answer(completeness: f64, relevance: f64) -> f64 {
    let base = (completeness * 10.0).min(8.0);
    let bonus = (relevance * 2.0).min(2.0);
    let score = (base + bonus).clamp(0.0, 10.0);
    (score * 10.0).round() / 10.0
}

pub fn feedback_for(score: f64) -> &'static str {
    if score >= 9.0 {
        "Excellent answer! Comprehensive, well-structured, and highly relevant."
    } else if score >= 7.0 {
        "Good answer. Covers main points well with room for minor improvements."
    } else if score >= 5.0 {
        "Satisfactory answer. Addresses the question but needs more depth and detail."
    } else {
        "Needs significant improvement. Focus on providing more detailed explanations and examples."
    }
}

pub fn is_blank_answer(answer: &str) -> bool {
    answer.trim().is_empty()
}

pub fn no_answer_evaluation() -> AnswerEvaluation {
    AnswerEvaluation {
        score: 0.0,
        feedback: NO_ANSWER_FEEDBACK.to_string(),
        strengths: Vec::new(),
        improvements: vec![NO_ANSWER_IMPROVEMENT.to_string()],
    }
}

/// Cosine similarity between question and answer, embedded in one batch.
pub fn answer_relevance(question: &str, answer: &str, embedder: &dyn Embedder) -> EmbeddingResult<f64> {
    let vectors = embedder.embed_batch(&[question.to_string(), answer.to_string()])?;
    match vectors.as_slice() {
        [q, a] => Ok(cosine_similarity(q, a)),
        other => Err(EmbeddingError::CountMismatch {
            expected: 2,
            actual: other.len(),
        }),
    }
}

/// Build the evaluation from an already-known relevance.
pub fn evaluate_with_relevance(answer: &str, relevance: f64) -> AnswerEvaluation {
    if is_blank_answer(answer) {
        return no_answer_evaluation();
    }

    let quality = analyze_answer_quality(answer);
    let (strengths, improvements) = strengths_and_improvements(&quality);
    let score = score_answer(quality.completeness, relevance);

    AnswerEvaluation {
        score,
        feedback: feedback_for(score).to_string(),
        strengths,
        improvements,
    }
}

/// Evaluate `answer` against `question`. A blank answer never reaches the
/// embedder.
pub fn evaluate_answer(
    question: &str,
    answer: &str,
    embedder: &dyn Embedder,
) -> EmbeddingResult<AnswerEvaluation> {
    if is_blank_answer(answer) {
        return Ok(no_answer_evaluation());
    }
    let relevance = answer_relevance(question, answer, embedder)?;
    Ok(evaluate_with_relevance(answer, relevance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::embedding::HashedEmbedder;

    struct PanickingEmbedder;
    impl Embedder for PanickingEmbedder {
        fn embed(&self, _text: &str) -> EmbeddingResult<Vec<f32>> {
            panic!("blank answers must not be embedded");
        }
        fn dimension(&self) -> usize {
            1
        }
        fn model_name(&self) -> &str {
            "panicking"
        }
    }

    #[test]
    fn test_blank_answer_short_circuits() {
        for answer in ["", "   ", "\n\t"] {
            let eval = evaluate_answer("What is ATP?", answer, &PanickingEmbedder).unwrap();
            assert_eq!(eval.score, 0.0);
            assert_eq!(eval.feedback, NO_ANSWER_FEEDBACK);
            assert!(eval.strengths.is_empty());
            assert_eq!(eval.improvements, vec![NO_ANSWER_IMPROVEMENT.to_string()]);
        }
    }

    #[test]
    fn test_is_title_case() {
        assert!(is_title_case("Krebs"));
        assert!(!is_title_case("Cell's"));
        assert!(is_title_case("Golgi-Apparatus"));
        assert!(!is_title_case("ATP"));
        assert!(!is_title_case("mitochondria"));
        assert!(!is_title_case("1234"));
    }

    #[test]
    fn test_structure_score_indicators() {
        assert_eq!(structure_score("short"), 0.0);
        let full = "First, cells respire. However, plants photosynthesise, store sugar, and grow.";
        assert_eq!(structure_score(full), 1.0);
        assert_eq!(structure_score("One.\nTwo!"), 0.5);
    }

    #[test]
    fn test_quality_metrics() {
        let answer = "The Krebs Cycle happens in Mitochondria. For example, Pyruvate is oxidised.";
        let q = analyze_answer_quality(answer);
        assert_eq!(q.word_count, 11);
        assert_eq!(q.sentence_count, 2);
        assert!((q.avg_sentence_length - 5.5).abs() < 1e-9);
        assert!(q.has_technical_terms);
        assert!(q.has_examples);
        assert!((q.completeness - 0.11).abs() < 1e-9);
    }

    #[test]
    fn test_each_metric_contributes_once() {
        let q = analyze_answer_quality("a short reply");
        let (s, i) = strengths_and_improvements(&q);
        assert_eq!(s.len() + i.len(), 4);
        assert!(s.is_empty());
        assert!(i.contains(&"Provide more detailed explanation".to_string()));
    }

    #[test]
    fn test_score_formula() {
        assert_eq!(score_answer(1.0, 1.0), 10.0);
        assert_eq!(score_answer(1.0, 0.0), 8.0);
        assert_eq!(score_answer(0.5, 0.25), 5.5);
        assert_eq!(score_answer(0.0, -1.0), 0.0);
        assert_eq!(score_answer(0.33, 0.123), 3.5);
    }

    #[test]
    fn test_feedback_bands() {
        assert!(feedback_for(9.0).starts_with("Excellent"));
        assert!(feedback_for(8.9).starts_with("Good"));
        assert!(feedback_for(5.0).starts_with("Satisfactory"));
        assert!(feedback_for(4.9).starts_with("Needs"));
    }

    #[test]
    fn test_evaluate_with_embedder() {
        let e = HashedEmbedder::new(128);
        let eval = evaluate_answer(
            "Explain photosynthesis in plants.",
            "Photosynthesis in plants converts light into chemical energy.",
            &e,
        )
        .unwrap();
        assert!((0.0..=10.0).contains(&eval.score));
        assert_eq!(eval.strengths.len() + eval.improvements.len(), 4);
    }
}
