// Topic Model
// Segments text, weights terms with TF-IDF and decomposes them into latent topics:
// - tfidf: vocabulary selection and term weighting
// - lda: variational topic decomposition

pub mod lda;
pub mod tfidf;

use crate::services::text_processor::segment_text;
use lda::LdaConfig;
use tfidf::TfidfVectorizer;
use thiserror::Error;
use tracing::{debug, warn};

pub const INSUFFICIENT_TEXT_TOPIC: &str = "Insufficient text for topic modeling";
pub const TOPIC_ERROR: &str = "Error in topic identification";

const MAX_FEATURES: usize = 100;
const TERMS_PER_TOPIC: usize = 5;

#[derive(Error, Debug)]
pub enum TopicError {
    #[error("empty vocabulary; segments contain only stop words")]
    EmptyVocabulary,
    #[error("invalid topic count: {0}")]
    InvalidTopicCount(usize),
}

/// Fit topics over pre-segmented text. Returns one space-joined label of the
/// top terms per topic.
pub fn fit_topics(segments: &[String], num_topics: usize) -> Result<Vec<String>, TopicError> {
    let matrix = TfidfVectorizer::new(MAX_FEATURES).fit_transform(segments)?;
    let config = LdaConfig::new(num_topics.min(segments.len()));
    let model = lda::fit(&matrix.rows, &config)?;

    let topics = (0..config.n_components)
        .map(|t| {
            model
                .top_features(t, TERMS_PER_TOPIC)
                .into_iter()
                .map(|j| matrix.vocabulary[j].as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();

    Ok(topics)
}

/// Identify the main topics of `text`.
///
/// Fewer than two segments yields `[INSUFFICIENT_TEXT_TOPIC]`; any fitting
/// failure yields `[TOPIC_ERROR]`. Never panics or propagates.
pub fn identify_topics(text: &str, num_topics: usize, segment_length: usize) -> Vec<String> {
    let segments = segment_text(text, segment_length);
    if segments.len() < 2 {
        return vec![INSUFFICIENT_TEXT_TOPIC.to_string()];
    }

    match fit_topics(&segments, num_topics) {
        Ok(topics) => {
            debug!(segments = segments.len(), topics = topics.len(), "topics.fitted");
            topics
        }
        Err(e) => {
            warn!(segments = segments.len(), error = %e, "topic identification failed");
            vec![TOPIC_ERROR.to_string()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn biology_text() -> String {
        let mut text = String::new();
        for _ in 0..6 {
            text.push_str("Mitochondria produce cellular energy through respiration. ");
            text.push_str("Chloroplasts capture sunlight during photosynthesis in plant cells. ");
            text.push_str("Ribosomes assemble proteins from amino acids inside the cytoplasm. ");
        }
        text
    }

    #[test]
    fn test_two_sentences_are_insufficient() {
        let topics = identify_topics("Cells divide. Cells grow.", 5, 500);
        assert_eq!(topics, vec![INSUFFICIENT_TEXT_TOPIC.to_string()]);
    }

    #[test]
    fn test_empty_text_is_insufficient() {
        assert_eq!(identify_topics("", 5, 500), vec![INSUFFICIENT_TEXT_TOPIC.to_string()]);
    }

    #[test]
    fn test_topic_count_capped_by_segments() {
        let text = biology_text();
        let segments = segment_text(&text, 500);
        assert!(segments.len() >= 2);
        let topics = identify_topics(&text, 50, 500);
        assert_eq!(topics.len(), segments.len());
    }

    #[test]
    fn test_topics_have_five_terms_and_are_reproducible() {
        let text = biology_text();
        let a = identify_topics(&text, 2, 200);
        let b = identify_topics(&text, 2, 200);
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
        for label in &a {
            assert_eq!(label.split(' ').count(), 5);
        }
    }

    #[test]
    fn test_stopword_only_segments_fall_back_to_error_sentinel() {
        let text = "The and of it. ".repeat(60);
        assert_eq!(identify_topics(&text, 5, 100), vec![TOPIC_ERROR.to_string()]);
    }

    #[test]
    fn test_zero_topics_is_error_sentinel() {
        assert_eq!(identify_topics(&biology_text(), 0, 200), vec![TOPIC_ERROR.to_string()]);
    }
}
