// Question Generator
// Template questions, multiple-choice items and extractive summaries.
// Sentence salience is cosine similarity to the whole-document embedding.

use crate::models::{McqItem, McqOptions, OptionSlot};
use crate::services::embedding::{cosine_similarity, Embedder, EmbeddingError, EmbeddingResult};
use crate::services::text_processor::{extract_key_terms, split_on_terminators};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use tracing::debug;

/// Sentences must be strictly longer than this (in chars) to qualify.
const MIN_SENTENCE_CHARS: usize = 20;
const IMPORTANT_SENTENCES: usize = 10;
const KEY_TERM_POOL: usize = 20;

pub const SUMMARY_ERROR: &str = "Error in summary generation";

pub const QUESTION_TEMPLATES: [&str; 8] = [
    "Explain the concept of {term} in your own words.",
    "What is the significance of {term}?",
    "How does {term} relate to other concepts in the text?",
    "Describe the process of {term}.",
    "What are the main characteristics of {term}?",
    "Compare and contrast {term} with similar concepts.",
    "What would happen if {term} was absent?",
    "How is {term} applied in real-world scenarios?",
];

pub const MCQ_CORRECT: &str = "The main concept discussed in the text";

pub const MCQ_DISTRACTORS: [&str; 4] = [
    "An unrelated concept",
    "A secondary topic mentioned briefly",
    "Not covered in the material",
    "A historical reference",
];

/// Terminator-split sentences longer than twenty characters, in order.
pub fn qualifying_sentences(text: &str) -> Vec<String> {
    split_on_terminators(text)
        .into_iter()
        .filter(|s| s.chars().count() > MIN_SENTENCE_CHARS)
        .map(str::to_string)
        .collect()
}

/// Sentence indices ordered by ascending similarity to the document.
///
/// Sentences and document go through one batch call so every vector comes
/// from the same provider.
fn rank_by_document_similarity(
    embedder: &dyn Embedder,
    sentences: &[String],
    document: &str,
) -> EmbeddingResult<Vec<usize>> {
    let mut batch = sentences.to_vec();
    batch.push(document.to_string());
    let mut vectors = embedder.embed_batch(&batch)?;
    if vectors.len() != batch.len() {
        return Err(EmbeddingError::CountMismatch {
            expected: batch.len(),
            actual: vectors.len(),
        });
    }

    let doc_vec = vectors.pop().unwrap_or_default();
    let scores: Vec<f64> = vectors
        .iter()
        .map(|v| cosine_similarity(v, &doc_vec))
        .collect();

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));
    Ok(order)
}

/// Up to ten salient sentences.
///
/// Ten or fewer qualifying sentences are returned as-is; otherwise the ten
/// most document-like, least similar first.
pub fn extract_important_sentences(
    text: &str,
    embedder: &dyn Embedder,
) -> EmbeddingResult<Vec<String>> {
    let sentences = qualifying_sentences(text);
    if sentences.len() <= IMPORTANT_SENTENCES {
        return Ok(sentences);
    }

    let order = rank_by_document_similarity(embedder, &sentences, text)?;
    let skip = order.len() - IMPORTANT_SENTENCES;
    Ok(order[skip..].iter().map(|&i| sentences[i].clone()).collect())
}

pub fn fill_template(template: &str, term: &str) -> String {
    template.replace("{term}", term)
}

/// Draw `num_questions` (template, key term) pairs and deduplicate.
///
/// Duplicates are dropped before truncation, so fewer than `num_questions`
/// may come back. Without key terms, falls back to `"Explain: {sentence}"`
/// over the important sentences; only that path touches the embedder.
pub fn generate_questions<R>(
    text: &str,
    num_questions: usize,
    embedder: &dyn Embedder,
    rng: &mut R,
) -> EmbeddingResult<Vec<String>>
where
    R: Rng + ?Sized,
{
    if num_questions == 0 || text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let key_terms = extract_key_terms(text, KEY_TERM_POOL);
    let mut drawn = Vec::with_capacity(num_questions);

    if key_terms.is_empty() {
        let sentences = extract_important_sentences(text, embedder)?;
        for _ in 0..num_questions {
            if let Some(sentence) = sentences.choose(rng) {
                drawn.push(format!("Explain: {}", sentence));
            }
        }
    } else {
        for _ in 0..num_questions {
            let term = key_terms.choose(rng);
            let template = QUESTION_TEMPLATES.choose(rng);
            if let (Some(term), Some(template)) = (term, template) {
                drawn.push(fill_template(template, term));
            }
        }
    }

    let mut seen = HashSet::new();
    let mut questions: Vec<String> = drawn.into_iter().filter(|q| seen.insert(q.clone())).collect();
    questions.truncate(num_questions);

    debug!(requested = num_questions, produced = questions.len(), "questions.generated");
    Ok(questions)
}

/// One item per leading key term: the fixed correct answer plus three
/// sampled distractors, shuffled across slots a-d.
pub fn generate_mcqs<R>(text: &str, num_questions: usize, rng: &mut R) -> Vec<McqItem>
where
    R: Rng + ?Sized,
{
    extract_key_terms(text, KEY_TERM_POOL)
        .into_iter()
        .take(num_questions)
        .map(|term| build_mcq(&term, &mut *rng))
        .collect()
}

fn build_mcq<R>(term: &str, rng: &mut R) -> McqItem
where
    R: Rng + ?Sized,
{
    let mut options: Vec<&str> = Vec::with_capacity(4);
    options.push(MCQ_CORRECT);
    options.extend(MCQ_DISTRACTORS.choose_multiple(rng, 3).copied());
    options.shuffle(rng);

    let correct_idx = options.iter().position(|o| *o == MCQ_CORRECT).unwrap_or(0);
    let correct = OptionSlot::from_index(correct_idx).unwrap_or(OptionSlot::A);

    McqItem {
        question: format!("What is {}?", term),
        options: McqOptions {
            a: options[0].to_string(),
            b: options[1].to_string(),
            c: options[2].to_string(),
            d: options[3].to_string(),
        },
        correct,
    }
}

/// Extractive summary of `num_sentences` sentences.
///
/// Selection is by similarity to the document; emission keeps the original
/// sentence order. Short texts return every qualifying sentence.
pub fn generate_summary(
    text: &str,
    num_sentences: usize,
    embedder: &dyn Embedder,
) -> EmbeddingResult<String> {
    if num_sentences == 0 {
        return Ok(String::new());
    }

    let sentences = qualifying_sentences(text);
    if sentences.len() <= num_sentences {
        return Ok(sentences.join(" "));
    }

    let order = rank_by_document_similarity(embedder, &sentences, text)?;
    let mut chosen: Vec<usize> = order[order.len() - num_sentences..].to_vec();
    chosen.sort_unstable();

    Ok(chosen
        .into_iter()
        .map(|i| sentences[i].as_str())
        .collect::<Vec<_>>()
        .join(" "))
}
