// TF-IDF Vectorizer
// Vocabulary capped by corpus frequency, smoothed idf, L2-normalized rows

use super::TopicError;
use crate::services::text_processor::is_stop_word;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Two or more word chars, same shape as the classic `\b\w\w+\b` pattern.
    RE.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("tfidf token regex"))
}

#[derive(Debug, Clone)]
pub struct TfidfMatrix {
    /// Alphabetically ordered feature names; column `j` of every row is `vocabulary[j]`.
    pub vocabulary: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    max_features: usize,
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self { max_features: 100 }
    }
}

impl TfidfVectorizer {
    pub fn new(max_features: usize) -> Self {
        Self { max_features }
    }

    fn tokenize(doc: &str) -> Vec<String> {
        let lowered = doc.to_lowercase();
        token_re()
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|t| !is_stop_word(t))
            .map(str::to_string)
            .collect()
    }

    pub fn fit_transform(&self, docs: &[String]) -> Result<TfidfMatrix, TopicError> {
        let tokenized: Vec<Vec<String>> = docs.iter().map(|d| Self::tokenize(d)).collect();

        let mut corpus_freq: HashMap<&str, usize> = HashMap::new();
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for tokens in &tokenized {
            let mut seen: Vec<&str> = Vec::new();
            for t in tokens {
                *corpus_freq.entry(t.as_str()).or_insert(0) += 1;
                if !seen.contains(&t.as_str()) {
                    seen.push(t.as_str());
                    *doc_freq.entry(t.as_str()).or_insert(0) += 1;
                }
            }
        }

        if corpus_freq.is_empty() {
            return Err(TopicError::EmptyVocabulary);
        }

        // Keep the most frequent terms; ties resolve alphabetically.
        let mut ranked: Vec<(&str, usize)> = corpus_freq.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(self.max_features);

        let mut vocabulary: Vec<String> = ranked.iter().map(|(t, _)| t.to_string()).collect();
        vocabulary.sort();
        let column: HashMap<&str, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(i, t)| (t.as_str(), i))
            .collect();

        let n_docs = docs.len() as f64;
        let idf: Vec<f64> = vocabulary
            .iter()
            .map(|t| {
                let df = doc_freq.get(t.as_str()).copied().unwrap_or(0) as f64;
                ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        let rows = tokenized
            .iter()
            .map(|tokens| {
                let mut row = vec![0.0f64; vocabulary.len()];
                for t in tokens {
                    if let Some(&j) = column.get(t.as_str()) {
                        row[j] += 1.0;
                    }
                }
                for (j, v) in row.iter_mut().enumerate() {
                    *v *= idf[j];
                }
                let norm = row.iter().map(|x| x * x).sum::<f64>().sqrt();
                if norm > f64::EPSILON {
                    for v in &mut row {
                        *v /= norm;
                    }
                }
                row
            })
            .collect();

        Ok(TfidfMatrix { vocabulary, rows })
    }
}
