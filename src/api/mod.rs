// Analyzer API
// Public entry points of the analysis pipeline. Every call here is a fault
// boundary: internal failures are logged and turned into the documented
// sentinel or degraded result instead of being returned to the caller.

use crate::models::{
    AiDetectionResult, AnswerEvaluation, DocumentStats, McqItem, ProcessedDocument, RewriteResult,
    StudyPack,
};
use crate::services::assessment::{self, evaluate_with_relevance, is_blank_answer, no_answer_evaluation};
use crate::services::config_store::AppConfig;
use crate::services::detection;
use crate::services::embedding::{build_embedder, EmbeddingError, SharedEmbedder};
use crate::services::file_handler::{self, FileError};
use crate::services::generator::{self, SUMMARY_ERROR};
use crate::services::rewriter;
use crate::services::text_processor;
use crate::services::topics::{identify_topics, TopicError, TOPIC_ERROR};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    #[error(transparent)]
    Topic(#[from] TopicError),
    #[error(transparent)]
    File(#[from] FileError),
    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: &'static str, secs: u64 },
    #[error("background task failed: {0}")]
    Task(String),
}

/// Run CPU-bound work on the blocking pool, bounded by `limit`.
///
/// On timeout the blocking task keeps running to completion in the
/// background; its result is discarded.
async fn run_bounded<T, F>(operation: &'static str, limit: Duration, work: F) -> Result<T, AnalysisError>
where
    F: FnOnce() -> Result<T, AnalysisError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::time::timeout(limit, tokio::task::spawn_blocking(work)).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(AnalysisError::Task(join_err.to_string())),
        Err(_) => Err(AnalysisError::Timeout {
            operation,
            secs: limit.as_secs(),
        }),
    }
}

/// Shared analysis handle. Holds the configuration and the process-wide
/// embedder; holds no per-request state, so one instance can serve
/// concurrent calls.
#[derive(Clone)]
pub struct Analyzer {
    config: AppConfig,
    embedder: SharedEmbedder,
}

impl Analyzer {
    /// Build the embedder described by `config.embedding` (loaded once).
    pub fn new(config: AppConfig) -> Self {
        let embedder = build_embedder(&config.embedding);
        Self { config, embedder }
    }

    pub fn with_embedder(config: AppConfig, embedder: SharedEmbedder) -> Self {
        Self { config, embedder }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn embedder(&self) -> &SharedEmbedder {
        &self.embedder
    }

    /// Seeded from `analysis.seed` when set, otherwise from OS entropy.
    fn rng(&self) -> StdRng {
        match self.config.analysis.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    fn embedding_limit(&self) -> Duration {
        self.config.timeouts.embedding()
    }

    // ---- pure text operations ----

    pub fn clean_text(&self, text: &str) -> String {
        text_processor::clean_text(text)
    }

    pub fn segment_text(&self, text: &str) -> Vec<String> {
        text_processor::segment_text(text, self.config.analysis.segment_length)
    }

    pub fn extract_key_phrases(&self, text: &str) -> Vec<String> {
        text_processor::extract_key_phrases(text, self.config.analysis.key_phrase_count)
    }

    pub fn document_stats(&self, text: &str) -> DocumentStats {
        text_processor::document_stats(text, self.config.analysis.stats_topic_count)
    }

    pub fn generate_mcqs(&self, text: &str, num_questions: usize) -> Vec<McqItem> {
        generator::generate_mcqs(text, num_questions, &mut self.rng())
    }

    pub fn detect_ai_content(&self, text: &str) -> AiDetectionResult {
        detection::analyze_text(text)
    }

    /// Not deterministic unless `analysis.seed` is set.
    pub fn rewrite_text(&self, text: &str) -> RewriteResult {
        rewriter::rewrite_text(text, &mut self.rng())
    }

    /// File collaborator: validate against the upload limit, then extract.
    pub fn load_document(&self, path: &Path) -> Result<String, AnalysisError> {
        file_handler::validate_file(path, self.config.analysis.max_file_size_mb)?;
        Ok(file_handler::extract_text(path)?)
    }

    // ---- bounded operations ----

    pub async fn identify_topics(&self, text: &str, num_topics: usize) -> Vec<String> {
        let text = text.to_string();
        let segment_length = self.config.analysis.segment_length;
        let limit = self.config.timeouts.topic_model();

        let result = run_bounded("topic_model", limit, move || {
            Ok(identify_topics(&text, num_topics, segment_length))
        })
        .await;

        result.unwrap_or_else(|e| {
            warn!(error = %e, "topic identification degraded");
            vec![TOPIC_ERROR.to_string()]
        })
    }

    pub async fn process_text(&self, text: &str) -> ProcessedDocument {
        let mut doc = text_processor::process_text_without_topics(text, &self.config.analysis);
        if doc.cleaned_text.is_empty() {
            return doc;
        }
        doc.topics = self
            .identify_topics(&doc.cleaned_text, self.config.analysis.num_topics)
            .await;
        doc
    }

    /// Fewer than `num_questions` may come back after deduplication. Any
    /// failure yields an empty list.
    pub async fn generate_questions(&self, text: &str, num_questions: usize) -> Vec<String> {
        let text = text.to_string();
        let embedder = self.embedder.clone();
        let mut rng = self.rng();

        let result = run_bounded("embedding", self.embedding_limit(), move || {
            Ok(generator::generate_questions(&text, num_questions, embedder.as_ref(), &mut rng)?)
        })
        .await;

        result.unwrap_or_else(|e| {
            warn!(error = %e, "question generation degraded");
            Vec::new()
        })
    }

    pub async fn generate_summary(&self, text: &str, num_sentences: usize) -> String {
        let text = text.to_string();
        let embedder = self.embedder.clone();

        let result = run_bounded("embedding", self.embedding_limit(), move || {
            Ok(generator::generate_summary(&text, num_sentences, embedder.as_ref())?)
        })
        .await;

        result.unwrap_or_else(|e| {
            warn!(error = %e, "summary generation degraded");
            SUMMARY_ERROR.to_string()
        })
    }

    /// When relevance cannot be computed the answer is scored with zero
    /// relevance bonus.
    pub async fn evaluate_answer(&self, question: &str, answer: &str) -> AnswerEvaluation {
        if is_blank_answer(answer) {
            return no_answer_evaluation();
        }

        let (q, a) = (question.to_string(), answer.to_string());
        let embedder = self.embedder.clone();
        let relevance = run_bounded("embedding", self.embedding_limit(), move || {
            Ok(assessment::answer_relevance(&q, &a, embedder.as_ref())?)
        })
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "answer relevance unavailable, scoring without bonus");
            0.0
        });

        evaluate_with_relevance(answer, relevance)
    }

    /// Stats, processed document, questions, MCQs and summary in one call.
    /// Each part degrades on its own.
    pub async fn prepare_study_pack(&self, text: &str) -> StudyPack {
        let started = Instant::now();
        let request_id = uuid::Uuid::new_v4().to_string();
        let analysis = &self.config.analysis;

        let (document, questions, summary) = tokio::join!(
            self.process_text(text),
            self.generate_questions(text, analysis.num_questions),
            self.generate_summary(text, analysis.summary_sentences),
        );

        let pack = StudyPack {
            request_id,
            stats: self.document_stats(text),
            document,
            questions,
            mcqs: self.generate_mcqs(text, analysis.num_mcqs),
            summary,
            version: env!("CARGO_PKG_VERSION").to_string(),
        };

        info!(
            request_id = %pack.request_id,
            words = pack.stats.word_count,
            questions = pack.questions.len(),
            mcqs = pack.mcqs.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "study_pack.prepared"
        );
        pack
    }
}
