// ExamForge Core Services
// Text analysis pipeline: cleaning and stats, topics, embeddings, question
// generation, answer assessment, AI-text detection and rewriting.

pub mod assessment;
pub mod config_store;
pub mod detection;
pub mod embedding;
pub mod file_handler;
pub mod generator;
pub mod rewriter;
pub mod text_processor;
pub mod topics;

pub use config_store::{AnalysisConfig, AppConfig, ConfigStore, EmbeddingConfig, TimeoutConfig};
pub use embedding::{cosine_similarity, Embedder, EmbeddingError, SharedEmbedder};
pub use file_handler::FileError;
pub use text_processor::{
    clean_text, document_stats, extract_key_phrases, extract_key_terms, process_text, segment_text,
    split_sentences,
};
pub use topics::{identify_topics, TopicError};
