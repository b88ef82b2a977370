// Configuration Storage Service
// Handles config file read/write and version backup

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

const CONFIG_VERSION: &str = "1";
const BACKUPS_TO_KEEP: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            analysis: AnalysisConfig::default(),
            embedding: EmbeddingConfig::default(),
            timeouts: TimeoutConfig::default(),
        }
    }
}

/// Knobs of the analysis pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisConfig {
    /// Target segment length in characters.
    #[serde(default = "default_segment_length")]
    pub segment_length: usize,
    #[serde(default = "default_num_questions")]
    pub num_questions: usize,
    #[serde(default = "default_num_mcqs")]
    pub num_mcqs: usize,
    #[serde(default = "default_num_topics")]
    pub num_topics: usize,
    #[serde(default = "default_summary_sentences")]
    pub summary_sentences: usize,
    #[serde(default = "default_key_phrase_count")]
    pub key_phrase_count: usize,
    #[serde(default = "default_stats_topic_count")]
    pub stats_topic_count: usize,
    /// Upload limit enforced before text reaches the pipeline.
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
    /// Seed for question, MCQ and rewrite randomness. Unset means a fresh
    /// entropy seed per call.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            segment_length: default_segment_length(),
            num_questions: default_num_questions(),
            num_mcqs: default_num_mcqs(),
            num_topics: default_num_topics(),
            summary_sentences: default_summary_sentences(),
            key_phrase_count: default_key_phrase_count(),
            stats_topic_count: default_stats_topic_count(),
            max_file_size_mb: default_max_file_size_mb(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingConfig {
    /// `"fastembed"` or `"hashed"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub cache_dir: Option<String>,
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            cache_dir: None,
            dimensions: default_dimensions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeoutConfig {
    #[serde(default = "default_timeout_secs")]
    pub embedding_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub topic_model_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            embedding_secs: default_timeout_secs(),
            topic_model_secs: default_timeout_secs(),
        }
    }
}

impl TimeoutConfig {
    pub fn embedding(&self) -> Duration {
        Duration::from_secs(self.embedding_secs)
    }

    pub fn topic_model(&self) -> Duration {
        Duration::from_secs(self.topic_model_secs)
    }
}

fn default_version() -> String { CONFIG_VERSION.to_string() }
fn default_segment_length() -> usize { 500 }
fn default_num_questions() -> usize { 10 }
fn default_num_mcqs() -> usize { 5 }
fn default_num_topics() -> usize { 5 }
fn default_summary_sentences() -> usize { 5 }
fn default_key_phrase_count() -> usize { 15 }
fn default_stats_topic_count() -> usize { 10 }
fn default_max_file_size_mb() -> u64 { 10 }
fn default_provider() -> String { "fastembed".to_string() }
fn default_model() -> String { "all-MiniLM-L6-v2".to_string() }
fn default_dimensions() -> usize { 384 }
fn default_timeout_secs() -> u64 { 30 }

pub struct ConfigStore {
    config_dir: PathBuf,
    config_file: PathBuf,
}

impl ConfigStore {
    pub fn new(config_dir: PathBuf) -> Self {
        let config_file = config_dir.join("config.json");
        Self { config_dir, config_file }
    }

    /// Get default config directory
    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("examforge"))
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Ensure config directory exists
    pub fn ensure_dir(&self) -> Result<(), String> {
        fs::create_dir_all(&self.config_dir)
            .map_err(|e| format!("Failed to create config dir: {}", e))
    }

    /// Load configuration; a missing file yields the defaults.
    pub fn load(&self) -> Result<AppConfig, String> {
        if !self.config_file.exists() {
            debug!(path = %self.config_file.display(), "no config file, using defaults");
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_file)
            .map_err(|e| format!("Failed to read config: {}", e))?;

        serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config: {}", e))
    }

    /// Load, falling back to defaults on a malformed file.
    pub fn load_or_default(&self) -> AppConfig {
        self.load().unwrap_or_else(|e| {
            warn!(path = %self.config_file.display(), error = %e, "config unreadable, using defaults");
            AppConfig::default()
        })
    }

    /// Save configuration, backing up the previous file first.
    pub fn save(&self, config: &AppConfig) -> Result<(), String> {
        self.ensure_dir()?;

        if self.config_file.exists() {
            self.create_backup()?;
        }

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(&self.config_file, content)
            .map_err(|e| format!("Failed to write config: {}", e))
    }

    fn create_backup(&self) -> Result<(), String> {
        let backup_dir = self.config_dir.join("backups");
        fs::create_dir_all(&backup_dir)
            .map_err(|e| format!("Failed to create backup dir: {}", e))?;

        // Sub-second suffix keeps back-to-back saves from overwriting each other.
        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S_%f");
        let backup_file = backup_dir.join(format!("config_{}.json", timestamp));

        fs::copy(&self.config_file, &backup_file)
            .map_err(|e| format!("Failed to create backup: {}", e))?;

        cleanup_old_backups(&backup_dir, BACKUPS_TO_KEEP)
    }
}

/// Remove old backups, keeping only the most recent `keep`.
fn cleanup_old_backups(backup_dir: &Path, keep: usize) -> Result<(), String> {
    let mut entries: Vec<_> = fs::read_dir(backup_dir)
        .map_err(|e| format!("Failed to read backup dir: {}", e))?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
        .collect();

    if entries.len() <= keep {
        return Ok(());
    }

    // File names embed the timestamp, so name order is age order.
    entries.sort_by_key(|e| e.file_name());

    let remove_count = entries.len() - keep;
    for entry in entries.iter().take(remove_count) {
        let _ = fs::remove_file(entry.path());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.analysis.segment_length, 500);
        assert_eq!(config.analysis.num_questions, 10);
        assert_eq!(config.analysis.num_mcqs, 5);
        assert_eq!(config.analysis.num_topics, 5);
        assert_eq!(config.analysis.summary_sentences, 5);
        assert_eq!(config.analysis.max_file_size_mb, 10);
        assert_eq!(config.analysis.seed, None);
        assert_eq!(config.embedding.model, "all-MiniLM-L6-v2");
        assert_eq!(config.timeouts.embedding(), Duration::from_secs(30));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let json = r#"{"analysis": {"numQuestions": 3, "seed": 9}, "embedding": {"provider": "hashed"}}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.analysis.num_questions, 3);
        assert_eq!(config.analysis.seed, Some(9));
        assert_eq!(config.analysis.segment_length, 500);
        assert_eq!(config.embedding.provider, "hashed");
        assert_eq!(config.embedding.dimensions, 384);
        assert_eq!(config.timeouts.topic_model_secs, 30);
    }

    #[test]
    fn test_config_serialization_is_camel_case() {
        let json = serde_json::to_string(&AppConfig::default()).unwrap();
        assert!(json.contains("\"segmentLength\":500"));
        assert!(json.contains("\"topicModelSecs\":30"));
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, AppConfig::default());
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("examforge"));
        assert_eq!(store.load().unwrap(), AppConfig::default());
    }

    #[test]
    fn test_save_roundtrip_and_backups() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().to_path_buf());

        let mut config = AppConfig::default();
        for n in 0..13 {
            config.analysis.num_questions = n;
            store.save(&config).unwrap();
        }

        assert_eq!(store.load().unwrap().analysis.num_questions, 12);
        let backups = fs::read_dir(dir.path().join("backups")).unwrap().count();
        assert!(backups <= BACKUPS_TO_KEEP, "kept {backups} backups");
        assert!(backups > 0);
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().to_path_buf());
        fs::write(store.config_file(), "{ not json").unwrap();
        assert!(store.load().is_err());
        assert_eq!(store.load_or_default(), AppConfig::default());
    }
}
