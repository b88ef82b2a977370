// ExamForge Data Models
// Request/response records shared by every analysis service

use serde::{Deserialize, Serialize};
use std::fmt;

// ============ Document Processing ============

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStats {
    pub word_count: usize,
    pub sentence_count: usize,
    #[serde(default)]
    pub key_topics: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedDocument {
    pub cleaned_text: String,
    pub word_count: usize,
    pub sentence_count: usize,
    /// Sentence-aligned chunks of `cleaned_text`, each at most `segment_length`
    /// chars unless a single sentence is longer.
    #[serde(default)]
    pub segments: Vec<String>,
    #[serde(default)]
    pub key_phrases: Vec<String>,
    #[serde(default)]
    pub topics: Vec<String>,
}

// ============ Multiple Choice ============

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OptionSlot {
    A,
    B,
    C,
    D,
}

impl OptionSlot {
    pub const ALL: [OptionSlot; 4] = [OptionSlot::A, OptionSlot::B, OptionSlot::C, OptionSlot::D];

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }

    pub fn letter(self) -> char {
        match self {
            Self::A => 'a',
            Self::B => 'b',
            Self::C => 'c',
            Self::D => 'd',
        }
    }
}

impl fmt::Display for OptionSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct McqOptions {
    pub a: String,
    pub b: String,
    pub c: String,
    pub d: String,
}

impl McqOptions {
    pub fn get(&self, slot: OptionSlot) -> &str {
        match slot {
            OptionSlot::A => &self.a,
            OptionSlot::B => &self.b,
            OptionSlot::C => &self.c,
            OptionSlot::D => &self.d,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (OptionSlot, &str)> {
        OptionSlot::ALL.into_iter().map(move |slot| (slot, self.get(slot)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct McqItem {
    pub question: String,
    pub options: McqOptions,
    /// Slot holding the correct-content string.
    pub correct: OptionSlot,
}

impl McqItem {
    pub fn correct_text(&self) -> &str {
        self.options.get(self.correct)
    }
}

// ============ Answer Assessment ============

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEvaluation {
    /// 0.0 ..= 10.0, one decimal place.
    pub score: f64,
    pub feedback: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnswerQuality {
    pub word_count: usize,
    pub sentence_count: usize,
    pub avg_sentence_length: f64,
    pub has_technical_terms: bool,
    pub has_examples: bool,
    pub structure_score: f64,
    pub completeness: f64,
}

// ============ AI Detection ============

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Verdict {
    #[serde(rename = "AI-generated")]
    AiGenerated,
    #[serde(rename = "Mixed")]
    Mixed,
    #[serde(rename = "Human-written")]
    HumanWritten,
}

impl Verdict {
    pub fn from_probability(prob: f64) -> Self {
        if prob > 0.7 {
            Self::AiGenerated
        } else if prob > 0.4 {
            Self::Mixed
        } else {
            Self::HumanWritten
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AiGenerated => "AI-generated",
            Self::Mixed => "Mixed",
            Self::HumanWritten => "Human-written",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DetectionFeatures {
    pub avg_sentence_length: f64,
    pub readability_score: f64,
    pub ai_word_ratio: f64,
    pub repetition_ratio: f64,
    /// Population standard deviation of per-sentence word counts.
    pub sentence_variation: f64,
    pub word_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AiDetectionResult {
    pub ai_probability: f64,
    pub features: DetectionFeatures,
    pub verdict: Verdict,
}

impl Default for AiDetectionResult {
    fn default() -> Self {
        Self {
            ai_probability: 0.0,
            features: DetectionFeatures::default(),
            verdict: Verdict::HumanWritten,
        }
    }
}

// ============ Rewriting ============

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RewriteResult {
    pub improved_text: String,
    /// At most three entries, never empty.
    pub changes: Vec<String>,
}

// ============ Study Pack ============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyPack {
    pub request_id: String,
    pub stats: DocumentStats,
    pub document: ProcessedDocument,
    pub questions: Vec<String>,
    pub mcqs: Vec<McqItem>,
    pub summary: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_thresholds() {
        assert_eq!(Verdict::from_probability(0.71), Verdict::AiGenerated);
        assert_eq!(Verdict::from_probability(0.7), Verdict::Mixed);
        assert_eq!(Verdict::from_probability(0.41), Verdict::Mixed);
        assert_eq!(Verdict::from_probability(0.4), Verdict::HumanWritten);
        assert_eq!(Verdict::from_probability(0.0), Verdict::HumanWritten);
    }

    #[test]
    fn test_verdict_serializes_as_label() {
        let json = serde_json::to_string(&Verdict::AiGenerated).unwrap();
        assert_eq!(json, "\"AI-generated\"");
        let parsed: Verdict = serde_json::from_str("\"Human-written\"").unwrap();
        assert_eq!(parsed, Verdict::HumanWritten);
    }

    #[test]
    fn test_mcq_correct_text_follows_slot() {
        let item = McqItem {
            question: "What is entropy?".to_string(),
            options: McqOptions {
                a: "x".to_string(),
                b: "y".to_string(),
                c: "right".to_string(),
                d: "z".to_string(),
            },
            correct: OptionSlot::C,
        };
        assert_eq!(item.correct_text(), "right");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["correct"], "c");
    }
}
