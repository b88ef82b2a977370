// Text Processing Service
// Cleaning, sentence boundaries, segmentation and term statistics

use crate::models::{DocumentStats, ProcessedDocument};
use crate::services::config_store::AnalysisConfig;
use crate::services::topics::identify_topics;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

/// English stop words shared by key-phrase extraction and topic modeling.
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "ain", "all",
    "almost", "alone", "along", "already", "also", "although", "always", "am", "among",
    "amongst", "an", "and", "another", "any", "anyhow", "anyone", "anything", "anyway",
    "anywhere", "are", "aren", "around", "as", "at", "back", "be", "became", "because", "become",
    "becomes", "becoming", "been", "before", "beforehand", "behind", "being", "below", "beside",
    "besides", "between", "beyond", "both", "but", "by", "can", "cannot", "could", "couldn",
    "did", "didn", "do", "does", "doesn", "doing", "don", "done", "down", "due", "during",
    "each", "either", "else", "elsewhere", "enough", "etc", "even", "ever", "every", "everyone",
    "everything", "everywhere", "except", "few", "first", "for", "former", "formerly", "from",
    "further", "had", "hadn", "has", "hasn", "have", "haven", "having", "he", "hence", "her",
    "here", "hereafter", "hereby", "herein", "hers", "herself", "him", "himself", "his", "how",
    "however", "i", "if", "in", "indeed", "into", "is", "isn", "it", "its", "itself", "just",
    "last", "latter", "least", "less", "ll", "made", "many", "may", "me", "meanwhile", "might",
    "mightn", "mine", "more", "moreover", "most", "mostly", "much", "must", "mustn", "my",
    "myself", "namely", "needn", "neither", "never", "nevertheless", "next", "no", "nobody",
    "none", "nor", "not", "nothing", "now", "nowhere", "of", "off", "often", "on", "once",
    "one", "only", "onto", "or", "other", "others", "otherwise", "our", "ours", "ourselves",
    "out", "over", "own", "per", "perhaps", "please", "rather", "re", "same", "seem", "seemed",
    "seeming", "seems", "several", "shan", "she", "should", "shouldn", "since", "so", "some",
    "somehow", "someone", "something", "sometime", "sometimes", "somewhere", "still", "such",
    "than", "that", "the", "their", "theirs", "them", "themselves", "then", "thence", "there",
    "thereafter", "thereby", "therefore", "therein", "thereupon", "these", "they", "this",
    "those", "though", "through", "throughout", "thru", "thus", "to", "together", "too",
    "toward", "towards", "under", "until", "up", "upon", "us", "very", "via", "was", "wasn",
    "we", "well", "were", "weren", "what", "whatever", "when", "whence", "whenever", "where",
    "whereafter", "whereas", "whereby", "wherein", "whereupon", "wherever", "whether", "which",
    "while", "whither", "who", "whoever", "whole", "whom", "whose", "why", "will", "with",
    "within", "without", "won", "would", "wouldn", "yet", "you", "your", "yours", "yourself",
    "yourselves",
];

/// Abbreviations whose trailing period does not end a sentence.
const ABBREVIATIONS: &[&str] = &[
    "e.g", "i.e", "etc", "vs", "mr", "mrs", "ms", "dr", "prof", "fig", "eq", "inc", "ltd", "st",
    "jr", "sr", "approx", "dept", "cf", "al",
];

const MIN_KEY_TERM_CHARS: usize = 4;

pub fn is_stop_word(word: &str) -> bool {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| ENGLISH_STOP_WORDS.iter().copied().collect())
        .contains(word)
}

fn strip_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\p{L}\p{N}\s.,!?;:]").expect("strip regex"))
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"))
}

fn word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[\p{L}\p{N}]+(?:['\u{2019}-][\p{L}\p{N}]+)*").expect("word regex")
    })
}

fn terminator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]+").expect("terminator regex"))
}

/// Normalize typographic punctuation to its ASCII counterpart.
pub fn normalize_punctuation(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let s = text
        .replace(['\u{201c}', '\u{201d}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{2013}', '\u{2014}'], "-")
        .replace('\u{2026}', "...")
        .replace(['\u{00A0}', '\u{3000}'], " ")
        .replace("\r\n", "\n")
        .replace('\r', "\n");

    s.lines()
        .map(|ln| ln.trim())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Strip everything except letters, digits, whitespace and `. , ! ? ; :`,
/// then collapse whitespace runs to single spaces.
///
/// Stripping happens before collapsing so that `clean_text` is a projection:
/// cleaning an already-clean string returns it unchanged.
pub fn clean_text(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    let stripped = strip_re().replace_all(text, "");
    whitespace_re()
        .replace_all(&stripped, " ")
        .trim()
        .to_string()
}

/// Word tokens: runs of letters/digits, allowing inner apostrophes and
/// hyphens ("don't", "well-known").
pub fn tokenize_words(text: &str) -> Vec<&str> {
    word_re().find_iter(text).map(|m| m.as_str()).collect()
}

/// Split on runs of `.`, `!`, `?`, returning trimmed non-empty pieces.
///
/// This is the coarse splitter the heuristics (generator, assessment,
/// detector, rewriter) are calibrated against; `split_sentences` is the
/// boundary-aware one used for statistics and segmentation.
pub fn split_on_terminators(text: &str) -> Vec<&str> {
    terminator_re()
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SentenceOffset {
    pub text: String,
    /// UTF-8 byte offset of the sentence span.
    pub start: usize,
    pub end: usize,
}

fn is_closing_mark(ch: char) -> bool {
    matches!(ch, '"' | '\'' | ')' | ']' | '\u{201d}' | '\u{2019}')
}

fn is_initial(word: &str) -> bool {
    let mut chars = word.trim_end_matches('.').chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_uppercase())
}

fn is_capitalized(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase)
}

/// A period that looks like a boundary but belongs to an abbreviation
/// ("Dr.", "e.g."), a numbering "No." before a digit, or an initial inside
/// a name ("Author J. R. Tolkien"). A lone capital after a lowercase word, as in
/// "vitamin C.", still ends the sentence.
fn is_false_boundary(text: &str, span_start: usize, period_at: usize, next_char: Option<char>) -> bool {
    let before = &text[span_start..period_at];
    let mut words = before
        .rsplit(|c: char| c.is_whitespace() || c == '(')
        .filter(|w| !w.is_empty());
    let last_word = words.next().unwrap_or("");
    let lowered = last_word.to_lowercase();

    if lowered == "no" {
        return next_char.is_some_and(|c| c.is_ascii_digit());
    }
    if ABBREVIATIONS.contains(&lowered.as_str()) {
        return true;
    }

    is_initial(last_word)
        && next_char.is_some_and(char::is_uppercase)
        && words.next().map_or(true, |prev| is_initial(prev) || is_capitalized(prev))
}

/// Sentence boundary detection with offset tracking.
///
/// A boundary is a run of `.`, `!` or `?` (plus closing quotes/brackets)
/// followed by whitespace or end of text. Decimal points never qualify
/// because they are followed by a digit; abbreviations, initials and
/// lowercase continuations are rejected for single periods.
pub fn split_sentences(text: &str) -> Vec<SentenceOffset> {
    if text.trim().is_empty() {
        return vec![];
    }

    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut sentences = Vec::new();
    let mut span_start = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        let (pos, ch) = chars[i];
        if !matches!(ch, '.' | '!' | '?') {
            i += 1;
            continue;
        }

        let mut j = i + 1;
        while j < chars.len() && matches!(chars[j].1, '.' | '!' | '?') {
            j += 1;
        }
        let single_period = ch == '.' && j == i + 1;
        while j < chars.len() && is_closing_mark(chars[j].1) {
            j += 1;
        }

        let at_end = j >= chars.len();
        if !at_end && !chars[j].1.is_whitespace() {
            i = j;
            continue;
        }

        let next_char = chars[j..].iter().map(|(_, c)| *c).find(|c| !c.is_whitespace());
        if single_period && !at_end && is_false_boundary(text, span_start, pos, next_char) {
            i = j;
            continue;
        }

        let end = if at_end { text.len() } else { chars[j].0 };
        push_sentence(&mut sentences, text, span_start, end);
        span_start = end;
        i = j;
    }

    push_sentence(&mut sentences, text, span_start, text.len());
    sentences
}

fn push_sentence(out: &mut Vec<SentenceOffset>, text: &str, start: usize, end: usize) {
    let span = &text[start..end];
    let trimmed = span.trim();
    if trimmed.is_empty() {
        return;
    }
    let lead = span.len() - span.trim_start().len();
    out.push(SentenceOffset {
        text: trimmed.to_string(),
        start: start + lead,
        end: start + lead + trimmed.len(),
    });
}

/// Greedily pack whole sentences into chunks of at most `max_len` chars.
/// A sentence longer than `max_len` becomes its own chunk, unsplit.
pub fn segment_text(text: &str, max_len: usize) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for sent in split_sentences(text) {
        // Char count, not bytes, so the bound behaves the same for non-ASCII text.
        let sent_len = sent.text.chars().count();

        if current.is_empty() {
            current = sent.text;
            current_chars = sent_len;
            continue;
        }

        if current_chars + 1 + sent_len <= max_len {
            current.push(' ');
            current.push_str(&sent.text);
            current_chars += 1 + sent_len;
        } else {
            segments.push(std::mem::take(&mut current));
            current = sent.text;
            current_chars = sent_len;
        }
    }

    if !current.is_empty() {
        segments.push(current);
    }

    segments
}

/// Rank terms by frequency; ties keep first-seen order.
pub(crate) fn rank_terms<I>(terms: I, top_n: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();

    for term in terms {
        match index.get(&term) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(term.clone(), counts.len());
                counts.push((term, 1));
            }
        }
    }

    // sort_by is stable, which is what keeps ties in first-seen order
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().take(top_n).map(|(t, _)| t).collect()
}

fn is_key_candidate(word: &str) -> bool {
    word.chars().count() >= MIN_KEY_TERM_CHARS && !is_stop_word(word)
}

/// Most frequent alphanumeric, non-stopword tokens of at least four chars.
pub fn extract_key_phrases(text: &str, top_n: usize) -> Vec<String> {
    let candidates = tokenize_words(text)
        .into_iter()
        .map(str::to_lowercase)
        .filter(|w| w.chars().all(char::is_alphanumeric))
        .filter(|w| is_key_candidate(w));
    rank_terms(candidates, top_n)
}

/// Like `extract_key_phrases` but alphabetic-only; feeds question templates.
pub fn extract_key_terms(text: &str, top_n: usize) -> Vec<String> {
    let candidates = tokenize_words(text)
        .into_iter()
        .map(str::to_lowercase)
        .filter(|w| w.chars().all(char::is_alphabetic))
        .filter(|w| is_key_candidate(w));
    rank_terms(candidates, top_n)
}

pub fn document_stats(text: &str, top_n: usize) -> DocumentStats {
    if text.trim().is_empty() {
        return DocumentStats::default();
    }

    DocumentStats {
        word_count: tokenize_words(text).len(),
        sentence_count: split_sentences(text).len(),
        key_topics: extract_key_phrases(text, top_n),
    }
}

/// Everything except topic modeling; callers that bound topic fitting with a
/// timeout build on this.
pub fn process_text_without_topics(text: &str, config: &AnalysisConfig) -> ProcessedDocument {
    let cleaned_text = clean_text(text);
    if cleaned_text.is_empty() {
        return ProcessedDocument::default();
    }

    ProcessedDocument {
        word_count: tokenize_words(&cleaned_text).len(),
        sentence_count: split_sentences(&cleaned_text).len(),
        segments: segment_text(&cleaned_text, config.segment_length),
        key_phrases: extract_key_phrases(&cleaned_text, config.key_phrase_count),
        topics: Vec::new(),
        cleaned_text,
    }
}

/// Full document pipeline: clean, count, segment, key phrases, topics.
pub fn process_text(text: &str, config: &AnalysisConfig) -> ProcessedDocument {
    let mut doc = process_text_without_topics(text, config);
    if doc.cleaned_text.is_empty() {
        return doc;
    }
    doc.topics = identify_topics(&doc.cleaned_text, config.num_topics, config.segment_length);
    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_punctuation() {
        let input = "Hello\u{201c}World\u{201d} \u{2014} it\u{2019}s";
        let output = normalize_punctuation(input);
        assert_eq!(output, "Hello\"World\" - it's");
    }

    #[test]
    fn test_clean_text_strips_and_collapses() {
        assert_eq!(clean_text("  Hello,\t\n world!!  (ok) #tag "), "Hello, world!! ok tag");
        assert_eq!(clean_text("a  @ b"), "a b");
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text("   \n\t"), "");
    }

    #[test]
    fn test_clean_text_is_idempotent() {
        let once = clean_text("Cells -- the *unit* of life;   see: fig 2!");
        assert_eq!(clean_text(&once), once);
    }

    #[test]
    fn test_split_sentences_basic() {
        let s = split_sentences("First one. Second one! Third one?");
        let texts: Vec<&str> = s.iter().map(|x| x.text.as_str()).collect();
        assert_eq!(texts, vec!["First one.", "Second one!", "Third one?"]);
        assert_eq!(&"First one. Second one! Third one?"[s[1].start..s[1].end], "Second one!");
    }

    #[test]
    fn test_split_sentences_keeps_decimals_and_abbreviations() {
        let text = "Pi is about 3.14 in value. Dr. Smith agreed, e.g. in class. J. Doe left.";
        let s = split_sentences(text);
        let texts: Vec<&str> = s.iter().map(|x| x.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Pi is about 3.14 in value.",
                "Dr. Smith agreed, e.g. in class.",
                "J. Doe left."
            ]
        );
    }

    fn sentence_texts(text: &str) -> Vec<String> {
        split_sentences(text).into_iter().map(|s| s.text).collect()
    }

    #[test]
    fn test_split_sentences_no_is_a_word_unless_numbering() {
        assert_eq!(
            sentence_texts("Does the enzyme survive boiling? The answer is no. It denatures quickly."),
            vec![
                "Does the enzyme survive boiling?",
                "The answer is no.",
                "It denatures quickly."
            ]
        );
        assert_eq!(sentence_texts("See item No. 4 in the table.").len(), 1);
    }

    #[test]
    fn test_split_sentences_capital_after_lowercase_word_ends_sentence() {
        assert_eq!(
            sentence_texts("Patients need vitamin C. It supports collagen synthesis."),
            vec!["Patients need vitamin C.", "It supports collagen synthesis."]
        );
        assert_eq!(sentence_texts("Author J. R. Tolkien wrote it.").len(), 1);
    }

    #[test]
    fn test_split_sentences_lowercase_start_is_still_a_sentence() {
        assert_eq!(
            sentence_texts("Short one. lowercase openings happen in notes."),
            vec!["Short one.", "lowercase openings happen in notes."]
        );
        assert_eq!(sentence_texts("Enzymes, e.g. amylase, act fast.").len(), 1);
    }

    #[test]
    fn test_split_sentences_handles_quotes_and_trailing_text() {
        let s = split_sentences("He said \"stop.\" Then he left and never came back");
        assert_eq!(s.len(), 2);
        assert_eq!(s[0].text, "He said \"stop.\"");
        assert_eq!(s[1].text, "Then he left and never came back");
    }

    #[test]
    fn test_split_sentences_empty() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("   ").is_empty());
    }

    #[test]
    fn test_segment_text_packs_greedily() {
        let text = "Aaaa aaaa. Bbbb bbbb. Cccc cccc.";
        assert_eq!(segment_text(text, 21), vec!["Aaaa aaaa. Bbbb bbbb.", "Cccc cccc."]);
        assert_eq!(segment_text(text, 500).len(), 1);
    }

    #[test]
    fn test_segment_text_oversized_sentence_stands_alone() {
        let long = format!("{}.", "word ".repeat(40).trim());
        let text = format!("Short one. {} Short two.", long);
        let segments = segment_text(&text, 50);
        assert_eq!(segments, vec!["Short one.".to_string(), long, "Short two.".to_string()]);
    }

    #[test]
    fn test_key_phrases_rank_and_filter() {
        let text = "The enzyme binds. The enzyme folds. A protein binds the enzyme. Cat cat cat.";
        let phrases = extract_key_phrases(text, 3);
        assert_eq!(phrases, vec!["enzyme", "binds", "folds"]);
        assert!(phrases.iter().all(|p| p.chars().count() >= 4 && !is_stop_word(p)));
    }

    #[test]
    fn test_key_terms_skip_numbers() {
        let terms = extract_key_terms("Year 2024 2024 2024 brought photosynthesis.", 5);
        assert_eq!(terms, vec!["year", "brought", "photosynthesis"]);
    }

    #[test]
    fn test_document_stats() {
        let stats = document_stats("Mitochondria make energy. Cells need energy!", 10);
        assert_eq!(stats.word_count, 6);
        assert_eq!(stats.sentence_count, 2);
        assert_eq!(stats.key_topics[0], "energy");
    }

    #[test]
    fn test_hyphenated_compounds_are_single_words() {
        let text = "A well-known enzyme. The well-known result holds.";
        assert_eq!(tokenize_words(text), vec!["A", "well-known", "enzyme", "The", "well-known", "result", "holds"]);
        let stats = document_stats(text, 10);
        assert_eq!(stats.word_count, text.split_whitespace().count());
        assert!(!stats.key_topics.iter().any(|t| t == "known" || t == "well-known"));
    }

    #[test]
    fn test_document_stats_empty() {
        assert_eq!(document_stats("", 10), DocumentStats::default());
    }

    #[test]
    fn test_split_on_terminators() {
        assert_eq!(split_on_terminators("One. Two!! Three?  "), vec!["One", "Two", "Three"]);
        assert!(split_on_terminators("...").is_empty());
    }

    #[test]
    fn test_process_text_short_document_gets_topic_sentinel() {
        let doc = process_text("Just one small sentence here.", &AnalysisConfig::default());
        assert_eq!(doc.segments.len(), 1);
        assert_eq!(doc.topics, vec!["Insufficient text for topic modeling".to_string()]);
    }

    #[test]
    fn test_process_text_empty() {
        let doc = process_text("", &AnalysisConfig::default());
        assert!(doc.cleaned_text.is_empty());
        assert!(doc.segments.is_empty());
        assert!(doc.topics.is_empty());
    }
}
