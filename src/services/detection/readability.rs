// Readability
// Flesch reading ease with a vowel-group syllable estimate.

use crate::services::text_processor::{split_on_terminators, tokenize_words};

/// Estimated syllables in one word: vowel groups, minus a silent trailing
/// "e", never fewer than one.
pub fn count_syllables(word: &str) -> usize {
    let lowered: Vec<char> = word
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphabetic())
        .collect();
    if lowered.is_empty() {
        return 0;
    }

    let is_vowel = |c: char| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
    let mut groups = 0usize;
    let mut prev_vowel = false;
    for &c in &lowered {
        let v = is_vowel(c);
        if v && !prev_vowel {
            groups += 1;
        }
        prev_vowel = v;
    }

    let n = lowered.len();
    // "make" -> 1, but "table" and "free" keep their final group
    if n > 2 && lowered[n - 1] == 'e' && lowered[n - 2] != 'l' && lowered[n - 2] != 'e' && groups > 1 {
        groups -= 1;
    }
    groups.max(1)
}

/// 206.835 - 1.015 * (words / sentences) - 84.6 * (syllables / words).
///
/// Returns 0 for text without words.
pub fn flesch_reading_ease(text: &str) -> f64 {
    let words = tokenize_words(text);
    if words.is_empty() {
        return 0.0;
    }
    let sentences = split_on_terminators(text).len().max(1);
    let syllables: usize = words.iter().map(|w| count_syllables(w)).sum();

    let words_per_sentence = words.len() as f64 / sentences as f64;
    let syllables_per_word = syllables as f64 / words.len() as f64;
    206.835 - 1.015 * words_per_sentence - 84.6 * syllables_per_word
}
