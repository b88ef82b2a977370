// Text Rewriter
// Sentence-level transformations that vary machine-uniform prose: leading
// transitions, opening-clause variation and plain-word substitution.
//
// Transformation choice is random, so two calls on the same text generally
// differ. Pass a seeded RNG to pin the output.

use crate::models::RewriteResult;
use crate::services::text_processor::split_on_terminators;
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

const MIN_WORDS: usize = 5;
const MAX_CHANGES: usize = 3;
const NOTE_PREVIEW_CHARS: usize = 50;

pub const TRANSITIONS: [&str; 5] = ["Additionally", "Furthermore", "Moreover", "However", "Therefore"];

pub const FALLBACK_CHANGES: [&str; 2] = ["Added sentence variety", "Improved flow and coherence"];

const OPENINGS: [&str; 3] = ["One important aspect is that", "Specifically,", "In this context,"];

const SIMPLIFICATIONS: [(&str, &str); 5] = [
    ("utilize", "use"),
    ("facilitate", "help"),
    ("implement", "use"),
    ("numerous", "many"),
    ("terminate", "end"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    AddTransition,
    VaryStart,
    Simplify,
}

impl Transform {
    pub const ALL: [Transform; 3] = [Transform::AddTransition, Transform::VaryStart, Transform::Simplify];

    fn apply<R>(self, sentence: &str, rng: &mut R) -> String
    where
        R: Rng + ?Sized,
    {
        match self {
            Transform::AddTransition => add_transition(sentence, rng),
            Transform::VaryStart => vary_start(sentence, rng),
            Transform::Simplify => simplify_language(sentence),
        }
    }
}

fn simplification_res() -> &'static [(Regex, &'static str)] {
    static RES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RES.get_or_init(|| {
        SIMPLIFICATIONS
            .iter()
            .map(|(complex, simple)| {
                let re = Regex::new(&format!(r"(?i)\b{}\b", complex)).expect("simplification regex");
                (re, *simple)
            })
            .collect()
    })
}

fn lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Prefix a transition word unless the sentence already opens with one.
pub fn add_transition<R>(sentence: &str, rng: &mut R) -> String
where
    R: Rng + ?Sized,
{
    if TRANSITIONS.iter().any(|t| sentence.starts_with(t)) {
        return sentence.to_string();
    }
    match TRANSITIONS.choose(rng) {
        Some(t) => format!("{}, {}", t, lowercase_first(sentence)),
        None => sentence.to_string(),
    }
}

/// Replace a "The ..."/"This ..." opening with a contextual clause.
pub fn vary_start<R>(sentence: &str, rng: &mut R) -> String
where
    R: Rng + ?Sized,
{
    let lowered = sentence.to_lowercase();
    if !(lowered.starts_with("the ") || lowered.starts_with("this ")) {
        return sentence.to_string();
    }
    match OPENINGS.choose(rng) {
        Some(opening) => format!("{} {}", opening, lowercase_first(sentence)),
        None => sentence.to_string(),
    }
}

/// Case-insensitive whole-word replacement of complex words.
pub fn simplify_language(sentence: &str) -> String {
    simplification_res()
        .iter()
        .fold(sentence.to_string(), |acc, (re, simple)| {
            re.replace_all(&acc, *simple).into_owned()
        })
}

/// Apply two distinct random transformations to a sentence of at least five
/// words; shorter sentences pass through.
pub fn improve_sentence<R>(sentence: &str, rng: &mut R) -> String
where
    R: Rng + ?Sized,
{
    if sentence.split_whitespace().count() < MIN_WORDS {
        return sentence.to_string();
    }

    let mut transforms = Transform::ALL;
    transforms.shuffle(rng);
    transforms[..2]
        .iter()
        .fold(sentence.to_string(), |acc, t| t.apply(&acc, &mut *rng))
}

fn change_note(original: &str) -> String {
    let preview: String = original.chars().take(NOTE_PREVIEW_CHARS).collect();
    format!("Improved sentence structure: '{}...'", preview)
}

pub fn rewrite_text<R>(text: &str, rng: &mut R) -> RewriteResult
where
    R: Rng + ?Sized,
{
    let mut improved = Vec::new();
    let mut changes = Vec::new();

    for sentence in split_on_terminators(text) {
        let rewritten = improve_sentence(sentence, rng);
        if rewritten != sentence {
            changes.push(change_note(sentence));
        }
        improved.push(rewritten);
    }

    let improved_text = if improved.is_empty() {
        text.to_string()
    } else {
        format!("{}.", improved.join(". "))
    };

    debug!(sentences = improved.len(), changed = changes.len(), "rewrite.completed");

    if changes.is_empty() {
        changes = FALLBACK_CHANGES.iter().map(|s| s.to_string()).collect();
    }
    changes.truncate(MAX_CHANGES);

    RewriteResult {
        improved_text,
        changes,
    }
}
