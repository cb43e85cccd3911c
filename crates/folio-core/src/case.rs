//! Capitalization changes over text runs.

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// A capitalization change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseChange {
    /// `UPPER CASE`
    Upper,
    /// `lower case`
    Lower,
    /// `Title Case`
    Title,
    /// `Sentence case.`
    Sentence,
    /// `tOGGLE cASE`
    Toggle,
}

impl CaseChange {
    /// Human-readable label used in history descriptions.
    pub fn label(self) -> &'static str {
        match self {
            CaseChange::Upper => "UPPERCASE",
            CaseChange::Lower => "lowercase",
            CaseChange::Title => "Title Case",
            CaseChange::Sentence => "Sentence case",
            CaseChange::Toggle => "tOGGLE cASE",
        }
    }
}

/// Carries sentence/word position across consecutive text runs of one block.
#[derive(Debug, Clone, Copy)]
pub struct CaseState {
    sentence_start: bool,
    word_start: bool,
}

impl Default for CaseState {
    fn default() -> Self {
        Self {
            sentence_start: true,
            word_start: true,
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut graphemes = word.graphemes(true);
    match graphemes.next() {
        Some(first) => first.to_uppercase() + &graphemes.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// Apply `change` to one run of text, continuing from `state`.
pub fn apply_case(change: CaseChange, text: &str, state: &mut CaseState) -> String {
    match change {
        CaseChange::Upper => text.to_uppercase(),
        CaseChange::Lower => text.to_lowercase(),
        CaseChange::Toggle => text
            .chars()
            .map(|c| {
                if c.is_uppercase() {
                    c.to_lowercase().collect::<String>()
                } else {
                    c.to_uppercase().collect::<String>()
                }
            })
            .collect(),
        CaseChange::Title => {
            let mut out = String::with_capacity(text.len());
            for segment in text.split_word_bounds() {
                if segment.chars().any(char::is_alphanumeric) {
                    if state.word_start {
                        out.push_str(&capitalize(segment));
                    } else {
                        // A run that ends inside a word continues that word here.
                        out.push_str(&segment.to_lowercase());
                    }
                    state.word_start = false;
                } else {
                    out.push_str(segment);
                    state.word_start = true;
                }
            }
            out
        }
        CaseChange::Sentence => {
            let mut out = String::with_capacity(text.len());
            for c in text.chars() {
                if c.is_alphabetic() {
                    if state.sentence_start {
                        out.extend(c.to_uppercase());
                        state.sentence_start = false;
                    } else {
                        out.extend(c.to_lowercase());
                    }
                } else {
                    if matches!(c, '.' | '!' | '?') {
                        state.sentence_start = true;
                    }
                    out.push(c);
                }
            }
            out
        }
    }
}
