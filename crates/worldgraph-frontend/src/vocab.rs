//! Problem vocabulary used to filter clauses that mention words absent from
//! the problem text.

use rustc_hash::FxHashSet;

/// Tokens accepted in every clause regardless of the problem text.
pub const SPECIAL_TOKENS: [&str; 5] = ["none", "world", "money", "time", "occasion"];

/// Set of admissible lowercase words for one problem.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    words: FxHashSet<String>,
}

impl Vocabulary {
    /// Builds the vocabulary of `text`: its tokens, their lemmas, and the
    /// special tokens.
    pub fn from_text(text: &str) -> Self {
        let mut words: FxHashSet<String> = SPECIAL_TOKENS.iter().map(|s| s.to_string()).collect();
        for token in tokenize(&text.to_lowercase()) {
            let lemma = lemmatize(&token);
            if lemma != token {
                words.insert(lemma);
            }
            words.insert(token);
        }
        Vocabulary { words }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    /// True when every blank-separated word of `phrase` is known, ignoring
    /// punctuation at word edges.
    pub fn admits(&self, phrase: &str) -> bool {
        phrase.split_whitespace().all(|w| {
            self.contains(w) || self.contains(w.trim_matches(|c: char| !c.is_alphanumeric()))
        })
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Splits text into word tokens.
///
/// A blank-separated chunk contributes itself with surrounding punctuation
/// trimmed (so `mrs.` survives as `mrs`), plus each of its alphanumeric runs.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    for chunk in text.split_whitespace() {
        let trimmed = chunk.trim_matches(|c: char| !c.is_alphanumeric());
        if trimmed.is_empty() {
            continue;
        }
        out.push(trimmed.to_string());
        if trimmed.chars().any(|c| !c.is_alphanumeric()) {
            for part in trimmed.split(|c: char| !c.is_alphanumeric()) {
                if !part.is_empty() {
                    out.push(part.to_string());
                }
            }
        }
    }
    out
}

const IRREGULAR: [(&str, &str); 9] = [
    ("men", "man"),
    ("women", "woman"),
    ("children", "child"),
    ("people", "person"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("mice", "mouse"),
    ("geese", "goose"),
    ("leaves", "leaf"),
];

/// Suffix-stripping noun lemmatizer covering the regular English plurals.
pub fn lemmatize(word: &str) -> String {
    if let Some((_, lemma)) = IRREGULAR.iter().find(|(plural, _)| *plural == word) {
        return lemma.to_string();
    }
    let n = word.len();
    if n > 3 && word.ends_with("ies") {
        return format!("{}y", &word[..n - 3]);
    }
    if n > 4 && word.ends_with("ves") {
        return format!("{}f", &word[..n - 3]);
    }
    for suffix in ["sses", "shes", "ches", "xes", "zes"] {
        if word.ends_with(suffix) {
            return word[..n - 2].to_string();
        }
    }
    if n > 3
        && word.ends_with('s')
        && !word.ends_with("ss")
        && !word.ends_with("us")
        && !word.ends_with("is")
    {
        return word[..n - 1].to_string();
    }
    word.to_string()
}
