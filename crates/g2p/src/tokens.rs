//! Linguistic tokenization.
//!
//! Splits normalized text into the units the lexicon resolves: words,
//! punctuation, contraction clitics, hyphenated-compound halves, and
//! case-transition fragments ("McDonald" -> "Mc" + "Donald").

use crate::tagger::PosTag;

/// Rating of a resolved pronunciation: 4 = primary dictionary, 3 = secondary.
/// Also used as the sentinel on unresolved tokens.
pub const RATING_GOLD: u8 = 4;

/// Secondary-dictionary rating.
pub const RATING_SILVER: u8 = 3;

/// One unit of text on its way through G2P.
///
/// Created during preprocessing, consumed once per phonemize pass.
#[derive(Debug, Clone)]
pub struct LinguisticToken {
    /// The text span of this unit.
    pub text: String,
    /// Part-of-speech tag assigned by the heuristic tagger.
    pub tag: PosTag,
    /// Resolved phoneme string; `None` until resolution.
    pub phonemes: Option<String>,
    /// Stress adjustment hint: +1 promotes, -1 demotes.
    pub stress: Option<i8>,
    /// Whitespace that followed this unit in the source text.
    pub trailing: String,
    /// Confidence rating of the resolution.
    pub rating: u8,
}

impl LinguisticToken {
    fn new(text: String) -> Self {
        Self {
            text,
            tag: PosTag::Nn,
            phonemes: None,
            stress: None,
            trailing: String::new(),
            rating: RATING_GOLD,
        }
    }

    /// Whether this unit is a single punctuation mark.
    pub fn is_punctuation(&self) -> bool {
        self.text.chars().all(|c| !c.is_alphanumeric() && c != '\'')
    }
}

/// Clitic suffixes split off as their own units. `'s` and `n't` stay
/// attached: the possessive resolves through the plural stemming rule and
/// negated auxiliaries are dictionary entries.
const CLITICS: [&str; 5] = ["'ll", "'re", "'ve", "'m", "'d"];

/// Split normalized text into linguistic units.
pub fn tokenize(text: &str) -> Vec<LinguisticToken> {
    let mut tokens: Vec<LinguisticToken> = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            let start = i;
            while i < chars.len() && chars[i].is_whitespace() {
                i += 1;
            }
            if let Some(last) = tokens.last_mut() {
                last.trailing = chars[start..i].iter().collect();
            }
            continue;
        }

        if is_word_char(c) {
            let start = i;
            while i < chars.len() && is_word_char(chars[i]) {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            push_word_units(&word, &mut tokens);
            continue;
        }

        // Everything else is a single punctuation unit. A hyphen between
        // word characters separates compound halves and emits nothing.
        if c == '-'
            && i > 0
            && is_word_char(chars[i - 1])
            && chars.get(i + 1).copied().is_some_and(is_word_char)
        {
            i += 1;
            continue;
        }
        tokens.push(LinguisticToken::new(c.to_string()));
        i += 1;
    }

    tokens
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '\''
}

/// Split one whitespace-delimited word into units: clitics and
/// case-transition boundaries.
fn push_word_units(word: &str, tokens: &mut Vec<LinguisticToken>) {
    // Leading/trailing bare apostrophes are punctuation, not part of the word.
    let trimmed = word.trim_matches('\'');
    if trimmed.is_empty() {
        return;
    }

    let (stem, clitic) = split_clitic(trimmed);

    for part in split_case_transitions(stem) {
        tokens.push(LinguisticToken::new(part.to_string()));
    }
    if let Some(clitic) = clitic {
        tokens.push(LinguisticToken::new(clitic.to_string()));
    }
}

fn split_clitic(word: &str) -> (&str, Option<&str>) {
    for clitic in CLITICS {
        if let Some(stem) = word.strip_suffix(clitic) {
            if !stem.is_empty() {
                return (stem, Some(&word[stem.len()..]));
            }
        }
    }
    (word, None)
}

/// Split at lower-to-upper transitions: "McDonald" -> ["Mc", "Donald"].
fn split_case_transitions(word: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut prev_lower = false;

    for (idx, c) in word.char_indices() {
        if c.is_uppercase() && prev_lower {
            parts.push(&word[start..idx]);
            start = idx;
        }
        prev_lower = c.is_lowercase();
    }
    parts.push(&word[start..]);
    parts
}
