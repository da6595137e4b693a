//! Heuristic part-of-speech tagging.
//!
//! The lexicon only needs coarse tags to pick heteronym variants ("a record"
//! vs "I record"), so a small rule set over closed-class words and suffixes
//! is enough. Tags follow the Penn treebank names the dictionary keys use.

use crate::tokens::LinguisticToken;

/// Coarse part-of-speech tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PosTag {
    /// Noun (singular).
    Nn,
    /// Noun (plural).
    Nns,
    /// Proper noun.
    Nnp,
    /// Verb, base form.
    Vb,
    /// Verb, past tense.
    Vbd,
    /// Verb, gerund.
    Vbg,
    /// Verb, non-3rd-person present.
    Vbp,
    /// Verb, 3rd-person present.
    Vbz,
    /// Adjective.
    Jj,
    /// Adverb.
    Rb,
    /// Determiner.
    Dt,
    /// Preposition.
    In,
    /// The word "to".
    To,
    /// Personal pronoun.
    Prp,
    /// Cardinal number word.
    Cd,
    /// Anything else.
    Other,
}

impl PosTag {
    /// Coarsened parent tag used when a variant map has no exact entry:
    /// every verb form falls back to VB, every noun form to NN.
    pub fn parent(self) -> PosTag {
        match self {
            PosTag::Vbd | PosTag::Vbg | PosTag::Vbp | PosTag::Vbz => PosTag::Vb,
            PosTag::Nns | PosTag::Nnp => PosTag::Nn,
            other => other,
        }
    }

    /// Dictionary key for this tag.
    pub fn key(self) -> &'static str {
        match self {
            PosTag::Nn => "NN",
            PosTag::Nns => "NNS",
            PosTag::Nnp => "NNP",
            PosTag::Vb => "VB",
            PosTag::Vbd => "VBD",
            PosTag::Vbg => "VBG",
            PosTag::Vbp => "VBP",
            PosTag::Vbz => "VBZ",
            PosTag::Jj => "JJ",
            PosTag::Rb => "RB",
            PosTag::Dt => "DT",
            PosTag::In => "IN",
            PosTag::To => "TO",
            PosTag::Prp => "PRP",
            PosTag::Cd => "CD",
            PosTag::Other => "OTHER",
        }
    }

    /// Whether this tag is any verb form.
    pub fn is_verb(self) -> bool {
        self.parent() == PosTag::Vb
    }
}

const DETERMINERS: [&str; 5] = ["the", "a", "an", "this", "that"];
const PREPOSITIONS: [&str; 10] = [
    "of", "in", "on", "at", "with", "for", "from", "by", "as", "into",
];
const PRONOUNS: [&str; 7] = ["i", "you", "he", "she", "it", "we", "they"];
const NUMBER_WORDS: [&str; 13] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "hundred", "thousand",
];

/// Assign tags in place, one left-to-right pass.
pub fn tag_tokens(tokens: &mut [LinguisticToken]) {
    let mut sentence_start = true;
    let mut prev_tag: Option<PosTag> = None;

    for token in tokens.iter_mut() {
        if token.is_punctuation() {
            if matches!(token.text.as_str(), "." | "!" | "?") {
                sentence_start = true;
            }
            prev_tag = None;
            continue;
        }

        let lower = token.text.to_lowercase();
        let tag = if DETERMINERS.contains(&lower.as_str()) {
            PosTag::Dt
        } else if lower == "to" {
            PosTag::To
        } else if PREPOSITIONS.contains(&lower.as_str()) {
            PosTag::In
        } else if PRONOUNS.contains(&lower.as_str()) {
            PosTag::Prp
        } else if NUMBER_WORDS.contains(&lower.as_str()) {
            PosTag::Cd
        } else if prev_tag == Some(PosTag::To) {
            PosTag::Vb
        } else if prev_tag == Some(PosTag::Prp) {
            PosTag::Vbp
        } else if lower.ends_with("ly") {
            PosTag::Rb
        } else if lower.ends_with("ing") {
            PosTag::Vbg
        } else if lower.ends_with("ed") {
            PosTag::Vbd
        } else if !sentence_start && starts_uppercase(&token.text) {
            PosTag::Nnp
        } else {
            PosTag::Nn
        };

        token.tag = tag;
        // Fully-uppercase words read as emphasized.
        if token.text.len() > 1 && token.text.chars().all(|c| !c.is_lowercase()) {
            token.stress = Some(1);
        }

        prev_tag = Some(tag);
        sentence_start = false;
    }
}

fn starts_uppercase(text: &str) -> bool {
    text.chars().next().is_some_and(|c| c.is_uppercase())
}
