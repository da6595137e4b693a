//! # text-normalizer
//!
//! Pre-phonemization text cleanup for the purrtts synthesis core.
//!
//! This crate prepares raw text for the G2P resolver:
//! - Markdown-style link stripping (`[text](url)` -> `text`)
//! - Numeric literal expansion (cardinals, ordinals, decimals, currency)
//! - Symbol and unicode cleanup
//! - Whitespace collapsing
//!
//! # Example
//!
//! ```ignore
//! use text_normalizer::Normalizer;
//! use tts_core::TextNormalizer;
//!
//! let normalizer = Normalizer::new();
//! let result = normalizer.normalize("I have 3 cats")?;
//! assert_eq!(result, "I have three cats");
//! ```

mod num2words;
mod rules;

use tracing::instrument;
use tts_core::{TextNormalizer, TtsResult};

pub use num2words::{num_to_words, ordinal_to_words};
pub use rules::Rule;

/// Text normalizer with a configurable rule pipeline.
#[derive(Debug)]
pub struct Normalizer {
    rules: Vec<Box<dyn Rule>>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    /// Create a new normalizer with the default rules.
    pub fn new() -> Self {
        Self {
            rules: rules::default_rules(),
        }
    }

    /// Create a normalizer with custom rules.
    pub fn with_rules(rules: Vec<Box<dyn Rule>>) -> Self {
        Self { rules }
    }

    /// Add a rule to the end of the pipeline.
    pub fn add_rule(&mut self, rule: Box<dyn Rule>) {
        self.rules.push(rule);
    }
}

impl TextNormalizer for Normalizer {
    #[instrument(skip(self, input), fields(input_len = input.len()))]
    fn normalize(&self, input: &str) -> TtsResult<String> {
        let mut text = input.to_string();
        for rule in &self.rules {
            text = rule.apply(&text)?;
        }
        Ok(text)
    }
}
