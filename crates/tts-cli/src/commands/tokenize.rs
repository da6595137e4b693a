//! Tokenize command implementation.

use std::path::Path;

use anyhow::{Result, bail};
use text_tokenizer::{FixedTokenizer, UnigramTokenizer};
use tracing::info;
use tts_core::TokenEncoder;

/// Run the tokenize command.
pub fn run(text: &str, tokenizer: &str, vocab: Option<&Path>, phonemize: bool) -> Result<()> {
    let ids = match tokenizer {
        "fixed" => {
            let input = if phonemize {
                super::resolver().phonemize(text)?
            } else {
                text.to_string()
            };
            FixedTokenizer::new().tokenize(&input)
        }
        "unigram" => {
            let Some(vocab) = vocab else {
                bail!("the unigram tokenizer needs --vocab");
            };
            let data = std::fs::read(vocab)?;
            let tokenizer = UnigramTokenizer::load(&data)?;
            info!(pieces = tokenizer.vocab_size(), "vocabulary loaded");
            tokenizer.encode(text)
        }
        other => bail!("unknown tokenizer: {other}, expected: fixed or unigram"),
    };

    println!(
        "{}",
        ids.iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    );
    info!(tokens = ids.len(), "tokenized");
    Ok(())
}
