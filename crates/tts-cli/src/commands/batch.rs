//! Batch command implementation: preview the per-call token grouping.

use anyhow::Result;
use text_tokenizer::FixedTokenizer;
use tts_core::TokenEncoder;
use tts_engine::SentenceBatcher;

/// Run the batch command.
pub fn run(text: &str, max_tokens: usize) -> Result<()> {
    let resolver = super::resolver();
    let tokenizer = FixedTokenizer::new();

    let batcher = SentenceBatcher::new(max_tokens);
    let batches = batcher.batch(text, |unit| {
        let phonemes = resolver.phonemize(unit)?;
        tokenizer.encode(&phonemes)
    })?;

    for (index, batch) in batches.iter().enumerate() {
        println!("call {index}: {} tokens", batch.len());
    }
    println!("{} model calls total", batches.len());
    Ok(())
}
