//! Phonemize command implementation.

use anyhow::Result;

/// Run the phonemize command.
pub fn run(text: &str) -> Result<()> {
    let resolver = super::resolver();
    let phonemes = resolver.phonemize(text)?;
    println!("{phonemes}");
    Ok(())
}
