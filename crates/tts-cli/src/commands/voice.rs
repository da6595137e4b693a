//! Voice command implementation: inspect a persisted voice blob.

use std::path::Path;

use anyhow::Result;
use tts_engine::VoiceState;

/// Run the voice command.
pub fn run(path: &Path) -> Result<()> {
    let voice = VoiceState::load(path)?;

    println!("id:         {}", voice.id);
    println!("name:       {}", voice.name);
    println!("frames:     {}", voice.frames);
    println!("dim:        {}", voice.embedding_dim());
    println!("bundled:    {}", voice.bundled);
    println!("created_at: {} ms", voice.created_at_ms);
    Ok(())
}
