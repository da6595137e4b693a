//! Core data types for the synthesis pipeline.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Dimension of one codec latent frame.
pub const LATENT_DIM: usize = 32;

/// Samples of audio produced per latent frame at the codec sample rate.
pub const SAMPLES_PER_FRAME: usize = 1920;

/// Codec output sample rate in Hz.
pub const SAMPLE_RATE: u32 = 24_000;

/// One latent audio frame in codec space, roughly 80 ms of audio.
///
/// Produced one at a time by the autoregressive engine and consumed in
/// batches by the codec decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct LatentFrame {
    /// Latent values, length [`LATENT_DIM`].
    pub data: Vec<f32>,
}

impl LatentFrame {
    /// Create a frame from raw latent values.
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    /// Duration of audio this frame decodes to, in milliseconds.
    pub fn duration_ms() -> f32 {
        SAMPLES_PER_FRAME as f32 * 1000.0 / SAMPLE_RATE as f32
    }
}

/// A chunk of decoded audio delivered to the caller.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// PCM samples (f32, mono, [-1, 1]).
    pub pcm: Arc<[f32]>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioChunk {
    /// Create a new audio chunk.
    pub fn new(pcm: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            pcm: pcm.into(),
            sample_rate,
        }
    }

    /// Get the number of samples in this chunk.
    pub fn num_samples(&self) -> usize {
        self.pcm.len()
    }

    /// Get the duration of this chunk in milliseconds.
    pub fn duration_ms(&self) -> f32 {
        self.pcm.len() as f32 * 1000.0 / self.sample_rate as f32
    }
}

/// Cooperative cancellation flag shared between the caller and a running
/// generation.
///
/// Checked between frames and between sentences; cancellation is a clean
/// early termination, not an error. No audio callback fires after the stop
/// point.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a new, un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Non-blocking; takes effect at the next check.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Reset the token for reuse with a new utterance.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_chunk() {
        let chunk = AudioChunk::new(vec![0.0; 2400], SAMPLE_RATE);
        assert_eq!(chunk.num_samples(), 2400);
        assert!((chunk.duration_ms() - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_latent_frame_duration() {
        assert!((LatentFrame::duration_ms() - 80.0).abs() < 1e-3);
    }

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());

        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());

        token.reset();
        assert!(!clone.is_cancelled());
    }
}
