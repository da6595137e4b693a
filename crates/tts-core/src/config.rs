//! Generation configuration supplied by the host.
//!
//! The core does not own these values; they arrive as a flat object per
//! engine instance. Thresholds and buffer constants are tunable
//! configuration, not protocol.

use serde::{Deserialize, Serialize};

/// How decoded audio leaves the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodingMode {
    /// Collect all latent frames, then decode once.
    Batch,
    /// Overlap generation and decoding through the adaptive scheduler.
    #[default]
    Streaming,
}

/// Flat generation parameters for one engine instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Euler integration steps for flow matching.
    #[serde(default = "default_ode_steps")]
    pub ode_steps: usize,

    /// Sampling temperature; 0 starts integration from zeros instead of noise.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Frames generated after the EOS logit first crosses the threshold.
    #[serde(default = "default_frames_after_eos")]
    pub frames_after_eos: usize,

    /// EOS logit threshold.
    #[serde(default = "default_eos_threshold")]
    pub eos_threshold: f32,

    /// Hard cap on generated frames if EOS never fires.
    #[serde(default = "default_max_frames")]
    pub max_frames: usize,

    /// Latent frames per codec decode call in batch mode.
    #[serde(default = "default_decode_chunk_frames")]
    pub decode_chunk_frames: usize,

    /// Decoding mode.
    #[serde(default)]
    pub decoding: DecodingMode,

    /// Intra-op thread count hint forwarded to the host's session factory.
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Token budget per model call for the sentence batcher.
    #[serde(default = "default_max_tokens_per_call")]
    pub max_tokens_per_call: usize,
}

fn default_ode_steps() -> usize {
    8
}

fn default_temperature() -> f32 {
    0.7
}

fn default_frames_after_eos() -> usize {
    3
}

fn default_eos_threshold() -> f32 {
    -4.0
}

fn default_max_frames() -> usize {
    1000
}

fn default_decode_chunk_frames() -> usize {
    6
}

fn default_threads() -> usize {
    2
}

fn default_max_tokens_per_call() -> usize {
    150
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            ode_steps: default_ode_steps(),
            temperature: default_temperature(),
            frames_after_eos: default_frames_after_eos(),
            eos_threshold: default_eos_threshold(),
            max_frames: default_max_frames(),
            decode_chunk_frames: default_decode_chunk_frames(),
            decoding: DecodingMode::default(),
            threads: default_threads(),
            max_tokens_per_call: default_max_tokens_per_call(),
        }
    }
}

impl GenerationConfig {
    /// Set the ODE step count.
    pub fn with_ode_steps(mut self, steps: usize) -> Self {
        self.ode_steps = steps;
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set frames generated after EOS.
    pub fn with_frames_after_eos(mut self, frames: usize) -> Self {
        self.frames_after_eos = frames;
        self
    }

    /// Set the decoding mode.
    pub fn with_decoding(mut self, mode: DecodingMode) -> Self {
        self.decoding = mode;
        self
    }
}
