//! Metrics recording for synthesis operations.
//!
//! Records through the `metrics` facade only; whether anything listens (and
//! how it is exported) is the host's business.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};

/// Metrics recorder for the synthesis core.
#[derive(Debug, Clone, Copy, Default)]
pub struct TtsMetrics;

impl TtsMetrics {
    /// Create the recorder and register metric descriptions.
    pub fn new() -> Self {
        Self::register();
        Self
    }

    fn register() {
        describe_counter!("tts_utterances_total", "Utterances started");
        describe_counter!("tts_utterances_completed", "Utterances completed successfully");
        describe_counter!("tts_utterances_failed", "Utterances failed on model invocation");
        describe_counter!("tts_utterances_cancelled", "Utterances cancelled by the caller");

        describe_histogram!(
            "tts_time_to_first_audio_ms",
            "Time to first audio chunk in milliseconds"
        );
        describe_histogram!(
            "tts_frame_generation_ms",
            "Per-frame generation time in milliseconds"
        );
        describe_histogram!(
            "tts_speed_ratio",
            "Generation time over audio duration (drives buffer tiering)"
        );

        describe_gauge!("tts_loaded_voices", "Voices currently loaded");
    }

    /// Record an utterance started.
    pub fn utterance_started(&self) {
        counter!("tts_utterances_total").increment(1);
    }

    /// Record an utterance completed.
    pub fn utterance_completed(&self) {
        counter!("tts_utterances_completed").increment(1);
    }

    /// Record an utterance failed.
    pub fn utterance_failed(&self) {
        counter!("tts_utterances_failed").increment(1);
    }

    /// Record an utterance cancelled.
    pub fn utterance_cancelled(&self) {
        counter!("tts_utterances_cancelled").increment(1);
    }

    /// Record time to first audio.
    pub fn record_time_to_first_audio(&self, ms: f64) {
        histogram!("tts_time_to_first_audio_ms").record(ms);
    }

    /// Record one frame's generation time.
    pub fn record_frame_time(&self, ms: f64) {
        histogram!("tts_frame_generation_ms").record(ms);
    }

    /// Set the loaded-voice count.
    pub fn set_loaded_voices(&self, count: f64) {
        gauge!("tts_loaded_voices").set(count);
    }
}
