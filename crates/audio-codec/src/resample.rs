//! Reference-audio resampling.
//!
//! Voice-clone reference WAVs arrive at arbitrary sample rates; the codec
//! encoder expects its own. Mono only.

use rubato::{FftFixedInOut, Resampler};
use tts_core::{TtsError, TtsResult};

/// Resample mono audio between sample rates.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> TtsResult<Vec<f32>> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let mut resampler =
        FftFixedInOut::<f32>::new(from_rate as usize, to_rate as usize, 1024, 1)
            .map_err(|e| TtsError::Audio(format!("resampler init failed: {e}")))?;

    let expected = (samples.len() as u64 * to_rate as u64 / from_rate as u64) as usize;
    let mut output = Vec::with_capacity(expected);
    let mut position = 0;

    while position < samples.len() {
        let needed = resampler.input_frames_next();
        let end = (position + needed).min(samples.len());
        let mut chunk = samples[position..end].to_vec();
        // Zero-pad the final partial block.
        chunk.resize(needed, 0.0);
        position = end;

        let result = resampler
            .process(&[chunk], None)
            .map_err(|e| TtsError::Audio(format!("resampling failed: {e}")))?;
        output.extend_from_slice(&result[0]);
    }

    output.truncate(expected);
    Ok(output)
}
