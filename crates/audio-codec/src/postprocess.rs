//! Audio postprocessing: silence trimming and PCM conversion.

/// Convert float samples in [-1, 1] to 16-bit signed PCM with rounding and
/// clamping.
pub fn to_pcm16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| {
            let scaled = (s.clamp(-1.0, 1.0) * 32768.0).round();
            scaled.clamp(i16::MIN as f32, i16::MAX as f32) as i16
        })
        .collect()
}

/// Convert float samples to little-endian 16-bit PCM bytes.
pub fn to_pcm16_bytes(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for value in to_pcm16(samples) {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Drop fixed sample counts from the head and tail.
pub fn trim_fixed(samples: &[f32], head: usize, tail: usize) -> &[f32] {
    if head + tail >= samples.len() {
        return &[];
    }
    &samples[head..samples.len() - tail]
}

/// Trim leading and trailing near-silence, keeping a guard region of
/// samples past each detected boundary.
pub fn trim_silence(samples: &[f32], threshold: f32, guard: usize) -> &[f32] {
    let start = samples
        .iter()
        .position(|&s| s.abs() >= threshold)
        .unwrap_or(samples.len());
    let end = samples
        .iter()
        .rposition(|&s| s.abs() >= threshold)
        .map(|idx| idx + 1)
        .unwrap_or(0);
    if start >= end {
        return &[];
    }

    let start = start.saturating_sub(guard);
    let end = (end + guard).min(samples.len());
    &samples[start..end]
}

/// Trim only the trailing near-silence (the feed-forward engines keep their
/// leading samples).
pub fn trim_trailing_silence(samples: &[f32], threshold: f32, guard: usize) -> &[f32] {
    let end = samples
        .iter()
        .rposition(|&s| s.abs() >= threshold)
        .map(|idx| idx + 1)
        .unwrap_or(0);
    let end = (end + guard).min(samples.len());
    &samples[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pcm_full_scale() {
        assert_eq!(to_pcm16(&[1.0]), vec![32767]);
        assert_eq!(to_pcm16(&[-1.0]), vec![-32768]);
    }

    #[test]
    fn test_pcm_rounds_instead_of_truncating() {
        // 0.00002 * 32768 = 0.655..., which rounds to 1, not 0.
        assert_eq!(to_pcm16(&[0.00002]), vec![1]);
        assert_eq!(to_pcm16(&[-0.00002]), vec![-1]);
    }

    #[test]
    fn test_pcm_clamps_out_of_range() {
        assert_eq!(to_pcm16(&[2.0, -2.0]), vec![32767, -32768]);
    }

    #[test]
    fn test_pcm_bytes_little_endian() {
        let bytes = to_pcm16_bytes(&[1.0]);
        assert_eq!(bytes, vec![0xff, 0x7f]);
    }

    #[test]
    fn test_trim_fixed() {
        let samples = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(trim_fixed(&samples, 1, 2), &[2.0, 3.0]);
        assert_eq!(trim_fixed(&samples, 3, 3), &[] as &[f32]);
    }

    #[test]
    fn test_trim_silence_both_ends() {
        let mut samples = vec![0.0; 100];
        samples.extend_from_slice(&[0.5; 50]);
        samples.extend_from_slice(&[0.0; 100]);

        let trimmed = trim_silence(&samples, 0.01, 10);
        assert_eq!(trimmed.len(), 50 + 20);
    }

    #[test]
    fn test_trim_silence_all_quiet() {
        let samples = vec![0.001; 50];
        assert!(trim_silence(&samples, 0.01, 10).is_empty());
    }

    #[test]
    fn test_trim_trailing_keeps_lead() {
        let mut samples = vec![0.0; 30];
        samples.extend_from_slice(&[0.5; 10]);
        samples.extend_from_slice(&[0.0; 60]);

        let trimmed = trim_trailing_silence(&samples, 0.01, 5);
        assert_eq!(trimmed.len(), 30 + 10 + 5);
    }
}
