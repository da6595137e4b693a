//! WAV file I/O utilities.

use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::{self, Write};
use std::path::Path;
use tts_core::{TtsError, TtsResult};

use crate::postprocess::to_pcm16;

/// Write audio samples to a 16-bit mono WAV file.
pub fn write_wav_samples(
    path: impl AsRef<Path>,
    samples: &[f32],
    sample_rate: u32,
) -> TtsResult<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path.as_ref(), spec)
        .map_err(|e| TtsError::Io(io::Error::other(e.to_string())))?;

    for value in to_pcm16(samples) {
        writer
            .write_sample(value)
            .map_err(|e| TtsError::Io(io::Error::other(e.to_string())))?;
    }

    writer
        .finalize()
        .map_err(|e| TtsError::Io(io::Error::other(e.to_string())))?;

    Ok(())
}

/// Write audio samples to a writer as raw PCM (16-bit LE).
pub fn write_raw_pcm<W: Write>(writer: &mut W, samples: &[f32]) -> TtsResult<()> {
    for value in to_pcm16(samples) {
        writer.write_all(&value.to_le_bytes()).map_err(TtsError::Io)?;
    }
    Ok(())
}

/// Read audio samples from a WAV file, downmixing to mono.
pub fn read_wav(path: impl AsRef<Path>) -> TtsResult<(Vec<f32>, u32)> {
    let mut reader = hound::WavReader::open(path.as_ref())
        .map_err(|e| TtsError::Io(io::Error::other(e.to_string())))?;

    let spec = reader.spec();
    let sample_rate = spec.sample_rate;
    let channels = spec.channels as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| TtsError::Io(io::Error::other(e.to_string())))?
        }
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| TtsError::Io(io::Error::other(e.to_string())))?,
    };

    if channels <= 1 {
        return Ok((interleaved, sample_rate));
    }

    let mono: Vec<f32> = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();
    Ok((mono, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_write_raw_pcm() {
        let samples = vec![0.0f32, 0.5, -0.5, 1.0, -1.0];
        let mut buffer = Vec::new();

        write_raw_pcm(&mut buffer, &samples).unwrap();

        // Each sample is 2 bytes (16-bit).
        assert_eq!(buffer.len(), samples.len() * 2);
    }

    #[test]
    fn test_sample_clamping() {
        let samples = vec![2.0f32, -2.0];
        let mut buffer = Cursor::new(Vec::new());

        write_raw_pcm(&mut buffer, &samples).unwrap();

        let bytes = buffer.into_inner();
        let sample1 = i16::from_le_bytes([bytes[0], bytes[1]]);
        assert_eq!(sample1, i16::MAX);
        let sample2 = i16::from_le_bytes([bytes[2], bytes[3]]);
        assert_eq!(sample2, i16::MIN);
    }

    #[test]
    fn test_wav_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.wav");
        let samples = vec![0.0f32, 0.25, -0.25, 0.5];

        write_wav_samples(&path, &samples, 24_000).unwrap();
        let (read_back, rate) = read_wav(&path).unwrap();

        assert_eq!(rate, 24_000);
        assert_eq!(read_back.len(), samples.len());
        for (a, b) in read_back.iter().zip(&samples) {
            assert!((a - b).abs() < 1e-3);
        }
    }
}
