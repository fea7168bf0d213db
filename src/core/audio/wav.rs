//! In-process WAV decoding with hound.

use std::io::Cursor;

use async_trait::async_trait;
use hound::{SampleFormat, WavReader};

use super::{AudioDecoder, DecodeError, TARGET_SAMPLE_RATE};

/// Decodes integer (8/16/24/32-bit) and 32-bit float WAV.
///
/// Multi-channel input is averaged down to mono and other rates are linearly
/// resampled to 16 kHz.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavDecoder;

impl WavDecoder {
    pub fn decode(&self, bytes: &[u8]) -> Result<Vec<i16>, DecodeError> {
        let mut reader =
            WavReader::new(Cursor::new(bytes)).map_err(|e| DecodeError::Malformed(e.to_string()))?;
        let spec = reader.spec();

        if spec.channels == 0 || spec.sample_rate == 0 {
            return Err(DecodeError::Malformed(format!(
                "invalid WAV header ({} channels, {} Hz)",
                spec.channels, spec.sample_rate
            )));
        }

        let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Int, bits @ (8 | 16 | 24 | 32)) => {
                let scale = (1u64 << (bits - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<_, _>>()
                    .map_err(|e| DecodeError::Malformed(e.to_string()))?
            }
            (SampleFormat::Float, 32) => reader
                .samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(|e| DecodeError::Malformed(e.to_string()))?,
            (format, bits) => {
                return Err(DecodeError::Unsupported(format!(
                    "{bits}-bit {format:?} WAV"
                )));
            }
        };

        if interleaved.is_empty() {
            return Err(DecodeError::Malformed("WAV contains no samples".to_string()));
        }

        let mono = downmix(&interleaved, spec.channels as usize);
        let resampled = resample_linear(&mono, spec.sample_rate, TARGET_SAMPLE_RATE);
        Ok(resampled.into_iter().map(to_i16).collect())
    }
}

#[async_trait]
impl AudioDecoder for WavDecoder {
    async fn to_pcm16_mono_16k(
        &self,
        bytes: &[u8],
        _file_name: Option<&str>,
    ) -> Result<Vec<i16>, DecodeError> {
        self.decode(bytes)
    }
}

fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

fn resample_linear(samples: &[f32], in_rate: u32, out_rate: u32) -> Vec<f32> {
    if samples.is_empty() || in_rate == out_rate {
        return samples.to_vec();
    }

    let ratio = out_rate as f64 / in_rate as f64;
    let out_len = ((samples.len() as f64) * ratio).round().max(1.0) as usize;
    let last = samples.len() - 1;

    (0..out_len)
        .map(|idx| {
            let src = idx as f64 / ratio;
            let left = (src.floor() as usize).min(last);
            let right = (left + 1).min(last);
            let frac = (src - left as f64) as f32;
            samples[left] + (samples[right] - samples[left]) * frac
        })
        .collect()
}

#[inline]
fn to_i16(sample: f32) -> i16 {
    (sample * 32768.0).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
}
