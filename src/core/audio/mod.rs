//! Audio decoder collaborator.
//!
//! Everything downstream of the decoder works on 16 kHz mono PCM16.
//! [`WavDecoder`] handles WAV uploads in process, [`FfmpegDecoder`] shells out
//! for compressed containers (webm, ogg, m4a, mp3) and [`AutoDecoder`] picks
//! between them by sniffing the payload.

mod ffmpeg;
mod wav;

use async_trait::async_trait;
use tracing::debug;

pub use ffmpeg::FfmpegDecoder;
pub use wav::WavDecoder;

/// Sample rate every decoder produces.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

#[derive(Debug, Clone, thiserror::Error)]
pub enum DecodeError {
    #[error("Unsupported audio format: {0}")]
    Unsupported(String),

    #[error("Malformed audio: {0}")]
    Malformed(String),

    #[error("ffmpeg failed: {0}")]
    Ffmpeg(String),

    #[error("Audio I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for DecodeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Converts an uploaded clip into 16 kHz mono PCM16.
#[async_trait]
pub trait AudioDecoder: Send + Sync {
    async fn to_pcm16_mono_16k(
        &self,
        bytes: &[u8],
        file_name: Option<&str>,
    ) -> Result<Vec<i16>, DecodeError>;
}

/// WAV in process, anything else through ffmpeg when enabled.
#[derive(Debug, Clone, Default)]
pub struct AutoDecoder {
    wav: WavDecoder,
    ffmpeg: Option<FfmpegDecoder>,
}

impl AutoDecoder {
    pub fn new(ffmpeg: Option<FfmpegDecoder>) -> Self {
        Self {
            wav: WavDecoder,
            ffmpeg,
        }
    }

    pub fn ffmpeg_enabled(&self) -> bool {
        self.ffmpeg.is_some()
    }
}

#[async_trait]
impl AudioDecoder for AutoDecoder {
    async fn to_pcm16_mono_16k(
        &self,
        bytes: &[u8],
        file_name: Option<&str>,
    ) -> Result<Vec<i16>, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Malformed("empty audio upload".to_string()));
        }

        if is_riff_wave(bytes) {
            match self.wav.to_pcm16_mono_16k(bytes, file_name).await {
                Ok(pcm) => return Ok(pcm),
                // compressed WAV payloads (mu-law, ADPCM) still decode through ffmpeg
                Err(err) if self.ffmpeg.is_some() => {
                    debug!("In-process WAV decode failed, retrying with ffmpeg: {err}");
                }
                Err(err) => return Err(err),
            }
        }

        match &self.ffmpeg {
            Some(ffmpeg) => ffmpeg.to_pcm16_mono_16k(bytes, file_name).await,
            None => Err(DecodeError::Unsupported(format!(
                "{} is not a WAV file and ffmpeg decoding is disabled",
                file_name.unwrap_or("upload")
            ))),
        }
    }
}

/// RIFF/WAVE magic check.
pub fn is_riff_wave(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}

/// Little-endian PCM16 bytes to samples. A trailing odd byte is ignored.
pub fn pcm16_from_le_bytes(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|chunk| i16::from_le_bytes([chunk[0], chunk[1]]))
        .collect()
}
