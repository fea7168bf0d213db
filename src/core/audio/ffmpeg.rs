//! Decoding through an external ffmpeg binary.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{AudioDecoder, DecodeError, TARGET_SAMPLE_RATE, pcm16_from_le_bytes};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Runs `ffmpeg -i <tmp> -ac 1 -ar 16000 -f s16le pipe:1`.
///
/// The upload is written to a named temp file so ffmpeg can seek in
/// containers that need it (m4a). The file is removed when the decode
/// returns, on error paths too.
#[derive(Debug, Clone)]
pub struct FfmpegDecoder {
    ffmpeg_path: PathBuf,
    timeout: Duration,
}

impl Default for FfmpegDecoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegDecoder {
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn ffmpeg_path(&self) -> &Path {
        &self.ffmpeg_path
    }
}

#[async_trait]
impl AudioDecoder for FfmpegDecoder {
    async fn to_pcm16_mono_16k(
        &self,
        bytes: &[u8],
        file_name: Option<&str>,
    ) -> Result<Vec<i16>, DecodeError> {
        let suffix = file_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();

        let mut input = tempfile::Builder::new()
            .prefix("tilawa-upload-")
            .suffix(&suffix)
            .tempfile()?;
        input.as_file_mut().write_all(bytes)?;
        input.as_file_mut().flush()?;

        let sample_rate = TARGET_SAMPLE_RATE.to_string();
        let child = Command::new(&self.ffmpeg_path)
            .arg("-nostdin")
            .args(["-hide_banner", "-loglevel", "error"])
            .arg("-i")
            .arg(input.path())
            .args(["-vn", "-ac", "1", "-ar", sample_rate.as_str()])
            .args(["-f", "s16le", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                DecodeError::Ffmpeg(format!(
                    "failed to spawn '{}': {e}",
                    self.ffmpeg_path.display()
                ))
            })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "ffmpeg timed out");
                return Err(DecodeError::Ffmpeg(format!(
                    "timed out after {}s",
                    self.timeout.as_secs()
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DecodeError::Ffmpeg(format!(
                "exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let pcm = pcm16_from_le_bytes(&output.stdout);
        if pcm.is_empty() {
            return Err(DecodeError::Malformed("ffmpeg produced no audio".to_string()));
        }

        debug!(
            input_bytes = bytes.len(),
            samples = pcm.len(),
            "Decoded upload with ffmpeg"
        );
        Ok(pcm)
    }
}
