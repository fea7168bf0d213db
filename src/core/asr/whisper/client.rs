//! HTTP client for the Whisper transcription endpoint.
//!
//! Each call is a single multipart request: the PCM window is wrapped in a
//! WAV container, the decoding options travel as form fields, and the
//! `verbose_json` response is converted into a [`Transcript`]. The reqwest
//! client is built once and reused for connection pooling.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use tracing::{debug, info, warn};

use super::config::WhisperConfig;
use super::messages::{ApiErrorResponse, VerboseTranscription, wav};
use crate::core::asr::{AsrError, TranscribeOptions, Transcriber, Transcript};

/// Upload size limit of the hosted API (25 MB), minus room for the WAV header.
const MAX_UPLOAD_BYTES: usize = 24 * 1024 * 1024;

pub struct WhisperTranscriber {
    config: WhisperConfig,
    http_client: Client,
}

impl WhisperTranscriber {
    pub fn new(config: WhisperConfig) -> Result<Self, AsrError> {
        config.validate().map_err(AsrError::Configuration)?;

        let http_client = Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| AsrError::Configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &WhisperConfig {
        &self.config
    }

    fn build_form(&self, wav_data: Vec<u8>, options: &TranscribeOptions) -> Result<Form, AsrError> {
        let file_part = Part::bytes(wav_data)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| AsrError::Configuration(format!("Invalid MIME type: {e}")))?;

        let mut form = Form::new()
            .part("file", file_part)
            .text("model", options.model.clone())
            .text("response_format", "verbose_json")
            .text("temperature", options.temperature.to_string())
            .text("beam_size", options.beam_size.to_string())
            .text("best_of", options.best_of.to_string())
            .text("vad_filter", options.vad_filter.to_string())
            .text(
                "condition_on_previous_text",
                options.condition_on_previous_text.to_string(),
            );

        if !options.language.is_empty() {
            form = form.text("language", options.language.clone());
        }

        if options.word_timestamps {
            for granularity in &self.config.timestamp_granularities {
                form = form.text("timestamp_granularities[]", granularity.as_str());
            }
        }

        Ok(form)
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(
        &self,
        pcm: &[i16],
        sample_rate: u32,
        options: &TranscribeOptions,
    ) -> Result<Transcript, AsrError> {
        let started = Instant::now();

        let wav_data =
            wav::encode_pcm16(pcm, sample_rate).map_err(|e| AsrError::Audio(e.to_string()))?;
        if wav_data.len() > MAX_UPLOAD_BYTES {
            return Err(AsrError::Audio(format!(
                "Audio window ({} bytes) exceeds maximum upload size ({} bytes)",
                wav_data.len(),
                MAX_UPLOAD_BYTES
            )));
        }

        debug!(
            samples = pcm.len(),
            sample_rate,
            model = %options.model,
            "Sending audio window to Whisper"
        );

        let form = self.build_form(wav_data, options)?;
        let mut request = self.http_client.post(self.config.api_url()).multipart(form);
        if let Some(api_key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            request = request.header("Authorization", format!("Bearer {api_key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| AsrError::Network(format!("Request failed: {e}")))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| AsrError::Network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ApiErrorResponse>(&response_text) {
                Ok(error_response) => error_response.error.to_string(),
                Err(_) => response_text,
            };
            warn!(status = status.as_u16(), "Whisper API error: {message}");
            return Err(AsrError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: VerboseTranscription = serde_json::from_str(&response_text)
            .map_err(|e| AsrError::Parse(e.to_string()))?;
        let transcript = parsed.into_transcript();

        info!(
            words = transcript.word_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Whisper transcription complete"
        );

        Ok(transcript)
    }

    fn name(&self) -> &'static str {
        "whisper"
    }
}
