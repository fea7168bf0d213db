//! Environment variable loading.

use std::path::PathBuf;

use super::utils::{env_bool, env_parse, env_string};
use super::{
    AsrProfile, DEFAULT_QURAN_PATH, LiveConfig, OneshotConfig, ServerConfig, TlsConfig, validation,
};
use crate::core::asr::whisper::{DEFAULT_BASE_URL, WhisperConfig};

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// Unset variables fall back to defaults. The result is validated.
    ///
    /// # Errors
    /// Returns an error if a variable has an invalid format or the resulting
    /// configuration fails validation.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = load_env_config()?;
        validation::validate_config(&config)?;
        Ok(config)
    }
}

/// Read the profile overrides `{prefix}_MODEL`, `{prefix}_BEAM_SIZE`, ...
fn load_profile(prefix: &str, mut profile: AsrProfile) -> Result<AsrProfile, String> {
    if let Some(model) = env_string(&format!("{prefix}_MODEL")) {
        profile.model = model;
    }
    if let Some(beam_size) = env_parse(&format!("{prefix}_BEAM_SIZE"))? {
        profile.beam_size = beam_size;
    }
    if let Some(best_of) = env_parse(&format!("{prefix}_BEST_OF"))? {
        profile.best_of = best_of;
    }
    if let Some(temperature) = env_parse(&format!("{prefix}_TEMPERATURE"))? {
        profile.temperature = temperature;
    }
    if let Some(vad_filter) = env_bool(&format!("{prefix}_VAD_FILTER"))? {
        profile.vad_filter = vad_filter;
    }
    if let Some(condition) = env_bool(&format!("{prefix}_CONDITION_ON_PREVIOUS_TEXT"))? {
        profile.condition_on_previous_text = condition;
    }
    Ok(profile)
}

/// Build a configuration from environment variables without validating it.
pub(super) fn load_env_config() -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let host = env_string("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
    let port = env_parse::<u16>("PORT")?.unwrap_or(3001);

    let tls = if env_bool("TLS_ENABLED")?.unwrap_or(false) {
        let cert_path = env_string("TLS_CERT_PATH")
            .ok_or("TLS_CERT_PATH is required when TLS_ENABLED is true")?;
        let key_path = env_string("TLS_KEY_PATH")
            .ok_or("TLS_KEY_PATH is required when TLS_ENABLED is true")?;
        Some(TlsConfig {
            cert_path: PathBuf::from(cert_path),
            key_path: PathBuf::from(key_path),
        })
    } else {
        None
    };

    let mut live = LiveConfig::default();
    live.profile = load_profile("LIVE", live.profile)?;
    if let Some(window_sec) = env_parse("LIVE_WINDOW_SEC")? {
        live.window_sec = window_sec;
    }
    if let Some(target_ayahs) = env_parse("LIVE_TARGET_AYAHS")? {
        live.target_ayahs = target_ayahs;
    }
    if let Some(max_buffer_seconds) = env_parse("LIVE_MAX_BUFFER_SECONDS")? {
        live.max_buffer_seconds = max_buffer_seconds;
    }
    if let Some(update_interval_ms) = env_parse("LIVE_UPDATE_INTERVAL_MS")? {
        live.update_interval_ms = update_interval_ms;
    }
    if let Some(idle_timeout_secs) = env_parse("LIVE_IDLE_TIMEOUT_SECS")? {
        live.idle_timeout_secs = idle_timeout_secs;
    }

    let mut oneshot = OneshotConfig::default();
    oneshot.profile = load_profile("ONESHOT", oneshot.profile)?;
    if let Some(top_k) = env_parse("ONESHOT_TOP_K")? {
        oneshot.top_k = top_k;
    }
    if let Some(window_ayahs) = env_parse("ONESHOT_WINDOW_AYAHS")? {
        oneshot.window_ayahs = window_ayahs;
    }

    Ok(ServerConfig {
        host,
        port,
        tls,
        quran_path: env_string("QURAN_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_QURAN_PATH)),
        asr_base_url: env_string("ASR_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        asr_api_key: env_string("ASR_API_KEY"),
        asr_language: env_string("ASR_LANGUAGE").unwrap_or_else(|| "ar".to_string()),
        asr_timeout_secs: env_parse("ASR_TIMEOUT_SECS")?
            .unwrap_or(WhisperConfig::default().timeout.as_secs()),
        live,
        oneshot,
        ffmpeg_enabled: env_bool("FFMPEG_ENABLED")?.unwrap_or(true),
        ffmpeg_path: env_string("FFMPEG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("ffmpeg")),
        cors_allowed_origins: env_string("CORS_ALLOWED_ORIGINS"),
        rate_limit_requests_per_second: env_parse("RATE_LIMIT_REQUESTS_PER_SECOND")?.unwrap_or(60),
        rate_limit_burst_size: env_parse("RATE_LIMIT_BURST_SIZE")?.unwrap_or(10),
    })
}
