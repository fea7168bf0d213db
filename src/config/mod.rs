//! Configuration module for the tilawa gateway
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//! - `utils`: Utility functions for configuration parsing
//!
//! # Example
//! ```rust,no_run
//! use tilawa_gateway::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file layered over environment variables
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

mod env;
mod merge;
mod utils;
mod validation;
mod yaml;

pub use yaml::YamlConfig;

use crate::core::asr::{TranscribeOptions, WhisperConfig};
use crate::core::audio::FfmpegDecoder;
use crate::core::tracking::SessionConfig;

/// Corpus location used when neither `QURAN_PATH` nor `corpus.path` is set.
pub const DEFAULT_QURAN_PATH: &str = "quran/quran_tanzil.txt";

/// TLS configuration for HTTPS and WSS
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Named set of decoding parameters sent with each transcription request.
#[derive(Debug, Clone, PartialEq)]
pub struct AsrProfile {
    pub model: String,
    pub beam_size: u32,
    pub best_of: u32,
    pub temperature: f32,
    pub vad_filter: bool,
    pub condition_on_previous_text: bool,
}

impl AsrProfile {
    /// Fast profile for the rolling live window.
    pub fn live() -> Self {
        Self {
            model: "tiny".to_string(),
            beam_size: 2,
            best_of: 1,
            temperature: 0.0,
            vad_filter: true,
            condition_on_previous_text: false,
        }
    }

    /// More accurate profile for uploaded clips.
    pub fn oneshot() -> Self {
        Self {
            model: "base".to_string(),
            beam_size: 3,
            ..Self::live()
        }
    }

    /// Request options for this profile in `language`.
    pub fn options(&self, language: &str) -> TranscribeOptions {
        TranscribeOptions {
            model: self.model.clone(),
            language: language.to_string(),
            beam_size: self.beam_size,
            best_of: self.best_of,
            temperature: self.temperature,
            condition_on_previous_text: self.condition_on_previous_text,
            vad_filter: self.vad_filter,
            word_timestamps: true,
        }
    }
}

/// Live WebSocket tracking settings
#[derive(Debug, Clone, PartialEq)]
pub struct LiveConfig {
    pub profile: AsrProfile,
    /// Trailing audio window transcribed each tick, in seconds
    /// Default: 14
    pub window_sec: f64,
    /// Verses in the target window after anchoring
    /// Default: 12
    pub target_ayahs: usize,
    /// Ring buffer length in seconds
    /// Default: 45
    pub max_buffer_seconds: u32,
    /// Tick cadence
    /// Default: 1000
    pub update_interval_ms: u64,
    /// Close sockets that send nothing for this long
    /// Default: 300
    pub idle_timeout_secs: u64,
}

impl Default for LiveConfig {
    fn default() -> Self {
        let session = SessionConfig::default();
        Self {
            profile: AsrProfile::live(),
            window_sec: session.window_sec,
            target_ayahs: session.target_ayahs,
            max_buffer_seconds: session.max_buffer_seconds,
            update_interval_ms: session.update_interval_ms,
            idle_timeout_secs: 300,
        }
    }
}

/// `/infer` and `/track` settings
#[derive(Debug, Clone, PartialEq)]
pub struct OneshotConfig {
    pub profile: AsrProfile,
    /// Ranked candidates returned by `/infer`
    /// Default: 3
    pub top_k: usize,
    /// Default `window_ayahs` for `/track`
    /// Default: 12
    pub window_ayahs: usize,
}

impl Default for OneshotConfig {
    fn default() -> Self {
        Self {
            profile: AsrProfile::oneshot(),
            top_k: 3,
            window_ayahs: 12,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    // TLS configuration
    /// Optional TLS configuration for HTTPS
    /// If present, server will use HTTPS instead of HTTP
    pub tls: Option<TlsConfig>,

    // Corpus
    /// `surah|ayah|text` file, loaded on first use
    pub quran_path: PathBuf,

    // Speech recognition
    /// OpenAI-compatible base URL, e.g. `http://localhost:8000/v1`
    pub asr_base_url: String,
    pub asr_api_key: Option<String>,
    /// Default: "ar"
    pub asr_language: String,
    /// Default: 60
    pub asr_timeout_secs: u64,

    pub live: LiveConfig,
    pub oneshot: OneshotConfig,

    // Upload decoding
    /// Decode non-WAV uploads through ffmpeg
    /// Default: true
    pub ffmpeg_enabled: bool,
    pub ffmpeg_path: PathBuf,

    // Security configuration
    /// CORS allowed origins (comma-separated list or "*" for all)
    /// Default: None (same-origin only)
    pub cors_allowed_origins: Option<String>,
    /// Maximum requests per second per IP address
    /// Default: 60
    pub rate_limit_requests_per_second: u32,
    /// Maximum burst size for rate limiting
    /// Default: 10
    pub rate_limit_burst_size: u32,
}

/// Zeroize the ASR key when the configuration is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut key) = self.asr_api_key {
            key.zeroize();
        }
    }
}

impl ServerConfig {
    /// Load configuration from a YAML file with environment variable base
    ///
    /// Environment variables (with defaults) form the base and YAML values
    /// override them. The .env file is loaded in `main` before this runs.
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;

        let config = merge::merge_config(Some(yaml_config))?;

        validation::validate_config(&config)?;

        Ok(config)
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if TLS is enabled
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    pub fn whisper_config(&self) -> WhisperConfig {
        WhisperConfig {
            base_url: self.asr_base_url.clone(),
            api_key: self.asr_api_key.clone(),
            timeout: Duration::from_secs(self.asr_timeout_secs),
            ..WhisperConfig::default()
        }
    }

    /// Session defaults for a new live connection, before `start` overrides.
    pub fn live_session_config(&self) -> SessionConfig {
        SessionConfig {
            window_sec: self.live.window_sec,
            target_ayahs: self.live.target_ayahs,
            max_buffer_seconds: self.live.max_buffer_seconds,
            update_interval_ms: self.live.update_interval_ms,
            ..SessionConfig::default()
        }
    }

    pub fn live_options(&self) -> TranscribeOptions {
        self.live.profile.options(&self.asr_language)
    }

    pub fn oneshot_options(&self) -> TranscribeOptions {
        self.oneshot.profile.options(&self.asr_language)
    }

    /// The ffmpeg fallback for uploads, if enabled.
    pub fn ffmpeg_decoder(&self) -> Option<FfmpegDecoder> {
        self.ffmpeg_enabled
            .then(|| FfmpegDecoder::new(self.ffmpeg_path.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use std::fs;
    use tempfile::TempDir;

    fn test_config() -> ServerConfig {
        ServerConfig {
            host: "localhost".to_string(),
            port: 3001,
            tls: None,
            quran_path: PathBuf::from(DEFAULT_QURAN_PATH),
            asr_base_url: "http://localhost:8000/v1".to_string(),
            asr_api_key: Some("test-key".to_string()),
            asr_language: "ar".to_string(),
            asr_timeout_secs: 30,
            live: LiveConfig::default(),
            oneshot: OneshotConfig::default(),
            ffmpeg_enabled: true,
            ffmpeg_path: PathBuf::from("/usr/bin/ffmpeg"),
            cors_allowed_origins: None,
            rate_limit_requests_per_second: 60,
            rate_limit_burst_size: 10,
        }
    }

    fn cleanup_env_vars() {
        unsafe {
            for name in [
                "HOST",
                "PORT",
                "TLS_ENABLED",
                "TLS_CERT_PATH",
                "TLS_KEY_PATH",
                "QURAN_PATH",
                "ASR_BASE_URL",
                "ASR_API_KEY",
                "ASR_LANGUAGE",
                "ASR_TIMEOUT_SECS",
                "LIVE_MODEL",
                "LIVE_BEAM_SIZE",
                "LIVE_WINDOW_SEC",
                "LIVE_TARGET_AYAHS",
                "LIVE_UPDATE_INTERVAL_MS",
                "LIVE_IDLE_TIMEOUT_SECS",
                "ONESHOT_MODEL",
                "ONESHOT_TOP_K",
                "ONESHOT_WINDOW_AYAHS",
                "FFMPEG_ENABLED",
                "FFMPEG_PATH",
                "CORS_ALLOWED_ORIGINS",
                "RATE_LIMIT_REQUESTS_PER_SECOND",
                "RATE_LIMIT_BURST_SIZE",
            ] {
                env::remove_var(name);
            }
        }
    }

    #[test]
    fn test_address_and_tls() {
        let mut config = test_config();
        assert_eq!(config.address(), "localhost:3001");
        assert!(!config.is_tls_enabled());

        config.tls = Some(TlsConfig {
            cert_path: PathBuf::from("cert.pem"),
            key_path: PathBuf::from("key.pem"),
        });
        assert!(config.is_tls_enabled());
    }

    #[test]
    fn test_profiles_to_options() {
        let config = test_config();

        let live = config.live_options();
        assert_eq!(live.model, "tiny");
        assert_eq!(live.beam_size, 2);
        assert_eq!(live.language, "ar");
        assert!(live.vad_filter);
        assert!(live.word_timestamps);

        let oneshot = config.oneshot_options();
        assert_eq!(oneshot.model, "base");
        assert_eq!(oneshot.beam_size, 3);
        assert_eq!(config.oneshot.top_k, 3);
    }

    #[test]
    fn test_live_session_config() {
        let mut config = test_config();
        config.live.window_sec = 10.0;
        config.live.target_ayahs = 6;

        let session = config.live_session_config();
        assert_eq!(session.window_sec, 10.0);
        assert_eq!(session.target_ayahs, 6);
        assert_eq!(session.sample_rate, 16_000);
        assert_eq!(session.warmup_ms, 6000);
        assert!(session.validate().is_ok());
    }

    #[test]
    fn test_whisper_config() {
        let config = test_config();
        let whisper = config.whisper_config();
        assert_eq!(whisper.base_url, "http://localhost:8000/v1");
        assert_eq!(whisper.api_key.as_deref(), Some("test-key"));
        assert_eq!(whisper.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_ffmpeg_decoder_toggle() {
        let mut config = test_config();
        let decoder = config.ffmpeg_decoder().unwrap();
        assert_eq!(decoder.ffmpeg_path(), std::path::Path::new("/usr/bin/ffmpeg"));

        config.ffmpeg_enabled = false;
        assert!(config.ffmpeg_decoder().is_none());
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        cleanup_env_vars();

        let config = ServerConfig::from_env().unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3001);
        assert_eq!(config.quran_path, PathBuf::from(DEFAULT_QURAN_PATH));
        assert_eq!(config.asr_base_url, "http://localhost:8000/v1");
        assert!(config.asr_api_key.is_none());
        assert_eq!(config.live, LiveConfig::default());
        assert_eq!(config.oneshot, OneshotConfig::default());
        assert!(config.ffmpeg_enabled);
        assert_eq!(config.rate_limit_requests_per_second, 60);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        cleanup_env_vars();

        unsafe {
            env::set_var("PORT", "9100");
            env::set_var("QURAN_PATH", "/data/quran.txt");
            env::set_var("ASR_API_KEY", "env-key");
            env::set_var("LIVE_MODEL", "small");
            env::set_var("LIVE_WINDOW_SEC", "10");
            env::set_var("ONESHOT_TOP_K", "5");
            env::set_var("FFMPEG_ENABLED", "false");
        }

        let config = ServerConfig::from_env().unwrap();

        assert_eq!(config.port, 9100);
        assert_eq!(config.quran_path, PathBuf::from("/data/quran.txt"));
        assert_eq!(config.asr_api_key, Some("env-key".to_string()));
        assert_eq!(config.live.profile.model, "small");
        assert_eq!(config.live.window_sec, 10.0);
        assert_eq!(config.oneshot.top_k, 5);
        assert!(!config.ffmpeg_enabled);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_port() {
        cleanup_env_vars();

        unsafe {
            env::set_var("PORT", "not-a-port");
        }

        let result = ServerConfig::from_env();
        assert!(result.unwrap_err().to_string().contains("PORT"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_invalid_window() {
        cleanup_env_vars();

        unsafe {
            env::set_var("LIVE_WINDOW_SEC", "90");
        }

        let result = ServerConfig::from_env();
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Invalid live configuration")
        );

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_yaml_only() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let yaml_content = r#"
server:
  host: "127.0.0.1"
  port: 8080

corpus:
  path: "/srv/quran.txt"

asr:
  base_url: "https://asr.example.com/v1"
  api_key: "yaml-key"

live:
  model: "base"
  window_sec: 12
  idle_timeout_secs: 60

oneshot:
  beam_size: 5
  window_ayahs: 20
"#;

        fs::write(&config_path, yaml_content).unwrap();

        let config = ServerConfig::from_file(&config_path).unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.quran_path, PathBuf::from("/srv/quran.txt"));
        assert_eq!(config.asr_base_url, "https://asr.example.com/v1");
        assert_eq!(config.asr_api_key, Some("yaml-key".to_string()));
        assert_eq!(config.live.profile.model, "base");
        assert_eq!(config.live.profile.beam_size, 2);
        assert_eq!(config.live.window_sec, 12.0);
        assert_eq!(config.live.idle_timeout_secs, 60);
        assert_eq!(config.oneshot.profile.beam_size, 5);
        assert_eq!(config.oneshot.window_ayahs, 20);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_yaml_overrides_env() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let yaml_content = r#"
server:
  host: "127.0.0.1"
  port: 8080

asr:
  api_key: "yaml-key"
"#;

        fs::write(&config_path, yaml_content).unwrap();

        unsafe {
            env::set_var("HOST", "0.0.0.0");
            env::set_var("ASR_API_KEY", "env-key");
            env::set_var("ONESHOT_MODEL", "small");
        }

        let config = ServerConfig::from_file(&config_path).unwrap();

        // YAML overrides ENV
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.asr_api_key, Some("yaml-key".to_string()));
        // ENV value not touched by YAML
        assert_eq!(config.oneshot.profile.model, "small");

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_missing_file() {
        cleanup_env_vars();

        let config_path = PathBuf::from("/nonexistent/config.yaml");
        let result = ServerConfig::from_file(&config_path);

        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_invalid_yaml() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("invalid.yaml");

        fs::write(&config_path, "invalid: yaml: [content").unwrap();

        let result = ServerConfig::from_file(&config_path);
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse YAML")
        );

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_tls_requires_paths() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(&config_path, "server:\n  tls:\n    enabled: true\n").unwrap();

        let result = ServerConfig::from_file(&config_path);
        assert!(result.unwrap_err().to_string().contains("cert_path"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_partial_config() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let yaml_content = r#"
server:
  port: 9000

security:
  rate_limit_burst_size: 25
"#;

        fs::write(&config_path, yaml_content).unwrap();

        let config = ServerConfig::from_file(&config_path).unwrap();

        // YAML values
        assert_eq!(config.port, 9000);
        assert_eq!(config.rate_limit_burst_size, 25);

        // Defaults
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.rate_limit_requests_per_second, 60);
        assert_eq!(config.live.profile.model, "tiny");

        cleanup_env_vars();
    }
}
