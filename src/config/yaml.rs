use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present in
/// the file override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 8000
///   tls:
///     enabled: false
///
/// corpus:
///   path: "quran/quran_tanzil.txt"
///
/// asr:
///   base_url: "http://localhost:8000/v1"
///   api_key: "optional-key"
///   language: "ar"
///   timeout_secs: 60
///
/// live:
///   model: "tiny"
///   window_sec: 14
///   beam_size: 2
///   target_ayahs: 12
///   update_interval_ms: 1000
///   idle_timeout_secs: 300
///
/// oneshot:
///   model: "base"
///   beam_size: 3
///   top_k: 3
///   window_ayahs: 12
///
/// audio:
///   ffmpeg_enabled: true
///   ffmpeg_path: "/usr/bin/ffmpeg"
///
/// security:
///   cors_allowed_origins: "*"
///   rate_limit_requests_per_second: 60
///   rate_limit_burst_size: 10
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub corpus: Option<CorpusYaml>,
    pub asr: Option<AsrYaml>,
    pub live: Option<LiveYaml>,
    pub oneshot: Option<OneshotYaml>,
    pub audio: Option<AudioYaml>,
    pub security: Option<SecurityYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tls: Option<TlsYaml>,
}

/// TLS configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TlsYaml {
    pub enabled: Option<bool>,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CorpusYaml {
    /// `surah|ayah|text` file
    pub path: Option<String>,
}

/// Speech recognition endpoint from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AsrYaml {
    /// OpenAI-compatible base URL, up to and including `/v1`
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub language: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Decoding parameters shared by the live and one-shot sections
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AsrProfileYaml {
    pub model: Option<String>,
    pub beam_size: Option<u32>,
    pub best_of: Option<u32>,
    pub temperature: Option<f32>,
    pub vad_filter: Option<bool>,
    pub condition_on_previous_text: Option<bool>,
}

/// Live tracking section from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LiveYaml {
    #[serde(flatten)]
    pub profile: AsrProfileYaml,
    pub window_sec: Option<f64>,
    pub target_ayahs: Option<usize>,
    pub max_buffer_seconds: Option<u32>,
    pub update_interval_ms: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

/// One-shot request section from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct OneshotYaml {
    #[serde(flatten)]
    pub profile: AsrProfileYaml,
    pub top_k: Option<usize>,
    pub window_ayahs: Option<usize>,
}

/// Upload decoding from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AudioYaml {
    pub ffmpeg_enabled: Option<bool>,
    pub ffmpeg_path: Option<String>,
}

/// Security configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SecurityYaml {
    /// CORS allowed origins (comma-separated list or "*" for all)
    pub cors_allowed_origins: Option<String>,
    /// Maximum requests per second per IP address
    pub rate_limit_requests_per_second: Option<u32>,
    /// Maximum burst size for rate limiting
    pub rate_limit_burst_size: Option<u32>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or the YAML is malformed.
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}
