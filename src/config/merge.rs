//! Merging environment configuration with YAML overrides.

use std::path::PathBuf;

use super::env::load_env_config;
use super::yaml::{AsrProfileYaml, YamlConfig};
use super::{AsrProfile, ServerConfig, TlsConfig};

/// Build the final configuration: environment values first, YAML on top.
pub(super) fn merge_config(
    yaml: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let mut config = load_env_config()?;

    let Some(yaml) = yaml else {
        return Ok(config);
    };

    if let Some(server) = yaml.server {
        if let Some(host) = server.host {
            config.host = host;
        }
        if let Some(port) = server.port {
            config.port = port;
        }
        if let Some(tls) = server.tls {
            match tls.enabled {
                Some(false) => config.tls = None,
                Some(true) => {
                    let cert_path = tls
                        .cert_path
                        .or_else(|| {
                            config
                                .tls
                                .as_ref()
                                .map(|t| t.cert_path.display().to_string())
                        })
                        .ok_or("server.tls.cert_path is required when TLS is enabled")?;
                    let key_path = tls
                        .key_path
                        .or_else(|| {
                            config
                                .tls
                                .as_ref()
                                .map(|t| t.key_path.display().to_string())
                        })
                        .ok_or("server.tls.key_path is required when TLS is enabled")?;
                    config.tls = Some(TlsConfig {
                        cert_path: PathBuf::from(cert_path),
                        key_path: PathBuf::from(key_path),
                    });
                }
                None => {}
            }
        }
    }

    if let Some(path) = yaml.corpus.and_then(|c| c.path) {
        config.quran_path = PathBuf::from(path);
    }

    if let Some(asr) = yaml.asr {
        if let Some(base_url) = asr.base_url {
            config.asr_base_url = base_url;
        }
        if let Some(api_key) = asr.api_key {
            config.asr_api_key = Some(api_key);
        }
        if let Some(language) = asr.language {
            config.asr_language = language;
        }
        if let Some(timeout_secs) = asr.timeout_secs {
            config.asr_timeout_secs = timeout_secs;
        }
    }

    if let Some(live) = yaml.live {
        apply_profile(&mut config.live.profile, live.profile);
        if let Some(window_sec) = live.window_sec {
            config.live.window_sec = window_sec;
        }
        if let Some(target_ayahs) = live.target_ayahs {
            config.live.target_ayahs = target_ayahs;
        }
        if let Some(max_buffer_seconds) = live.max_buffer_seconds {
            config.live.max_buffer_seconds = max_buffer_seconds;
        }
        if let Some(update_interval_ms) = live.update_interval_ms {
            config.live.update_interval_ms = update_interval_ms;
        }
        if let Some(idle_timeout_secs) = live.idle_timeout_secs {
            config.live.idle_timeout_secs = idle_timeout_secs;
        }
    }

    if let Some(oneshot) = yaml.oneshot {
        apply_profile(&mut config.oneshot.profile, oneshot.profile);
        if let Some(top_k) = oneshot.top_k {
            config.oneshot.top_k = top_k;
        }
        if let Some(window_ayahs) = oneshot.window_ayahs {
            config.oneshot.window_ayahs = window_ayahs;
        }
    }

    if let Some(audio) = yaml.audio {
        if let Some(enabled) = audio.ffmpeg_enabled {
            config.ffmpeg_enabled = enabled;
        }
        if let Some(path) = audio.ffmpeg_path {
            config.ffmpeg_path = PathBuf::from(path);
        }
    }

    if let Some(security) = yaml.security {
        if let Some(origins) = security.cors_allowed_origins {
            config.cors_allowed_origins = Some(origins);
        }
        if let Some(rps) = security.rate_limit_requests_per_second {
            config.rate_limit_requests_per_second = rps;
        }
        if let Some(burst) = security.rate_limit_burst_size {
            config.rate_limit_burst_size = burst;
        }
    }

    Ok(config)
}

fn apply_profile(profile: &mut AsrProfile, overrides: AsrProfileYaml) {
    if let Some(model) = overrides.model {
        profile.model = model;
    }
    if let Some(beam_size) = overrides.beam_size {
        profile.beam_size = beam_size;
    }
    if let Some(best_of) = overrides.best_of {
        profile.best_of = best_of;
    }
    if let Some(temperature) = overrides.temperature {
        profile.temperature = temperature;
    }
    if let Some(vad_filter) = overrides.vad_filter {
        profile.vad_filter = vad_filter;
    }
    if let Some(condition) = overrides.condition_on_previous_text {
        profile.condition_on_previous_text = condition;
    }
}
