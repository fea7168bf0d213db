//! Configuration validation.

use super::{OneshotConfig, ServerConfig, TlsConfig};

/// Run every check against a fully merged configuration.
pub(super) fn validate_config(config: &ServerConfig) -> Result<(), String> {
    validate_tls(&config.tls)?;
    config.whisper_config().validate()?;
    config
        .live_session_config()
        .validate()
        .map_err(|e| format!("Invalid live configuration: {e}"))?;
    validate_oneshot(&config.oneshot)?;
    validate_rate_limit(
        config.rate_limit_requests_per_second,
        config.rate_limit_burst_size,
    )?;
    Ok(())
}

/// Certificate and key must both exist on disk.
pub(super) fn validate_tls(tls: &Option<TlsConfig>) -> Result<(), String> {
    let Some(tls) = tls else {
        return Ok(());
    };
    if !tls.cert_path.exists() {
        return Err(format!(
            "TLS certificate file not found: {}",
            tls.cert_path.display()
        ));
    }
    if !tls.key_path.exists() {
        return Err(format!(
            "TLS private key file not found: {}",
            tls.key_path.display()
        ));
    }
    Ok(())
}

pub(super) fn validate_oneshot(oneshot: &OneshotConfig) -> Result<(), String> {
    if oneshot.top_k == 0 {
        return Err("oneshot.top_k must be at least 1".to_string());
    }
    if oneshot.window_ayahs == 0 || oneshot.window_ayahs > 300 {
        return Err(format!(
            "oneshot.window_ayahs must be between 1 and 300, got {}",
            oneshot.window_ayahs
        ));
    }
    if oneshot.profile.model.trim().is_empty() {
        return Err("oneshot model must not be empty".to_string());
    }
    Ok(())
}

pub(super) fn validate_rate_limit(rps: u32, burst: u32) -> Result<(), String> {
    if rps == 0 {
        return Err("rate_limit_requests_per_second must be greater than zero".to_string());
    }
    if burst == 0 {
        return Err("rate_limit_burst_size must be greater than zero".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_validate_tls_missing_files() {
        assert!(validate_tls(&None).is_ok());

        let tls = Some(TlsConfig {
            cert_path: PathBuf::from("/nonexistent/cert.pem"),
            key_path: PathBuf::from("/nonexistent/key.pem"),
        });
        let err = validate_tls(&tls).unwrap_err();
        assert!(err.contains("certificate"));
    }

    #[test]
    fn test_validate_tls_existing_files() {
        let temp_dir = TempDir::new().unwrap();
        let cert_path = temp_dir.path().join("cert.pem");
        let key_path = temp_dir.path().join("key.pem");
        fs::write(&cert_path, "cert").unwrap();

        let tls = Some(TlsConfig {
            cert_path: cert_path.clone(),
            key_path: key_path.clone(),
        });
        assert!(validate_tls(&tls).unwrap_err().contains("private key"));

        fs::write(&key_path, "key").unwrap();
        assert!(validate_tls(&tls).is_ok());
    }

    #[test]
    fn test_validate_oneshot() {
        assert!(validate_oneshot(&OneshotConfig::default()).is_ok());

        let mut oneshot = OneshotConfig::default();
        oneshot.top_k = 0;
        assert!(validate_oneshot(&oneshot).is_err());

        let mut oneshot = OneshotConfig::default();
        oneshot.window_ayahs = 301;
        assert!(validate_oneshot(&oneshot).is_err());
    }

    #[test]
    fn test_validate_rate_limit() {
        assert!(validate_rate_limit(60, 10).is_ok());
        assert!(validate_rate_limit(0, 10).is_err());
        assert!(validate_rate_limit(60, 0).is_err());
    }
}
