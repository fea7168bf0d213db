//! Live tracking WebSocket message types
//!
//! Outgoing messages are [`TrackingSnapshot`]s serialized as-is; this module
//! only defines what the client may send.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// Maximum allowed size for a base64 `audio` message (4 MB)
pub const MAX_AUDIO_MESSAGE_SIZE: usize = 4 * 1024 * 1024;

// =============================================================================
// Incoming Messages (Client -> Server)
// =============================================================================

/// Incoming WebSocket messages from client
#[derive(Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveIncomingMessage {
    /// Begin a session, optionally overriding stream parameters
    Start(LiveStartConfig),

    /// Base64-encoded PCM16 little-endian audio
    Audio { data: String },

    /// End the session
    Stop,
}

/// Optional stream parameters of a `start` message
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct LiveStartConfig {
    #[serde(default)]
    pub sample_rate: Option<u32>,
    #[serde(default)]
    pub window_sec: Option<f64>,
    #[serde(default)]
    pub target_ayahs: Option<usize>,
}

// =============================================================================
// Validation
// =============================================================================

/// Error type for message validation failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LiveValidationError {
    #[error("Audio message too large: {size} bytes (max: {max} bytes)")]
    AudioTooLarge { size: usize, max: usize },

    #[error("Invalid base64 audio: {0}")]
    InvalidAudio(String),
}

impl LiveIncomingMessage {
    /// Validates message field sizes to prevent resource exhaustion.
    pub fn validate_size(&self) -> Result<(), LiveValidationError> {
        if let LiveIncomingMessage::Audio { data } = self
            && data.len() > MAX_AUDIO_MESSAGE_SIZE
        {
            return Err(LiveValidationError::AudioTooLarge {
                size: data.len(),
                max: MAX_AUDIO_MESSAGE_SIZE,
            });
        }
        Ok(())
    }
}

/// Decode the payload of an `audio` message.
pub fn decode_audio(data: &str) -> Result<Vec<u8>, LiveValidationError> {
    STANDARD
        .decode(data.trim())
        .map_err(|e| LiveValidationError::InvalidAudio(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_message_deserialization() {
        let msg: LiveIncomingMessage = serde_json::from_str(
            r#"{"type": "start", "sample_rate": 16000, "window_sec": 10, "target_ayahs": 8}"#,
        )
        .unwrap();

        assert_eq!(
            msg,
            LiveIncomingMessage::Start(LiveStartConfig {
                sample_rate: Some(16000),
                window_sec: Some(10.0),
                target_ayahs: Some(8),
            })
        );
    }

    #[test]
    fn test_bare_start_message() {
        let msg: LiveIncomingMessage = serde_json::from_str(r#"{"type": "start"}"#).unwrap();
        assert_eq!(msg, LiveIncomingMessage::Start(LiveStartConfig::default()));
    }

    #[test]
    fn test_audio_and_stop_messages() {
        let msg: LiveIncomingMessage =
            serde_json::from_str(r#"{"type": "audio", "data": "AAEC"}"#).unwrap();
        assert_eq!(
            msg,
            LiveIncomingMessage::Audio {
                data: "AAEC".to_string()
            }
        );

        let msg: LiveIncomingMessage = serde_json::from_str(r#"{"type": "stop"}"#).unwrap();
        assert_eq!(msg, LiveIncomingMessage::Stop);
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(serde_json::from_str::<LiveIncomingMessage>(r#"{"type": "pause"}"#).is_err());
    }

    #[test]
    fn test_validate_audio_size() {
        let small = LiveIncomingMessage::Audio {
            data: "AAAA".to_string(),
        };
        assert!(small.validate_size().is_ok());

        let large = LiveIncomingMessage::Audio {
            data: "A".repeat(MAX_AUDIO_MESSAGE_SIZE + 1),
        };
        assert!(matches!(
            large.validate_size(),
            Err(LiveValidationError::AudioTooLarge { .. })
        ));
    }

    #[test]
    fn test_decode_audio() {
        assert_eq!(decode_audio("AAEC").unwrap(), vec![0u8, 1, 2]);
        assert!(matches!(
            decode_audio("not base64!"),
            Err(LiveValidationError::InvalidAudio(_))
        ));
    }
}
