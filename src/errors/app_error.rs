use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, warn};

use crate::core::{CorpusError, TrackerError};

/// Error returned by HTTP handlers.
///
/// Serialized as `{"error": message, "code": kind}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Tracker(e) => match e {
                TrackerError::Corpus(CorpusError::NotLoaded { .. } | CorpusError::Empty) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                TrackerError::Corpus(CorpusError::AnchorNotFound { .. }) => StatusCode::NOT_FOUND,
                TrackerError::Decode(_) => StatusCode::BAD_REQUEST,
                TrackerError::NoMatch | TrackerError::EmptyTranscript => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                TrackerError::SessionBusy => StatusCode::CONFLICT,
                TrackerError::Transcription(_) => StatusCode::BAD_GATEWAY,
                TrackerError::Alignment(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Tracker(e) => e.code(),
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl From<crate::core::DecodeError> for AppError {
    fn from(e: crate::core::DecodeError) -> Self {
        Self::Tracker(e.into())
    }
}

impl From<crate::core::AsrError> for AppError {
    fn from(e: crate::core::AsrError) -> Self {
        Self::Tracker(e.into())
    }
}

impl From<CorpusError> for AppError {
    fn from(e: CorpusError) -> Self {
        Self::Tracker(e.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(code = self.code(), "Request failed: {self}");
        } else {
            warn!(code = self.code(), "Request rejected: {self}");
        }

        (
            status,
            Json(json!({"error": self.to_string(), "code": self.code()})),
        )
            .into_response()
    }
}
