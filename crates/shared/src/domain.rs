use serde::{Deserialize, Serialize};

use crate::error::UploadFailure;

pub const UPLOAD_SUCCESS_MESSAGE: &str = "Image uploaded successfully!";

/// A stored image at the media host, addressed by its durable public URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub secure_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Success,
    Failure,
}

/// Result of one submission attempt, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum UploadOutcome {
    Success(String),
    Failure(String),
}

impl UploadOutcome {
    pub fn uploaded() -> Self {
        Self::Success(UPLOAD_SUCCESS_MESSAGE.to_string())
    }

    pub fn failed(failure: UploadFailure) -> Self {
        Self::Failure(failure.to_string())
    }

    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Success(_) => OutcomeKind::Success,
            Self::Failure(_) => OutcomeKind::Failure,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Success(message) | Self::Failure(message) => message,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl From<UploadFailure> for UploadOutcome {
    fn from(value: UploadFailure) -> Self {
        Self::failed(value)
    }
}
