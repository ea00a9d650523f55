use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The user-visible failures of a submission attempt. No distinction is made
/// between an unreachable service and a rejected request within a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum UploadFailure {
    #[error("Please enter a name and select an image.")]
    MissingInput,
    #[error("Failed to upload image. Please try again.")]
    MediaHost,
    #[error("Failed to save image in the database.")]
    RecordBackend,
}
