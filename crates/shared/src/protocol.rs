use serde::{Deserialize, Serialize};

use crate::domain::MediaAsset;

pub const MEDIA_FIELD_FILE: &str = "file";
pub const MEDIA_FIELD_UPLOAD_PRESET: &str = "upload_preset";
pub const MEDIA_FIELD_FOLDER: &str = "folder";
pub const MEDIA_FIELD_RESOURCE_TYPE: &str = "resource_type";

/// Upload response from the media host. Only `secure_url` is read; every other
/// field the host returns is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaUploadResponse {
    #[serde(default)]
    pub secure_url: Option<String>,
}

impl MediaUploadResponse {
    pub fn into_asset(self) -> Option<MediaAsset> {
        self.secure_url
            .filter(|url| !url.trim().is_empty())
            .map(|secure_url| MediaAsset { secure_url })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterImageRequest {
    pub name: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}
