//! HTTP implementations of the two remote collaborators.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use shared::{
    domain::MediaAsset,
    protocol::{
        MediaUploadResponse, RegisterImageRequest, MEDIA_FIELD_FILE, MEDIA_FIELD_FOLDER,
        MEDIA_FIELD_RESOURCE_TYPE, MEDIA_FIELD_UPLOAD_PRESET,
    },
};

use crate::{config::UploaderSettings, ImageFile, MediaHost, RecordBackend};

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Fixed preset parameters sent alongside every upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUploadPreset {
    pub upload_preset: String,
    pub folder: String,
    pub resource_type: String,
}

pub struct HttpMediaHost {
    http: Client,
    upload_url: String,
    preset: MediaUploadPreset,
}

impl HttpMediaHost {
    pub fn new(http: Client, upload_url: impl Into<String>, preset: MediaUploadPreset) -> Self {
        Self {
            http,
            upload_url: upload_url.into(),
            preset,
        }
    }

    pub fn from_settings(http: Client, settings: &UploaderSettings) -> Self {
        Self::new(
            http,
            settings.media_upload_url.clone(),
            MediaUploadPreset {
                upload_preset: settings.upload_preset.clone(),
                folder: settings.folder.clone(),
                resource_type: settings.resource_type.clone(),
            },
        )
    }

    fn build_form(&self, file: &ImageFile) -> Result<Form> {
        let mime_type = file.mime_type.as_deref().unwrap_or(FALLBACK_MIME_TYPE);
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.filename.clone())
            .mime_str(mime_type)
            .with_context(|| format!("invalid mime type '{mime_type}' for {}", file.filename))?;

        Ok(Form::new()
            .part(MEDIA_FIELD_FILE, part)
            .text(MEDIA_FIELD_UPLOAD_PRESET, self.preset.upload_preset.clone())
            .text(MEDIA_FIELD_FOLDER, self.preset.folder.clone())
            .text(MEDIA_FIELD_RESOURCE_TYPE, self.preset.resource_type.clone()))
    }
}

#[async_trait]
impl MediaHost for HttpMediaHost {
    async fn upload(&self, file: &ImageFile) -> Result<MediaAsset> {
        let form = self.build_form(file)?;
        let response: MediaUploadResponse = self
            .http
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .context("media host request failed")?
            .error_for_status()
            .context("media host rejected upload")?
            .json()
            .await
            .context("media host returned a malformed body")?;

        response
            .into_asset()
            .ok_or_else(|| anyhow!("media host response is missing secure_url"))
    }
}

pub struct HttpRecordBackend {
    http: Client,
    records_url: String,
}

impl HttpRecordBackend {
    pub fn new(http: Client, base_url: &str, records_path: &str) -> Self {
        Self {
            http,
            records_url: join_endpoint(base_url, records_path),
        }
    }

    pub fn from_settings(http: Client, settings: &UploaderSettings) -> Self {
        Self::new(http, &settings.backend_base_url, &settings.records_path)
    }

    pub fn records_url(&self) -> &str {
        &self.records_url
    }
}

#[async_trait]
impl RecordBackend for HttpRecordBackend {
    async fn register(&self, request: &RegisterImageRequest) -> Result<()> {
        self.http
            .post(&self.records_url)
            .json(request)
            .send()
            .await
            .context("record backend request failed")?
            .error_for_status()
            .context("record backend rejected image record")?;
        Ok(())
    }
}

fn join_endpoint(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
