use std::{
    path::Path,
    sync::{Arc, Weak},
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::{MediaAsset, UploadOutcome},
    error::UploadFailure,
    protocol::RegisterImageRequest,
};
use thiserror::Error;
use tokio::{
    sync::{broadcast, Mutex},
    time::Instant,
};
use tracing::{debug, error, info, warn};

pub mod banner;
pub mod config;
pub mod transport;

use banner::OutcomeBanner;
use config::UploaderSettings;
use transport::{HttpMediaHost, HttpRecordBackend};

pub const SUBMIT_LABEL_IDLE: &str = "Upload Image";
pub const SUBMIT_LABEL_IN_FLIGHT: &str = "Uploading...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub filename: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

pub async fn load_image_file(path: &Path) -> Result<ImageFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read image file '{}'", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("image path '{}' has no file name", path.display()))?
        .to_string();
    let mime_type = mime_guess::from_path(path).first_raw().map(str::to_string);
    Ok(ImageFile {
        filename,
        mime_type,
        bytes,
    })
}

/// Stores an image and returns its durable public URL.
#[async_trait]
pub trait MediaHost: Send + Sync {
    async fn upload(&self, file: &ImageFile) -> Result<MediaAsset>;
}

/// System of record for (name, URL) pairs.
#[async_trait]
pub trait RecordBackend: Send + Sync {
    async fn register(&self, request: &RegisterImageRequest) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowPhase {
    #[default]
    Idle,
    Validating,
    UploadingAsset,
    RegisteringRecord,
}

impl WorkflowPhase {
    pub fn is_in_flight(self) -> bool {
        matches!(self, Self::UploadingAsset | Self::RegisteringRecord)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    PhaseChanged(WorkflowPhase),
    InFlightChanged(bool),
    AssetUploaded(MediaAsset),
    OutcomeShown(UploadOutcome),
    BannerHidden,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("an upload is already in progress")]
    InFlight,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowSnapshot {
    pub name: String,
    pub has_file: bool,
    pub phase: WorkflowPhase,
    pub in_flight: bool,
    pub banner: Option<UploadOutcome>,
    pub preview_url: Option<String>,
}

impl WorkflowSnapshot {
    pub fn submit_enabled(&self) -> bool {
        !self.in_flight
    }

    pub fn submit_label(&self) -> &'static str {
        if self.in_flight {
            SUBMIT_LABEL_IN_FLIGHT
        } else {
            SUBMIT_LABEL_IDLE
        }
    }
}

struct WorkflowState {
    selected_file: Option<ImageFile>,
    name: String,
    phase: WorkflowPhase,
    banner: OutcomeBanner,
    last_asset_url: Option<String>,
}

struct UploadRequest {
    name: String,
    file: ImageFile,
}

pub struct UploadWorkflow {
    media_host: Arc<dyn MediaHost>,
    record_backend: Arc<dyn RecordBackend>,
    inner: Mutex<WorkflowState>,
    events: broadcast::Sender<WorkflowEvent>,
}

impl UploadWorkflow {
    pub fn new(
        media_host: Arc<dyn MediaHost>,
        record_backend: Arc<dyn RecordBackend>,
        banner_display: Duration,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            media_host,
            record_backend,
            inner: Mutex::new(WorkflowState {
                selected_file: None,
                name: String::new(),
                phase: WorkflowPhase::Idle,
                banner: OutcomeBanner::new(banner_display),
                last_asset_url: None,
            }),
            events,
        })
    }

    pub fn from_settings(settings: &UploaderSettings) -> Arc<Self> {
        let http = Client::new();
        Self::new(
            Arc::new(HttpMediaHost::from_settings(http.clone(), settings)),
            Arc::new(HttpRecordBackend::from_settings(http, settings)),
            settings.banner_display_duration(),
        )
    }

    pub async fn select_file(&self, file: ImageFile) {
        debug!(filename = %file.filename, size_bytes = file.bytes.len(), "upload: file selected");
        self.inner.lock().await.selected_file = Some(file);
    }

    pub async fn set_name(&self, name: impl Into<String>) {
        self.inner.lock().await.name = name.into();
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> WorkflowSnapshot {
        let guard = self.inner.lock().await;
        WorkflowSnapshot {
            name: guard.name.clone(),
            has_file: guard.selected_file.is_some(),
            phase: guard.phase,
            in_flight: guard.phase.is_in_flight(),
            banner: guard.banner.visible(Instant::now()).cloned(),
            preview_url: guard.last_asset_url.clone(),
        }
    }

    /// Runs one submission attempt to its terminal outcome.
    ///
    /// Only a concurrent attempt is reported as an error; every failure of the
    /// attempt itself is folded into the returned [`UploadOutcome`].
    ///
    /// Once validation passes, the remote calls run on their own task. Dropping
    /// the returned future does not abort them, and the attempt still returns
    /// the workflow to `Idle` when it concludes.
    pub async fn submit(self: &Arc<Self>) -> std::result::Result<UploadOutcome, SubmitError> {
        let (request, banner_cleared) = {
            let mut guard = self.inner.lock().await;
            if guard.phase != WorkflowPhase::Idle {
                return Err(SubmitError::InFlight);
            }
            guard.phase = WorkflowPhase::Validating;

            let request = match (&guard.selected_file, guard.name.trim()) {
                (Some(file), name) if !name.is_empty() => Some(UploadRequest {
                    name: name.to_string(),
                    file: file.clone(),
                }),
                _ => None,
            };

            match request {
                Some(request) => {
                    guard.phase = WorkflowPhase::UploadingAsset;
                    (request, guard.banner.clear())
                }
                None => {
                    drop(guard);
                    info!("upload: rejected submission with missing name or file");
                    return Ok(self
                        .conclude(UploadFailure::MissingInput.into(), false)
                        .await);
                }
            }
        };

        if banner_cleared {
            let _ = self.events.send(WorkflowEvent::BannerHidden);
        }
        let _ = self.events.send(WorkflowEvent::InFlightChanged(true));
        let _ = self
            .events
            .send(WorkflowEvent::PhaseChanged(WorkflowPhase::UploadingAsset));

        let attempt = tokio::spawn(self.clone().run_remote_phases(request));
        match attempt.await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                error!("upload: attempt task ended abnormally: {err}");
                Ok(self.conclude(UploadFailure::MediaHost.into(), true).await)
            }
        }
    }

    async fn run_remote_phases(self: Arc<Self>, request: UploadRequest) -> UploadOutcome {
        info!(
            name = %request.name,
            filename = %request.file.filename,
            "upload: sending asset to media host"
        );

        let asset = match self.media_host.upload(&request.file).await {
            Ok(asset) => asset,
            Err(err) => {
                warn!("upload: media host failed: {err:#}");
                return self.conclude(UploadFailure::MediaHost.into(), true).await;
            }
        };

        {
            let mut guard = self.inner.lock().await;
            guard.last_asset_url = Some(asset.secure_url.clone());
            guard.phase = WorkflowPhase::RegisteringRecord;
        }
        let _ = self.events.send(WorkflowEvent::AssetUploaded(asset.clone()));
        let _ = self
            .events
            .send(WorkflowEvent::PhaseChanged(WorkflowPhase::RegisteringRecord));
        info!(url = %asset.secure_url, "upload: registering image record");

        let record = RegisterImageRequest {
            name: request.name,
            image_url: asset.secure_url,
        };
        let outcome = match self.record_backend.register(&record).await {
            Ok(()) => UploadOutcome::uploaded(),
            Err(err) => {
                warn!(url = %record.image_url, "upload: record backend failed: {err:#}");
                UploadFailure::RecordBackend.into()
            }
        };

        self.conclude(outcome, true).await
    }

    /// Returns to `Idle` and shows `outcome` under one lock, so a new attempt
    /// can never start between the two.
    async fn conclude(
        self: &Arc<Self>,
        outcome: UploadOutcome,
        was_in_flight: bool,
    ) -> UploadOutcome {
        let (generation, display_for) = {
            let mut guard = self.inner.lock().await;
            guard.phase = WorkflowPhase::Idle;
            let generation = guard.banner.show(outcome.clone(), Instant::now());
            (generation, guard.banner.display_for())
        };

        if was_in_flight {
            let _ = self.events.send(WorkflowEvent::InFlightChanged(false));
            let _ = self
                .events
                .send(WorkflowEvent::PhaseChanged(WorkflowPhase::Idle));
        }
        info!(kind = ?outcome.kind(), message = outcome.message(), "upload: outcome");
        let _ = self.events.send(WorkflowEvent::OutcomeShown(outcome.clone()));
        spawn_banner_expiry(Arc::downgrade(self), generation, display_for);
        outcome
    }

    async fn expire_banner(&self, generation: u64) {
        let hidden = self.inner.lock().await.banner.expire(generation);
        if hidden {
            let _ = self.events.send(WorkflowEvent::BannerHidden);
        }
    }
}

fn spawn_banner_expiry(workflow: Weak<UploadWorkflow>, generation: u64, display_for: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(display_for).await;
        if let Some(workflow) = workflow.upgrade() {
            workflow.expire_banner(generation).await;
        }
    });
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
