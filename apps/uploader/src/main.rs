use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::Parser;
use shared::domain::UploadOutcome;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use upload_client::{
    config::{load_settings, UploaderSettings},
    load_image_file, UploadWorkflow, WorkflowEvent, SUBMIT_LABEL_IN_FLIGHT,
};

/// Upload an image to the media host and register it under a name.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "")]
    name: String,
    #[arg(long)]
    file: Option<PathBuf>,
    /// Settings file; defaults to ./uploader.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    backend_url: Option<String>,
    #[arg(long)]
    media_upload_url: Option<String>,
}

fn apply_cli_overrides(settings: &mut UploaderSettings, args: &Args) {
    if let Some(url) = &args.backend_url {
        settings.backend_base_url = url.clone();
    }
    if let Some(url) = &args.media_upload_url {
        settings.media_upload_url = url.clone();
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    apply_cli_overrides(&mut settings, &args);
    settings.validate().context("invalid uploader settings")?;

    let workflow = UploadWorkflow::from_settings(&settings);
    workflow.set_name(args.name.clone()).await;
    if let Some(path) = &args.file {
        match load_image_file(path).await {
            Ok(file) => workflow.select_file(file).await,
            Err(err) => warn!("{err:#}"),
        }
    }

    let mut events = workflow.subscribe_events();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                WorkflowEvent::InFlightChanged(true) => println!("{SUBMIT_LABEL_IN_FLIGHT}"),
                WorkflowEvent::AssetUploaded(asset) => {
                    println!("Stored at {}", asset.secure_url)
                }
                WorkflowEvent::OutcomeShown(_) => break,
                _ => {}
            }
        }
    });

    let outcome = workflow.submit().await?;
    let _ = printer.await;

    println!("{}", outcome.message());
    if let Some(url) = workflow.snapshot().await.preview_url {
        println!("Preview: {url}");
    }

    Ok(match outcome {
        UploadOutcome::Success(_) => ExitCode::SUCCESS,
        UploadOutcome::Failure(_) => ExitCode::FAILURE,
    })
}
