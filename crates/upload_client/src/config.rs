use std::{collections::HashMap, fs, path::Path, time::Duration};

use anyhow::{anyhow, bail, Context};
use url::Url;

pub const DEFAULT_SETTINGS_FILE: &str = "uploader.toml";
pub const DEFAULT_BANNER_DISPLAY_SECS: u64 = 4;
pub const MAX_BANNER_DISPLAY_SECS: u64 = 86_400;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploaderSettings {
    pub media_upload_url: String,
    pub upload_preset: String,
    pub folder: String,
    pub resource_type: String,
    pub backend_base_url: String,
    pub records_path: String,
    pub banner_display_secs: u64,
}

impl Default for UploaderSettings {
    fn default() -> Self {
        Self {
            media_upload_url: "https://api.cloudinary.com/v1_1/dkdce4jxr/image/upload".into(),
            upload_preset: "kietDisplay".into(),
            folder: "kiet".into(),
            resource_type: "image".into(),
            backend_base_url: "https://kiet-display-backend.onrender.com".into(),
            records_path: "/api/images".into(),
            banner_display_secs: DEFAULT_BANNER_DISPLAY_SECS,
        }
    }
}

impl UploaderSettings {
    pub fn banner_display_duration(&self) -> Duration {
        Duration::from_secs(self.banner_display_secs)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        Url::parse(&self.media_upload_url)
            .with_context(|| format!("invalid media upload url '{}'", self.media_upload_url))?;
        Url::parse(&self.backend_base_url)
            .with_context(|| format!("invalid backend base url '{}'", self.backend_base_url))?;
        if self.upload_preset.trim().is_empty() {
            bail!("upload preset must not be empty");
        }
        if self.banner_display_secs == 0 {
            bail!("banner display duration must be at least one second");
        }
        if self.banner_display_secs > MAX_BANNER_DISPLAY_SECS {
            bail!(
                "banner display duration must not exceed {MAX_BANNER_DISPLAY_SECS} seconds, got {}",
                self.banner_display_secs
            );
        }
        Ok(())
    }
}

/// Loads settings from defaults, then `path` (or `uploader.toml` in the working
/// directory when present), then the process environment.
///
/// An explicitly requested file must exist and parse; the implicit default file
/// is skipped when absent.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<UploaderSettings> {
    load_settings_with_env(path, |key| std::env::var(key).ok())
}

pub fn load_settings_with_env(
    path: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<UploaderSettings> {
    let mut settings = UploaderSettings::default();

    match path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
            apply_file_overrides(&mut settings, &raw)
                .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;
        }
        None => {
            if let Ok(raw) = fs::read_to_string(DEFAULT_SETTINGS_FILE) {
                apply_file_overrides(&mut settings, &raw).with_context(|| {
                    format!("failed to parse settings file '{DEFAULT_SETTINGS_FILE}'")
                })?;
            }
        }
    }

    apply_env_overrides(&mut settings, lookup)?;
    Ok(settings)
}

pub fn apply_file_overrides(settings: &mut UploaderSettings, raw: &str) -> anyhow::Result<()> {
    let file_cfg = toml::from_str::<HashMap<String, toml::Value>>(raw)?;
    for (key, value) in file_cfg {
        let value = match value {
            toml::Value::String(s) => s,
            toml::Value::Integer(i) => i.to_string(),
            other => bail!("unsupported value for '{key}': {other}"),
        };
        apply_setting(settings, &key, value)?;
    }
    Ok(())
}

/// Each setting is read from `UPLOADER_<KEY>` and then from the `APP__<KEY>`
/// alias, so the alias wins when both are set.
pub fn apply_env_overrides(
    settings: &mut UploaderSettings,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    const KEYS: [&str; 7] = [
        "media_upload_url",
        "upload_preset",
        "folder",
        "resource_type",
        "backend_base_url",
        "records_path",
        "banner_display_secs",
    ];

    for key in KEYS {
        let upper = key.to_ascii_uppercase();
        for var in [format!("UPLOADER_{upper}"), format!("APP__{upper}")] {
            if let Some(value) = lookup(&var) {
                apply_setting(settings, key, value)
                    .with_context(|| format!("invalid value in environment variable {var}"))?;
            }
        }
    }
    Ok(())
}

fn apply_setting(settings: &mut UploaderSettings, key: &str, value: String) -> anyhow::Result<()> {
    match key {
        "media_upload_url" => settings.media_upload_url = value,
        "upload_preset" => settings.upload_preset = value,
        "folder" => settings.folder = value,
        "resource_type" => settings.resource_type = value,
        "backend_base_url" => settings.backend_base_url = value,
        "records_path" => settings.records_path = value,
        "banner_display_secs" => {
            settings.banner_display_secs = value
                .trim()
                .parse()
                .map_err(|e| anyhow!("banner_display_secs must be a whole number: {e}"))?;
        }
        other => bail!("unknown setting '{other}'"),
    }
    Ok(())
}
