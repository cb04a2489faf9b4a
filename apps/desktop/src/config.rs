use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use client_core::DirectoryEndpoints;
use serde::Deserialize;
use shared::domain::DEFAULT_HANDOFF_SCREEN;
use url::Url;

pub const DEFAULT_CONFIG_PATH: &str = "desktop.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub directory_base_url: String,
    pub regions_path: String,
    pub sub_regions_path: String,
    /// `None` waits for directory responses indefinitely.
    pub request_timeout_secs: Option<u64>,
    pub handoff_screen: String,
}

impl Default for Settings {
    fn default() -> Self {
        let endpoints = DirectoryEndpoints::ibge();
        Self {
            directory_base_url: "https://servicodados.ibge.gov.br/api/v1/localidades".into(),
            regions_path: endpoints.regions_path,
            sub_regions_path: endpoints.sub_regions_path,
            request_timeout_secs: None,
            handoff_screen: DEFAULT_HANDOFF_SCREEN.into(),
        }
    }
}

impl Settings {
    pub fn endpoints(&self) -> DirectoryEndpoints {
        DirectoryEndpoints {
            regions_path: self.regions_path.clone(),
            sub_regions_path: self.sub_regions_path.clone(),
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        Url::parse(&self.directory_base_url).with_context(|| {
            format!("invalid directory base url {:?}", self.directory_base_url)
        })?;
        anyhow::ensure!(
            self.sub_regions_path
                .contains(DirectoryEndpoints::CODE_PLACEHOLDER),
            "sub_regions_path {:?} must contain {}",
            self.sub_regions_path,
            DirectoryEndpoints::CODE_PLACEHOLDER
        );
        anyhow::ensure!(
            !self.handoff_screen.trim().is_empty(),
            "handoff_screen must not be empty"
        );
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    directory_base_url: Option<String>,
    regions_path: Option<String>,
    sub_regions_path: Option<String>,
    request_timeout_secs: Option<u64>,
    handoff_screen: Option<String>,
}

pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        apply_file(&mut settings, &raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.directory_base_url {
        settings.directory_base_url = v;
    }
    if let Some(v) = file_cfg.regions_path {
        settings.regions_path = v;
    }
    if let Some(v) = file_cfg.sub_regions_path {
        settings.sub_regions_path = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = Some(v);
    }
    if let Some(v) = file_cfg.handoff_screen {
        settings.handoff_screen = v;
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("DIRECTORY_BASE_URL") {
        settings.directory_base_url = v;
    }
    if let Some(v) = var("APP__DIRECTORY_BASE_URL") {
        settings.directory_base_url = v;
    }

    if let Some(v) = var("APP__REGIONS_PATH") {
        settings.regions_path = v;
    }
    if let Some(v) = var("APP__SUB_REGIONS_PATH") {
        settings.sub_regions_path = v;
    }

    if let Some(v) = var("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = Some(parsed);
        }
    }

    if let Some(v) = var("APP__HANDOFF_SCREEN") {
        settings.handoff_screen = v;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
