use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::error::{LauncherError, LauncherResult};

pub const SETTINGS_FILE: &str = "launcher_settings.json";

const DEFAULT_WORKERS: usize = 6;
const MAX_WORKERS: usize = 12;

/// Which origin is tried first when an artifact has a known mirror.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadSource {
    /// Keep the URL as declared, mirror second.
    #[default]
    Auto,
    /// Official origin first.
    Mojang,
    /// BMCLAPI mirror first.
    Bmclapi,
}

impl FromStr for DownloadSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "mojang" => Ok(Self::Mojang),
            "bmclapi" => Ok(Self::Bmclapi),
            other => Err(format!("unknown download source: {other}")),
        }
    }
}

impl fmt::Display for DownloadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Auto => "auto",
            Self::Mojang => "mojang",
            Self::Bmclapi => "bmclapi",
        };
        f.write_str(s)
    }
}

/// Upstream base URLs. Overridable for private mirrors and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub version_manifest: String,
    pub resources: String,
    pub libraries: String,
    pub fabric_meta: String,
    pub fabric_maven: String,
    pub quilt_meta: String,
    pub quilt_maven: String,
    pub forge_maven: String,
    pub neoforge_maven: String,
    pub bmclapi: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            version_manifest: "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json"
                .into(),
            resources: "https://resources.download.minecraft.net".into(),
            libraries: crate::core::maven::MOJANG_LIBRARIES.into(),
            fabric_meta: "https://meta.fabricmc.net/v2".into(),
            fabric_maven: crate::core::maven::FABRIC_MAVEN.into(),
            quilt_meta: "https://meta.quiltmc.org/v3".into(),
            quilt_maven: crate::core::maven::QUILT_MAVEN.into(),
            forge_maven: crate::core::maven::FORGE_MAVEN.into(),
            neoforge_maven: crate::core::maven::NEOFORGE_MAVEN.into(),
            bmclapi: crate::core::downloader::BMCLAPI_BASE.into(),
        }
    }
}

/// Persisted engine configuration (`<root>/launcher_settings.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub download_source: DownloadSource,
    pub mirrors_enabled: bool,
    /// Per-transfer bandwidth cap in KiB/s. `0` disables throttling.
    pub max_kbps: u64,
    /// Worker count. `0` picks the default.
    pub parallel: usize,
    /// Inactivity timeout for one connect or one body read.
    pub timeout_ms: u64,
    pub max_attempts: u32,
    pub allow_resume: bool,
    pub java_path: Option<PathBuf>,
    pub endpoints: Endpoints,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            download_source: DownloadSource::Auto,
            mirrors_enabled: true,
            max_kbps: 0,
            parallel: 0,
            timeout_ms: 30_000,
            max_attempts: 5,
            allow_resume: true,
            java_path: None,
            endpoints: Endpoints::default(),
        }
    }
}

impl EngineSettings {
    pub fn worker_count(&self) -> usize {
        match self.parallel {
            0 => DEFAULT_WORKERS,
            n => n.clamp(1, MAX_WORKERS),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(1))
    }

    /// Load from `<root>/launcher_settings.json`, defaults when missing or unreadable.
    pub fn load(root: &Path) -> Self {
        load_settings_from_disk(root).unwrap_or_default()
    }

    pub fn save(&self, root: &Path) -> LauncherResult<()> {
        std::fs::create_dir_all(root).map_err(|e| LauncherError::Io {
            path: root.to_path_buf(),
            source: e,
        })?;
        let path = root.join(SETTINGS_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).map_err(|e| LauncherError::Io { path, source: e })
    }
}

fn load_settings_from_disk(root: &Path) -> Option<EngineSettings> {
    let path = root.join(SETTINGS_FILE);
    let raw = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(settings) => Some(settings),
        Err(e) => {
            warn!("Ignoring invalid settings at {:?}: {}", path, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_count_defaults_and_clamps() {
        let mut settings = EngineSettings::default();
        assert_eq!(settings.worker_count(), 6);
        settings.parallel = 40;
        assert_eq!(settings.worker_count(), 12);
        settings.parallel = 3;
        assert_eq!(settings.worker_count(), 3);
    }

    #[test]
    fn partial_settings_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"download_source":"bmclapi","max_kbps":512}"#,
        )
        .unwrap();

        let settings = EngineSettings::load(dir.path());
        assert_eq!(settings.download_source, DownloadSource::Bmclapi);
        assert_eq!(settings.max_kbps, 512);
        assert_eq!(settings.max_attempts, 5);
        assert!(settings.allow_resume);
    }

    #[test]
    fn invalid_settings_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), "{not json").unwrap();
        assert_eq!(EngineSettings::load(dir.path()), EngineSettings::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = EngineSettings::default();
        settings.mirrors_enabled = false;
        settings.java_path = Some(PathBuf::from("/opt/jdk/bin/java"));
        settings.save(dir.path()).unwrap();
        assert_eq!(EngineSettings::load(dir.path()), settings);
    }

    #[test]
    fn download_source_parses_case_insensitively() {
        assert_eq!("BMCLAPI".parse::<DownloadSource>(), Ok(DownloadSource::Bmclapi));
        assert!("cdn".parse::<DownloadSource>().is_err());
    }
}
