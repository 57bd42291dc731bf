use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use tokio::sync::Mutex;

use crate::core::downloader::{ContentHash, Downloader, FetchOptions, MirrorTable};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::build_http_client;
use crate::core::version::ManifestCache;

use super::settings::EngineSettings;

const APP_DIR_NAME: &str = "InterfaceOficial";
const MANIFEST_TTL: Duration = Duration::from_secs(30 * 60);

/// Everything an operation needs: where the game tree lives, how to
/// download, and the caller-owned manifest cache.
pub struct EngineState {
    pub root_dir: PathBuf,
    pub settings: EngineSettings,
    pub http_client: Client,
    pub mirrors: MirrorTable,
    pub manifest_cache: Mutex<ManifestCache>,
}

impl EngineState {
    pub fn new(root_dir: PathBuf, settings: EngineSettings) -> LauncherResult<Self> {
        let http_client = build_http_client(settings.timeout())?;
        let mirrors = MirrorTable::new(&settings.endpoints.bmclapi);

        Ok(Self {
            root_dir,
            settings,
            http_client,
            mirrors,
            manifest_cache: Mutex::new(ManifestCache::new(MANIFEST_TTL)),
        })
    }

    /// Open a root directory, reading its persisted settings.
    pub fn open(root_dir: PathBuf) -> LauncherResult<Self> {
        let settings = EngineSettings::load(&root_dir);
        Self::new(root_dir, settings)
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.root_dir.join("versions")
    }

    pub fn libraries_dir(&self) -> PathBuf {
        self.root_dir.join("libraries")
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.root_dir.join("assets")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.root_dir.join("launcher_cache")
    }

    pub fn downloader(&self) -> Downloader {
        Downloader::new(self.http_client.clone())
    }

    /// Ordered candidate origins for `url` under the current settings.
    pub fn mirrors_for(&self, url: &str) -> Vec<String> {
        self.mirrors.build(
            self.settings.download_source,
            self.settings.mirrors_enabled,
            url,
        )
    }

    /// Transfer options for one artifact, mirrors already expanded.
    pub fn fetch_options(
        &self,
        url: &str,
        label: impl Into<String>,
        expected_hash: Option<ContentHash>,
    ) -> FetchOptions {
        FetchOptions {
            label: label.into(),
            mirrors: self.mirrors_for(url),
            max_kbps: self.settings.max_kbps,
            timeout: self.settings.timeout(),
            max_attempts: self.settings.max_attempts.max(1),
            allow_resume: self.settings.allow_resume,
            expected_hash,
        }
    }
}

fn default_base_dir() -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// `<data_dir>/InterfaceOficial`, the root used when none is given.
pub fn default_data_dir() -> PathBuf {
    default_base_dir().join(APP_DIR_NAME)
}

/// Copy a file only when the destination is missing or differs byte for byte.
pub fn sync_file_copy(source: &Path, destination: &Path) -> LauncherResult<bool> {
    let source_bytes = std::fs::read(source).map_err(|e| LauncherError::Io {
        path: source.to_path_buf(),
        source: e,
    })?;
    if let Ok(existing) = std::fs::read(destination) {
        if existing == source_bytes {
            return Ok(false);
        }
    }
    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent).map_err(|e| LauncherError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    std::fs::write(destination, &source_bytes).map_err(|e| LauncherError::Io {
        path: destination.to_path_buf(),
        source: e,
    })?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_rooted() {
        let state = EngineState::new(PathBuf::from("/games/mc"), EngineSettings::default()).unwrap();
        assert_eq!(state.versions_dir(), PathBuf::from("/games/mc/versions"));
        assert_eq!(state.libraries_dir(), PathBuf::from("/games/mc/libraries"));
        assert_eq!(state.assets_dir(), PathBuf::from("/games/mc/assets"));
    }

    #[test]
    fn fetch_options_follow_settings() {
        let mut settings = EngineSettings::default();
        settings.mirrors_enabled = false;
        settings.max_attempts = 0;
        let state = EngineState::new(PathBuf::from("/tmp/x"), settings).unwrap();

        let opts = state.fetch_options("https://libraries.minecraft.net/a.jar", "lib", None);
        assert_eq!(opts.mirrors, vec!["https://libraries.minecraft.net/a.jar".to_string()]);
        assert_eq!(opts.max_attempts, 1);
        assert_eq!(opts.label, "lib");
    }

    #[test]
    fn sync_file_copy_skips_identical_content() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.jar");
        let dst = dir.path().join("nested").join("b.jar");
        std::fs::write(&src, b"PK-bytes").unwrap();

        assert!(sync_file_copy(&src, &dst).unwrap());
        assert!(!sync_file_copy(&src, &dst).unwrap());

        std::fs::write(&dst, b"stale").unwrap();
        assert!(sync_file_copy(&src, &dst).unwrap());
        assert_eq!(std::fs::read(&dst).unwrap(), b"PK-bytes");
    }
}
