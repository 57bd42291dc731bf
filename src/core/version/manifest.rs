// ─── Version Manifest ───
// Fetching, caching and querying the version manifest v2.

use std::path::Path;
use std::time::{Duration, Instant, SystemTime};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::get_text_from_any;
use crate::core::state::EngineState;

use super::ordering::{minor_line, sort_newest_first};

const MANIFEST_CACHE_FILE: &str = "version_manifest_v2.json";
const ALIASES: &[&str] = &["latest", "latest-release", "latest-snapshot"];

/// Whether `requested` names a moving target rather than a concrete id.
pub fn is_alias(requested: &str) -> bool {
    ALIASES.contains(&requested.trim())
}

/// Top-level version manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionManifest {
    #[serde(default)]
    pub latest: LatestVersions,
    pub versions: Vec<VersionEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LatestVersions {
    #[serde(default)]
    pub release: Option<String>,
    #[serde(default)]
    pub snapshot: Option<String>,
}

/// A single entry in the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub version_type: String,
    #[serde(rename = "releaseTime", default)]
    pub release_time: String,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
}

impl VersionManifest {
    pub fn find_version(&self, id: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.id == id)
    }

    /// Exact ids plus the `latest-release` / `latest-snapshot` aliases.
    pub fn resolve(&self, requested: &str) -> Option<&VersionEntry> {
        let target = match requested.trim() {
            "latest" | "latest-release" => self.latest.release.as_deref()?,
            "latest-snapshot" => self.latest.snapshot.as_deref()?,
            other => other,
        };
        self.find_version(target)
    }

    pub fn releases(&self) -> Vec<&VersionEntry> {
        self.versions
            .iter()
            .filter(|v| v.version_type == "release")
            .collect()
    }

    /// Other releases on the same `major.minor` line, newest first.
    pub fn same_minor_releases(&self, requested: &str) -> Vec<String> {
        let Some(line) = minor_line(requested) else {
            return Vec::new();
        };
        let dotted = format!("{line}.");
        let mut out: Vec<String> = self
            .releases()
            .into_iter()
            .map(|v| v.id.clone())
            .filter(|id| id != requested && (id == &line || id.starts_with(&dotted)))
            .collect();
        sort_newest_first(&mut out);
        out
    }
}

/// In-memory manifest cache with a time-to-live. Owned by the caller.
pub struct ManifestCache {
    ttl: Duration,
    entry: Option<(Instant, VersionManifest)>,
}

impl ManifestCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self) -> Option<&VersionManifest> {
        match &self.entry {
            Some((stored, manifest)) if stored.elapsed() < self.ttl => Some(manifest),
            _ => None,
        }
    }

    pub fn store(&mut self, manifest: VersionManifest) {
        self.entry = Some((Instant::now(), manifest));
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}

/// Manifest from memory, then the on-disk cache, then the network.
/// A stale disk copy is used when the network is unreachable.
pub async fn load_manifest(state: &EngineState) -> LauncherResult<VersionManifest> {
    let mut cache = state.manifest_cache.lock().await;
    if let Some(manifest) = cache.get() {
        return Ok(manifest.clone());
    }

    let disk_path = state.cache_dir().join(MANIFEST_CACHE_FILE);
    if let Some(manifest) = read_disk_cache(&disk_path, Some(cache.ttl())) {
        debug!("Using cached manifest at {:?}", disk_path);
        cache.store(manifest.clone());
        return Ok(manifest);
    }

    info!("Fetching version manifest...");
    let urls = state.mirrors_for(&state.settings.endpoints.version_manifest);
    match get_text_from_any(&state.http_client, &urls).await {
        Ok(raw) => {
            let manifest: VersionManifest = serde_json::from_str(&raw)?;
            info!("Loaded {} versions from manifest", manifest.versions.len());
            write_disk_cache(&disk_path, &raw);
            cache.store(manifest.clone());
            Ok(manifest)
        }
        Err(e) => match read_disk_cache(&disk_path, None) {
            Some(stale) => {
                warn!("Manifest fetch failed ({}), using stale cache", e);
                Ok(stale)
            }
            None => Err(e),
        },
    }
}

fn read_disk_cache(path: &Path, max_age: Option<Duration>) -> Option<VersionManifest> {
    if let Some(max_age) = max_age {
        let modified = std::fs::metadata(path).ok()?.modified().ok()?;
        let age = SystemTime::now().duration_since(modified).unwrap_or_default();
        if age >= max_age {
            return None;
        }
    }
    let raw = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&raw).ok()
}

fn write_disk_cache(path: &Path, raw: &str) {
    let result = path
        .parent()
        .map_or(Ok(()), std::fs::create_dir_all)
        .and_then(|_| std::fs::write(path, raw));
    if let Err(e) = result {
        warn!("Could not write manifest cache {:?}: {}", path, e);
    }
}

/// Look up `requested` (alias or id), failing with a resolution error.
pub fn require_entry<'a>(
    manifest: &'a VersionManifest,
    requested: &str,
) -> LauncherResult<&'a VersionEntry> {
    manifest.resolve(requested).ok_or_else(|| {
        LauncherError::ProfileResolution(format!(
            "Minecraft version {} not found in manifest",
            requested
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::EngineSettings;

    fn sample() -> VersionManifest {
        serde_json::from_value(serde_json::json!({
            "latest": {"release": "1.16.5", "snapshot": "21w03a"},
            "versions": [
                {"id": "21w03a", "type": "snapshot", "url": "https://x/21w03a.json", "releaseTime": "2021-01-20T00:00:00+00:00"},
                {"id": "1.16.5", "type": "release", "url": "https://x/1.16.5.json", "releaseTime": "2021-01-14T00:00:00+00:00"},
                {"id": "1.16.4", "type": "release", "url": "https://x/1.16.4.json", "releaseTime": "2020-10-29T00:00:00+00:00"},
                {"id": "1.16", "type": "release", "url": "https://x/1.16.json", "releaseTime": "2020-06-23T00:00:00+00:00"},
                {"id": "1.16.10", "type": "release", "url": "https://x/1.16.10.json", "releaseTime": "2099-01-01T00:00:00+00:00"},
                {"id": "1.15.2", "type": "release", "url": "https://x/1.15.2.json", "releaseTime": "2020-01-17T00:00:00+00:00"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn deserialize_manifest_entry() {
        let json = r#"{
            "id": "1.20.4",
            "type": "release",
            "releaseTime": "2023-12-07T08:00:00+00:00",
            "url": "https://example.com/1.20.4.json",
            "sha1": "abc123"
        }"#;
        let entry: VersionEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.version_type, "release");
        assert_eq!(entry.release_time, "2023-12-07T08:00:00+00:00");
        assert_eq!(entry.sha1.as_deref(), Some("abc123"));
    }

    #[test]
    fn aliases_resolve_to_latest() {
        let m = sample();
        assert_eq!(m.resolve("latest-release").unwrap().id, "1.16.5");
        assert_eq!(m.resolve("latest-snapshot").unwrap().id, "21w03a");
        assert!(m.resolve("9.9.9").is_none());
    }

    #[test]
    fn same_minor_releases_newest_first_without_requested() {
        let m = sample();
        assert_eq!(
            m.same_minor_releases("1.16.5"),
            vec!["1.16.10", "1.16.4", "1.16"]
        );
        assert!(m.same_minor_releases("21w03a").is_empty());
    }

    #[test]
    fn cache_expires() {
        let mut cache = ManifestCache::new(Duration::from_millis(0));
        cache.store(sample());
        assert!(cache.get().is_none());

        let mut cache = ManifestCache::new(Duration::from_secs(60));
        cache.store(sample());
        assert!(cache.get().is_some());
    }

    #[tokio::test]
    async fn load_manifest_uses_network_once_then_memory() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::to_string(&sample()).unwrap();
        let mock = server
            .mock("GET", "/manifest.json")
            .with_status(200)
            .with_body(body)
            .expect(1)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut settings = EngineSettings::default();
        settings.endpoints.version_manifest = format!("{}/manifest.json", server.url());
        let state = EngineState::new(dir.path().to_path_buf(), settings).unwrap();

        let first = load_manifest(&state).await.unwrap();
        let second = load_manifest(&state).await.unwrap();
        assert_eq!(first.versions.len(), second.versions.len());
        assert!(dir
            .path()
            .join("launcher_cache")
            .join(MANIFEST_CACHE_FILE)
            .is_file());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn stale_disk_cache_covers_network_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/manifest.json")
            .with_status(503)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let cache_path = dir.path().join("launcher_cache").join(MANIFEST_CACHE_FILE);
        std::fs::create_dir_all(cache_path.parent().unwrap()).unwrap();
        std::fs::write(&cache_path, serde_json::to_string(&sample()).unwrap()).unwrap();

        let mut settings = EngineSettings::default();
        settings.endpoints.version_manifest = format!("{}/manifest.json", server.url());
        let state = EngineState::new(dir.path().to_path_buf(), settings).unwrap();
        // Zero TTL forces the network path before the stale fallback.
        *state.manifest_cache.lock().await = ManifestCache::new(Duration::ZERO);
        // Age the file past the zero TTL.
        std::thread::sleep(Duration::from_millis(5));

        let manifest = load_manifest(&state).await.unwrap();
        assert_eq!(manifest.latest.release.as_deref(), Some("1.16.5"));
    }
}
