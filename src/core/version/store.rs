use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};

use super::version_file::Profile;

/// Reads and writes `versions/<id>/<id>.json`, memoizing parsed profiles.
pub struct ProfileStore {
    versions_dir: PathBuf,
    cache: HashMap<String, Profile>,
}

impl ProfileStore {
    pub fn new(root_dir: &Path) -> Self {
        Self {
            versions_dir: root_dir.join("versions"),
            cache: HashMap::new(),
        }
    }

    pub fn version_dir(&self, id: &str) -> PathBuf {
        self.versions_dir.join(id)
    }

    pub fn profile_path(&self, id: &str) -> PathBuf {
        self.version_dir(id).join(format!("{id}.json"))
    }

    pub fn jar_path(&self, id: &str) -> PathBuf {
        self.version_dir(id).join(format!("{id}.jar"))
    }

    pub fn exists(&self, id: &str) -> bool {
        self.cache.contains_key(id) || self.profile_path(id).is_file()
    }

    /// Load a profile. `Ok(None)` when no document exists for `id`.
    pub fn load(&mut self, id: &str) -> LauncherResult<Option<Profile>> {
        if let Some(profile) = self.cache.get(id) {
            return Ok(Some(profile.clone()));
        }

        let path = self.profile_path(id);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(LauncherError::Io { path, source: e }),
        };

        let mut profile: Profile = serde_json::from_str(&raw)?;
        if profile.id.is_empty() {
            profile.id = id.to_string();
        }
        debug!("Loaded profile {} from {:?}", id, path);
        self.cache.insert(id.to_string(), profile.clone());
        Ok(Some(profile))
    }

    /// Persist a profile under its own id, replacing any cached copy.
    pub fn save(&mut self, profile: &Profile) -> LauncherResult<PathBuf> {
        if profile.id.trim().is_empty() {
            return Err(LauncherError::ProfileResolution(
                "refusing to save a profile without an id".into(),
            ));
        }
        let dir = self.version_dir(&profile.id);
        std::fs::create_dir_all(&dir).map_err(|e| LauncherError::Io {
            path: dir.clone(),
            source: e,
        })?;

        let path = self.profile_path(&profile.id);
        let json = serde_json::to_string_pretty(profile)?;
        std::fs::write(&path, json).map_err(|e| LauncherError::Io {
            path: path.clone(),
            source: e,
        })?;

        self.cache.insert(profile.id.clone(), profile.clone());
        Ok(path)
    }

    /// Drop a memoized entry so the next load re-reads the file.
    pub fn forget(&mut self, id: &str) {
        self.cache.remove(id);
    }
}
