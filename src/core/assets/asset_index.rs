use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::error::{LauncherError, LauncherResult};

/// Top-level asset index JSON structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetIndex {
    #[serde(default)]
    pub objects: HashMap<String, AssetObject>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetObject {
    pub hash: String,
    pub size: u64,
}

impl AssetObject {
    /// `ab/abcdef...`, shared by the object store and the resources origin.
    pub fn relative_path(&self) -> String {
        let prefix = self.hash.get(..2).unwrap_or(&self.hash);
        format!("{}/{}", prefix, self.hash)
    }

    pub fn url(&self, resources_base: &str) -> String {
        format!(
            "{}/{}",
            resources_base.trim_end_matches('/'),
            self.relative_path()
        )
    }

    /// `<assets>/objects/<xx>/<hash>`.
    pub fn local_path(&self, assets_dir: &Path) -> PathBuf {
        let prefix = self.hash.get(..2).unwrap_or(&self.hash);
        assets_dir.join("objects").join(prefix).join(&self.hash)
    }
}

impl AssetIndex {
    pub fn read(path: &Path) -> LauncherResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| LauncherError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Objects with distinct hashes; several names often share one blob.
    pub fn unique_objects(&self) -> Vec<&AssetObject> {
        let mut seen = std::collections::HashSet::new();
        let mut objects: Vec<&AssetObject> = self
            .objects
            .values()
            .filter(|o| seen.insert(o.hash.as_str()))
            .collect();
        objects.sort_by(|a, b| a.hash.cmp(&b.hash));
        objects
    }
}

/// `<assets>/indexes/<id>.json`.
pub fn index_path(assets_dir: &Path, index_id: &str) -> PathBuf {
    assets_dir.join("indexes").join(format!("{index_id}.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_layout() {
        let object = AssetObject {
            hash: "bdf48ef6b5d0d23bbb02e17d04865216179f510a".into(),
            size: 9,
        };
        assert_eq!(
            object.url("https://resources.download.minecraft.net/"),
            "https://resources.download.minecraft.net/bd/bdf48ef6b5d0d23bbb02e17d04865216179f510a"
        );
        assert_eq!(
            object.local_path(Path::new("/mc/assets")),
            PathBuf::from("/mc/assets/objects/bd/bdf48ef6b5d0d23bbb02e17d04865216179f510a")
        );
    }

    #[test]
    fn duplicates_collapse() {
        let index: AssetIndex = serde_json::from_value(serde_json::json!({
            "objects": {
                "a.ogg": {"hash": "aa11", "size": 1},
                "b.ogg": {"hash": "aa11", "size": 1},
                "c.png": {"hash": "bb22", "size": 2}
            }
        }))
        .unwrap();
        assert_eq!(index.unique_objects().len(), 2);
    }
}
