use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::error::LauncherResult;
use crate::core::state::EngineState;

use super::{
    context::InstallContext, fabric::FabricInstaller, forge::ForgeInstaller,
    vanilla::VanillaInstaller,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoaderKind {
    Vanilla,
    Fabric,
    Quilt,
    Forge,
    NeoForge,
}

impl FromStr for LoaderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vanilla" => Ok(Self::Vanilla),
            "fabric" => Ok(Self::Fabric),
            "quilt" => Ok(Self::Quilt),
            "forge" => Ok(Self::Forge),
            "neoforge" => Ok(Self::NeoForge),
            other => Err(format!("unknown loader: {other}")),
        }
    }
}

impl fmt::Display for LoaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Vanilla => "vanilla",
            Self::Fabric => "fabric",
            Self::Quilt => "quilt",
            Self::Forge => "forge",
            Self::NeoForge => "neoforge",
        };
        f.write_str(name)
    }
}

/// Outcome of one loader install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoaderInstallResult {
    /// Profile id written under `versions/`.
    pub version_id: String,
    /// Loader build actually installed (`None` for vanilla).
    pub resolved_build: Option<String>,
    /// Base game version the loader was installed on.
    pub base_version: String,
}

#[async_trait]
pub trait LoaderInstaller: Send + Sync {
    async fn install(&self, ctx: InstallContext<'_>) -> LauncherResult<LoaderInstallResult>;

    /// Published builds for `base_version`, newest first.
    async fn list_builds(&self, state: &EngineState, base_version: &str) -> LauncherResult<Vec<String>>;
}

/// One installer per loader family; Quilt shares the Fabric flow and NeoForge the Forge flow.
pub enum Installer {
    Vanilla(VanillaInstaller),
    FabricStyle(FabricInstaller),
    ForgeStyle(ForgeInstaller),
}

impl Installer {
    pub fn new(kind: LoaderKind, state: &EngineState) -> Self {
        let endpoints = &state.settings.endpoints;
        match kind {
            LoaderKind::Vanilla => Self::Vanilla(VanillaInstaller),
            LoaderKind::Fabric => Self::FabricStyle(FabricInstaller::fabric(endpoints)),
            LoaderKind::Quilt => Self::FabricStyle(FabricInstaller::quilt(endpoints)),
            LoaderKind::Forge => Self::ForgeStyle(ForgeInstaller::forge(endpoints)),
            LoaderKind::NeoForge => Self::ForgeStyle(ForgeInstaller::neoforge(endpoints)),
        }
    }

    fn inner(&self) -> &dyn LoaderInstaller {
        match self {
            Installer::Vanilla(i) => i,
            Installer::FabricStyle(i) => i,
            Installer::ForgeStyle(i) => i,
        }
    }

    pub async fn install(&self, ctx: InstallContext<'_>) -> LauncherResult<LoaderInstallResult> {
        self.inner().install(ctx).await
    }

    pub async fn list_builds(&self, state: &EngineState, base_version: &str) -> LauncherResult<Vec<String>> {
        self.inner().list_builds(state, base_version).await
    }
}

/// A jar worth reusing: starts with the zip magic and opens as an archive.
pub fn is_valid_jar(path: &Path) -> bool {
    let Ok(mut file) = std::fs::File::open(path) else {
        return false;
    };
    let mut magic = [0u8; 2];
    if file.read_exact(&mut magic).is_err() || magic != *b"PK" {
        return false;
    }
    std::fs::File::open(path)
        .ok()
        .and_then(|f| zip::ZipArchive::new(f).ok())
        .is_some()
}

#[cfg(test)]
pub(crate) fn write_test_jar(path: &Path, entries: &[(&str, &[u8])]) {
    use std::io::Write;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    for (name, bytes) in entries {
        zip.start_file(*name, zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(bytes).unwrap();
    }
    zip.finish().unwrap();
}
