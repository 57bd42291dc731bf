use async_trait::async_trait;
use tracing::info;

use crate::core::acquire::acquire_profile_artifacts;
use crate::core::downloader::{silent_progress, ContentHash, ProgressSink};
use crate::core::error::LauncherResult;
use crate::core::state::EngineState;
use crate::core::version::manifest::{is_alias, require_entry};
use crate::core::version::{load_manifest, ProfileStore};

use super::context::InstallContext;
use super::installer::{LoaderInstallResult, LoaderInstaller};

/// Vanilla "installer": the base game profile plus everything it needs.
pub struct VanillaInstaller;

/// Turn an alias into a concrete id. Plain ids pass through untouched.
pub async fn resolve_base_id(state: &EngineState, requested: &str) -> LauncherResult<String> {
    if !is_alias(requested) {
        return Ok(requested.trim().to_string());
    }
    let manifest = load_manifest(state).await?;
    Ok(require_entry(&manifest, requested)?.id.clone())
}

/// Make sure `versions/<id>/<id>.json` exists, fetching it through the
/// manifest when missing. Returns the concrete id.
pub async fn ensure_base_profile(state: &EngineState, requested: &str) -> LauncherResult<String> {
    let id = resolve_base_id(state, requested).await?;
    let store = ProfileStore::new(&state.root_dir);
    if store.exists(&id) {
        return Ok(id);
    }

    let manifest = load_manifest(state).await?;
    let entry = require_entry(&manifest, &id)?;
    info!("Fetching profile document for {}", entry.id);

    let opts = state.fetch_options(
        &entry.url,
        format!("{} profile", entry.id),
        ContentHash::from_opt(entry.sha1.as_deref()),
    );
    state
        .downloader()
        .fetch_file(&entry.url, &store.profile_path(&entry.id), &opts, &|_, _| {})
        .await?;
    Ok(entry.id.clone())
}

/// Profile document plus all of its artifacts.
pub async fn ensure_base_version(
    state: &EngineState,
    requested: &str,
    progress: &ProgressSink<'_>,
) -> LauncherResult<String> {
    let id = ensure_base_profile(state, requested).await?;
    acquire_profile_artifacts(state, &id, progress).await?;
    Ok(id)
}

#[async_trait]
impl LoaderInstaller for VanillaInstaller {
    async fn install(&self, ctx: InstallContext<'_>) -> LauncherResult<LoaderInstallResult> {
        info!("Installing Vanilla {}", ctx.base_version);
        let id = ensure_base_version(ctx.state, ctx.base_version, ctx.progress).await?;
        info!("Vanilla {} installed successfully", id);

        Ok(LoaderInstallResult {
            version_id: id.clone(),
            resolved_build: None,
            base_version: id,
        })
    }

    async fn list_builds(&self, state: &EngineState, _base_version: &str) -> LauncherResult<Vec<String>> {
        let manifest = load_manifest(state).await?;
        Ok(manifest.releases().into_iter().map(|e| e.id.clone()).collect())
    }
}
