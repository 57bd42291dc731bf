// Public operations of the engine. The CLI in `main.rs` is a thin layer
// over these; embedders call them directly.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::core::acquire::{self, AcquireReport};
use crate::core::downloader::ProgressSink;
use crate::core::error::LauncherError;
use crate::core::loaders::{InstallContext, Installer, LoaderInstallResult, LoaderKind};
use crate::core::resolver::flatten_profile;
use crate::core::state::EngineState;
use crate::core::version::Platform;

/// Write `<id>-flat` for `version_id` and return the id to launch.
/// Falls back to `version_id` unchanged when flattening does not apply.
pub fn resolve_and_flatten_profile(root_dir: &Path, version_id: &str) -> String {
    flatten_profile(root_dir, version_id, &Platform::current())
}

pub async fn acquire_artifacts(
    state: &EngineState,
    version_id: &str,
    progress: &ProgressSink<'_>,
) -> Result<AcquireReport, LauncherError> {
    acquire::acquire_profile_artifacts(state, version_id, progress).await
}

pub async fn install_loader(
    state: &EngineState,
    kind: LoaderKind,
    base_version: &str,
    build_hint: Option<&str>,
    progress: &ProgressSink<'_>,
) -> Result<LoaderInstallResult, LauncherError> {
    let installer = Installer::new(kind, state);
    installer
        .install(InstallContext {
            state,
            base_version,
            build_hint,
            progress,
        })
        .await
}

pub async fn list_loader_builds(
    state: &EngineState,
    kind: LoaderKind,
    base_version: &str,
) -> Result<Vec<String>, LauncherError> {
    Installer::new(kind, state).list_builds(state, base_version).await
}

pub fn clean_partial_markers(root_dir: &Path) -> Result<usize, LauncherError> {
    acquire::clean_partial_markers(root_dir)
}

/// Result of a full install → flatten → acquire run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionReport {
    pub install: LoaderInstallResult,
    /// Id to hand to a launcher: the flat profile when one was written.
    pub launch_id: String,
    pub acquired: AcquireReport,
}

/// Install a loader (or plain vanilla), flatten the result and make sure
/// every file the launch profile needs is on disk.
pub async fn provision(
    state: &EngineState,
    kind: LoaderKind,
    base_version: &str,
    build_hint: Option<&str>,
    progress: &ProgressSink<'_>,
) -> Result<ProvisionReport, LauncherError> {
    let install = install_loader(state, kind, base_version, build_hint, progress).await?;
    let launch_id = resolve_and_flatten_profile(&state.root_dir, &install.version_id);
    let acquired = acquire_artifacts(state, &launch_id, progress).await?;

    info!(
        "Provisioned {} {} on {} as {}",
        kind,
        install.resolved_build.as_deref().unwrap_or("-"),
        install.base_version,
        launch_id
    );
    Ok(ProvisionReport {
        install,
        launch_id,
        acquired,
    })
}
