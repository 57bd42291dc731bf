use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::SystemTime;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::context::InstallContext;
use super::installer::{is_valid_jar, LoaderInstallResult, LoaderInstaller};
use super::neoforge::order_neoforge_builds;
use super::vanilla::{ensure_base_version, resolve_base_id};
use crate::core::acquire::acquire_profile_artifacts;
use crate::core::downloader::{ProgressEvent, ProgressPhase, ProgressSink, TaskCategory};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::get_text;
use crate::core::java::resolve_java_binary;
use crate::core::maven::MavenMetadata;
use crate::core::state::{EngineState, Endpoints};
use crate::core::version::ordering::sort_newest_first;

/// Candidates tried when the caller did not pin a build.
const MAX_CANDIDATES: usize = 4;
const OUTPUT_EXCERPT_CHARS: usize = 600;
const LAUNCHER_PROFILES: &str = "launcher_profiles.json";

/// Loaders installed by running their official installer jar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForgeFlavor {
    Forge,
    NeoForge,
}

impl ForgeFlavor {
    pub fn name(self) -> &'static str {
        match self {
            Self::Forge => "Forge",
            Self::NeoForge => "NeoForge",
        }
    }

    /// Lowercase token the installer puts in the profile id.
    pub fn marker(self) -> &'static str {
        match self {
            Self::Forge => "forge",
            Self::NeoForge => "neoforge",
        }
    }

    fn group_path(self) -> &'static str {
        match self {
            Self::Forge => "net/minecraftforge/forge",
            Self::NeoForge => "net/neoforged/neoforge",
        }
    }

    /// Maven version of a build: Forge prefixes the game version.
    fn artifact_version(self, mc: &str, build: &str) -> String {
        match self {
            Self::Forge => format!("{}-{}", mc, build),
            Self::NeoForge => build.to_string(),
        }
    }

    pub fn installer_path(self, mc: &str, build: &str) -> String {
        let version = self.artifact_version(mc, build);
        format!(
            "{}/{}/{}-{}-installer.jar",
            self.group_path(),
            version,
            self.marker(),
            version
        )
    }

    /// Builds for `mc` from the raw metadata versions, newest first.
    pub fn select_builds(self, mc: &str, versions: Vec<String>) -> Vec<String> {
        match self {
            Self::Forge => {
                let prefix = format!("{}-", mc);
                let mut builds: Vec<String> = versions
                    .into_iter()
                    .filter_map(|v| v.strip_prefix(&prefix).map(str::to_string))
                    .filter(|b| !b.is_empty())
                    .collect();
                sort_newest_first(&mut builds);
                builds
            }
            Self::NeoForge => order_neoforge_builds(mc, versions),
        }
    }

    /// Installer argument lists, tried in order until one succeeds.
    pub fn install_arg_variants(self, root: &Path) -> Vec<Vec<OsString>> {
        let root = root.as_os_str().to_os_string();
        let flags: &[&str] = match self {
            Self::Forge => &["--installClient"],
            Self::NeoForge => &["--install-client", "--installClient"],
        };
        let with_root = flags.iter().map(|f| vec![OsString::from(f), root.clone()]);
        let bare = flags.iter().map(|f| vec![OsString::from(f)]);
        with_root.chain(bare).collect()
    }

    fn dir_matches(self, name: &str, mc: &str, build: Option<&str>) -> bool {
        let lower = name.to_ascii_lowercase();
        let marked = match self {
            Self::Forge => lower.contains("forge") && !lower.contains("neoforge"),
            Self::NeoForge => lower.contains("neoforge"),
        };
        if !marked {
            return false;
        }
        match (self, build) {
            (Self::Forge, Some(build)) => name.contains(mc) && name.contains(build),
            (Self::NeoForge, Some(build)) => name.contains(build),
            (_, None) => name.contains(mc),
        }
    }
}

/// Profile directory the installer just wrote, newest first.
///
/// Prefers directories naming the build; falls back to any directory of
/// this loader for the base version.
pub fn discover_installed_profile(
    versions_dir: &Path,
    flavor: ForgeFlavor,
    mc: &str,
    build: &str,
) -> Option<String> {
    let entries: Vec<(String, SystemTime)> = std::fs::read_dir(versions_dir)
        .ok()?
        .filter_map(Result::ok)
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|e| {
            let name = e.file_name().to_str()?.to_string();
            let modified = e.metadata().and_then(|m| m.modified()).unwrap_or(SystemTime::UNIX_EPOCH);
            Some((name, modified))
        })
        .collect();

    let newest = |build: Option<&str>| {
        entries
            .iter()
            .filter(|(name, _)| flavor.dir_matches(name, mc, build))
            .max_by_key(|(_, modified)| *modified)
            .map(|(name, _)| name.clone())
    };
    newest(Some(build)).or_else(|| newest(None))
}

fn excerpt(output: &str) -> String {
    output.trim().chars().take(OUTPUT_EXCERPT_CHARS).collect()
}

/// Forge and NeoForge: published builds from Maven metadata, installed by
/// running the official installer in client mode against the game root.
pub struct ForgeInstaller {
    flavor: ForgeFlavor,
    /// Primary repository first, then mirrors.
    metadata_urls: Vec<String>,
    repository: String,
}

impl ForgeInstaller {
    pub fn new(flavor: ForgeFlavor, repository: String, metadata_urls: Vec<String>) -> Self {
        Self {
            flavor,
            metadata_urls,
            repository,
        }
    }

    pub fn forge(endpoints: &Endpoints) -> Self {
        let flavor = ForgeFlavor::Forge;
        let metadata = format!("{}/maven-metadata.xml", flavor.group_path());
        Self::new(
            flavor,
            endpoints.forge_maven.clone(),
            vec![
                format!("{}/{}", endpoints.forge_maven.trim_end_matches('/'), metadata),
                format!("{}/maven/{}", endpoints.bmclapi.trim_end_matches('/'), metadata),
            ],
        )
    }

    pub fn flavor(&self) -> ForgeFlavor {
        self.flavor
    }

    async fn fetch_metadata_versions(&self, state: &EngineState) -> LauncherResult<Vec<String>> {
        let mut last_error = None;
        for url in &self.metadata_urls {
            let parsed = match get_text(&state.http_client, url).await {
                Ok(xml) => MavenMetadata::parse(&xml),
                Err(e) => Err(e),
            };
            match parsed {
                Ok(meta) if !meta.versions().is_empty() => return Ok(meta.into_versions()),
                Ok(_) => debug!("{} lists no versions", url),
                Err(e) => {
                    debug!("{} metadata from {} failed: {}", self.flavor.name(), url, e);
                    last_error = Some(e);
                }
            }
        }
        Err(LauncherError::LoaderApi(format!(
            "{} metadata unavailable: {}",
            self.flavor.name(),
            last_error.map_or_else(|| "no versions".to_string(), |e| e.to_string())
        )))
    }

    fn compatibility(&self, mc: &str, reason: String) -> LauncherError {
        LauncherError::LoaderCompatibility {
            loader: self.flavor.name().to_string(),
            version: mc.to_string(),
            reason,
        }
    }

    /// Installer jar for one build, reusing a valid cached copy.
    async fn obtain_installer(
        &self,
        state: &EngineState,
        mc: &str,
        build: &str,
        progress: &ProgressSink<'_>,
    ) -> LauncherResult<PathBuf> {
        let rel = self.flavor.installer_path(mc, build);
        let file_name = rel.rsplit('/').next().unwrap_or(rel.as_str());
        let dest = state.cache_dir().join("installers").join(file_name);
        let label = format!("{} {} installer", self.flavor.name(), build);
        let event = |phase, current| ProgressEvent {
            phase,
            category: TaskCategory::Installer,
            current,
            total: 1,
            label: label.clone(),
        };
        if is_valid_jar(&dest) {
            debug!("Reusing cached installer {:?}", dest);
            progress(event(ProgressPhase::Done, 1));
            return Ok(dest);
        }

        progress(event(ProgressPhase::Download, 0));
        let url = format!("{}/{}", self.repository.trim_end_matches('/'), rel);
        let opts = state.fetch_options(&url, label.clone(), None);
        state.downloader().fetch_file(&url, &dest, &opts, &|_, _| {}).await?;
        if !is_valid_jar(&dest) {
            let _ = std::fs::remove_file(&dest);
            return Err(LauncherError::Loader(format!(
                "{} installer for {} is not a valid jar",
                self.flavor.name(),
                build
            )));
        }
        progress(event(ProgressPhase::Done, 1));
        Ok(dest)
    }

    /// Run the installer with each argument variant; the captured output of
    /// the last failure is returned.
    async fn run_installer(&self, java: &Path, installer: &Path, root: &Path) -> Result<(), String> {
        let mut last_output = String::new();
        for args in self.flavor.install_arg_variants(root) {
            debug!("Running {:?} -jar {:?} {:?}", java, installer, args);
            let result = tokio::process::Command::new(java)
                .arg("-jar")
                .arg(installer)
                .args(&args)
                .current_dir(root)
                .stdin(Stdio::null())
                .output()
                .await;
            match result {
                Ok(out) if out.status.success() => return Ok(()),
                Ok(out) => {
                    let stderr = String::from_utf8_lossy(&out.stderr);
                    last_output = if stderr.trim().is_empty() {
                        String::from_utf8_lossy(&out.stdout).into_owned()
                    } else {
                        stderr.into_owned()
                    };
                    if last_output.trim().is_empty() {
                        last_output = format!("installer exited with {}", out.status);
                    }
                }
                Err(e) => last_output = format!("could not start {}: {}", java.display(), e),
            }
        }
        Err(last_output)
    }

    async fn install_build(
        &self,
        ctx: &InstallContext<'_>,
        java: &Path,
        mc: &str,
        build: &str,
    ) -> LauncherResult<String> {
        let state = ctx.state;
        let installer = self.obtain_installer(state, mc, build, ctx.progress).await?;
        ensure_base_version(state, mc, ctx.progress).await?;
        ensure_launcher_profiles(&state.root_dir)?;

        info!("Running {} installer {} for {}", self.flavor.name(), build, mc);
        self.run_installer(java, &installer, &state.root_dir)
            .await
            .map_err(|output| LauncherError::InstallerExecution {
                loader: self.flavor.name().to_string(),
                output: excerpt(&output),
            })?;

        let found = discover_installed_profile(&state.versions_dir(), self.flavor, mc, build)
            .ok_or_else(|| {
                LauncherError::Loader(format!(
                    "{} installer finished but no profile was written for {}",
                    self.flavor.name(),
                    build
                ))
            })?;

        if let Err(e) = acquire_profile_artifacts(state, &found, ctx.progress).await {
            warn!("{} library prefetch for {} failed: {}", self.flavor.name(), found, e);
        }
        Ok(found)
    }
}

/// Installers refuse to run without a launcher profile list.
fn ensure_launcher_profiles(root: &Path) -> LauncherResult<()> {
    let path = root.join(LAUNCHER_PROFILES);
    if path.is_file() {
        return Ok(());
    }
    let body = serde_json::json!({ "profiles": {}, "selectedProfile": null });
    std::fs::write(&path, serde_json::to_string_pretty(&body)?)
        .map_err(|e| LauncherError::Io { path, source: e })
}

#[async_trait]
impl LoaderInstaller for ForgeInstaller {
    async fn install(&self, ctx: InstallContext<'_>) -> LauncherResult<LoaderInstallResult> {
        let mc = resolve_base_id(ctx.state, ctx.base_version).await?;
        let builds = self.list_builds(ctx.state, &mc).await?;
        if builds.is_empty() {
            return Err(self.compatibility(&mc, "no builds published".into()));
        }

        let candidates: Vec<String> = match ctx.build_hint {
            Some(hint) if builds.iter().any(|b| b == hint) => vec![hint.to_string()],
            Some(hint) => {
                return Err(self.compatibility(&mc, format!("build {} is not published", hint)));
            }
            None => builds.into_iter().take(MAX_CANDIDATES).collect(),
        };

        let java = resolve_java_binary(ctx.state.settings.java_path.as_deref())?;
        let mut last_error = None;
        for build in &candidates {
            match self.install_build(&ctx, &java, &mc, build).await {
                Ok(version_id) => {
                    info!("{} {} installed successfully as {}", self.flavor.name(), build, version_id);
                    return Ok(LoaderInstallResult {
                        version_id,
                        resolved_build: Some(build.clone()),
                        base_version: mc,
                    });
                }
                Err(e) => {
                    warn!("{} {} failed: {}", self.flavor.name(), build, e);
                    last_error = Some(e);
                    if ctx.build_hint.is_some() {
                        break;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| self.compatibility(&mc, "no candidate builds".into())))
    }

    async fn list_builds(&self, state: &EngineState, base_version: &str) -> LauncherResult<Vec<String>> {
        let versions = self.fetch_metadata_versions(state).await?;
        Ok(self.flavor.select_builds(base_version, versions))
    }
}
