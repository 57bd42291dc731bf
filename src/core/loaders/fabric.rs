use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::context::InstallContext;
use super::installer::{is_valid_jar, LoaderInstallResult, LoaderInstaller};
use super::vanilla::{ensure_base_version, resolve_base_id};
use crate::core::acquire::acquire_profile_artifacts;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::{error_status, get_json, get_text};
use crate::core::maven::MavenArtifact;
use crate::core::state::{sync_file_copy, EngineState, Endpoints};
use crate::core::version::{load_manifest, Library, Profile, ProfileStore};

/// Endpoints and coordinates that distinguish one Fabric-style loader.
#[derive(Debug, Clone)]
pub struct FabricFamily {
    pub name: &'static str,
    pub meta_base: String,
    pub maven: String,
    /// `group:artifact` of the loader jar.
    pub loader_coord: &'static str,
    pub intermediary_coord: &'static str,
    pub intermediary_maven: String,
    /// Profile ids look like `<id_prefix>-<loader>-<mc>`.
    pub id_prefix: &'static str,
    pub knot_client: &'static str,
}

impl FabricFamily {
    pub fn fabric(endpoints: &Endpoints) -> Self {
        Self {
            name: "Fabric",
            meta_base: endpoints.fabric_meta.clone(),
            maven: endpoints.fabric_maven.clone(),
            loader_coord: "net.fabricmc:fabric-loader",
            intermediary_coord: "net.fabricmc:intermediary",
            intermediary_maven: endpoints.fabric_maven.clone(),
            id_prefix: "fabric-loader",
            knot_client: "net.fabricmc.loader.impl.launch.knot.KnotClient",
        }
    }

    fn meta(&self, path: &str) -> String {
        format!("{}/{}", self.meta_base.trim_end_matches('/'), path)
    }
}

// ─── Meta API shapes ───

#[derive(Debug, Clone, Deserialize)]
pub struct LoaderBuild {
    pub version: String,
    /// Quilt does not publish a stability flag.
    #[serde(default)]
    pub stable: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoaderCombo {
    loader: LoaderBuild,
    #[serde(default)]
    launcher_meta: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct MetaLibrary {
    name: String,
    #[serde(default)]
    url: Option<String>,
}

/// Newest stable build, else the newest one. Meta lists newest first.
fn preferred_build(builds: &[LoaderBuild]) -> Option<String> {
    builds
        .iter()
        .find(|b| b.stable == Some(true))
        .or_else(|| builds.first())
        .map(|b| b.version.clone())
}

/// Stable builds first, each group in meta order.
fn stable_first(builds: Vec<LoaderBuild>) -> Vec<String> {
    let (stable, rest): (Vec<_>, Vec<_>) = builds.into_iter().partition(|b| b.stable != Some(false));
    stable.into_iter().chain(rest).map(|b| b.version).collect()
}

/// Build a loader profile from `launcherMeta` when meta has no ready-made one.
pub fn profile_from_launcher_meta(
    family: &FabricFamily,
    mc: &str,
    loader: &str,
    launcher_meta: Option<&Value>,
) -> Profile {
    let mut libraries = Vec::new();
    let mut main_class = None;

    if let Some(meta) = launcher_meta {
        let groups: Vec<&Value> = match meta.get("libraries") {
            Some(Value::Array(_)) => meta.get("libraries").into_iter().collect(),
            Some(Value::Object(map)) => ["common", "client"]
                .iter()
                .filter_map(|k| map.get(*k))
                .collect(),
            _ => Vec::new(),
        };
        for group in groups {
            if let Ok(entries) = serde_json::from_value::<Vec<MetaLibrary>>(group.clone()) {
                libraries.extend(entries.into_iter().map(|l| Library {
                    name: l.name,
                    url: l.url,
                    ..Default::default()
                }));
            }
        }

        main_class = match meta.get("mainClass") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Object(map)) => map
                .get("client")
                .or_else(|| map.get("server"))
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        };
    }

    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let mut profile = Profile {
        id: format!("{}-{}-{}", family.id_prefix, loader, mc),
        inherits_from: Some(mc.to_string()),
        main_class: Some(main_class.unwrap_or_else(|| family.knot_client.to_string())),
        libraries,
        ..Default::default()
    };
    profile.extra.insert("time".into(), Value::String(now.clone()));
    profile.extra.insert("releaseTime".into(), Value::String(now));
    profile.extra.insert("type".into(), Value::String("release".into()));
    profile
}

/// The loader and intermediary jars must be on the library list with a
/// repository URL, whatever meta returned.
pub fn ensure_loader_libraries(profile: &mut Profile, family: &FabricFamily, loader: &str, mc: &str) {
    let wanted = [
        (format!("{}:{}", family.loader_coord, loader), &family.maven),
        (format!("{}:{}", family.intermediary_coord, mc), &family.intermediary_maven),
    ];
    for (coord, maven) in wanted {
        let prefix = coord.rsplit_once(':').map_or(coord.as_str(), |(p, _)| p).to_string() + ":";
        let repo = format!("{}/", maven.trim_end_matches('/'));
        match profile.libraries.iter_mut().find(|l| l.name.starts_with(&prefix)) {
            Some(existing) => {
                if existing.url.is_none() && existing.downloads.is_none() {
                    existing.url = Some(repo);
                }
            }
            None => profile.libraries.push(Library {
                name: coord,
                url: Some(repo),
                ..Default::default()
            }),
        }
    }
}

/// Installs Fabric-style loaders (Fabric, Quilt) from their meta service.
pub struct FabricInstaller {
    family: FabricFamily,
}

impl FabricInstaller {
    pub fn new(family: FabricFamily) -> Self {
        Self { family }
    }

    pub fn fabric(endpoints: &Endpoints) -> Self {
        Self::new(FabricFamily::fabric(endpoints))
    }

    pub fn family(&self) -> &FabricFamily {
        &self.family
    }

    async fn builds_for(&self, state: &EngineState, mc: &str) -> LauncherResult<Vec<LoaderBuild>> {
        let url = self.family.meta(&format!("versions/loader/{}", mc));
        let combos: Vec<LoaderCombo> = get_json(&state.http_client, &url).await?;
        Ok(combos.into_iter().map(|c| c.loader).collect())
    }

    /// A loader build usable with `mc`, validating `hint` when given.
    async fn pick_for(&self, state: &EngineState, mc: &str, hint: Option<&str>) -> Option<String> {
        if let Some(hint) = hint {
            let url = self.family.meta(&format!("versions/loader/{}/{}", mc, hint));
            return match get_text(&state.http_client, &url).await {
                Ok(_) => Some(hint.to_string()),
                Err(e) => {
                    debug!("{} {} not available for {}: {}", self.family.name, hint, mc, e);
                    None
                }
            };
        }
        match self.builds_for(state, mc).await {
            Ok(builds) => preferred_build(&builds),
            Err(e) => {
                debug!("{} meta has no loaders for {}: {}", self.family.name, mc, e);
                None
            }
        }
    }

    /// `(game version, loader build)` to install.
    ///
    /// Exact version first, then other releases of the same minor line
    /// (newest first), then the newest stable loader overall.
    pub async fn resolve_combo(
        &self,
        state: &EngineState,
        base: &str,
        hint: Option<&str>,
    ) -> LauncherResult<(String, String)> {
        if let Some(loader) = self.pick_for(state, base, hint).await {
            return Ok((base.to_string(), loader));
        }

        match load_manifest(state).await {
            Ok(manifest) => {
                for candidate in manifest.same_minor_releases(base) {
                    if let Some(loader) = self.pick_for(state, &candidate, None).await {
                        warn!(
                            "{} has no loader for {}, using {} {}",
                            self.family.name, base, candidate, loader
                        );
                        return Ok((candidate, loader));
                    }
                }
            }
            Err(e) => warn!("Manifest unavailable for {} fallback: {}", self.family.name, e),
        }

        let all: Vec<LoaderBuild> = get_json(&state.http_client, &self.family.meta("versions/loader"))
            .await
            .map_err(|e| LauncherError::LoaderCompatibility {
                loader: self.family.name.to_string(),
                version: base.to_string(),
                reason: format!("every fallback failed, last: {}", e),
            })?;
        match preferred_build(&all) {
            Some(loader) => Ok((base.to_string(), loader)),
            None => Err(LauncherError::LoaderCompatibility {
                loader: self.family.name.to_string(),
                version: base.to_string(),
                reason: "no loader builds published".into(),
            }),
        }
    }

    /// `/profile/json`, synthesized from `launcherMeta` on 404.
    async fn obtain_profile(&self, state: &EngineState, mc: &str, loader: &str) -> LauncherResult<Profile> {
        let url = self
            .family
            .meta(&format!("versions/loader/{}/{}/profile/json", mc, loader));
        match get_text(&state.http_client, &url).await {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if error_status(&e) == Some(404) => {
                info!("{} profile endpoint missing, building it from launcher meta", self.family.name);
                let combo_url = self.family.meta(&format!("versions/loader/{}/{}", mc, loader));
                let combo: LoaderCombo = get_json(&state.http_client, &combo_url).await?;
                Ok(profile_from_launcher_meta(
                    &self.family,
                    mc,
                    loader,
                    combo.launcher_meta.as_ref(),
                ))
            }
            Err(e) => Err(e),
        }
    }

    /// Profile for `loader`, or for another build of the same game version
    /// when that one cannot be fetched.
    async fn fetch_profile(
        &self,
        state: &EngineState,
        mc: &str,
        loader: &str,
    ) -> LauncherResult<(Profile, String)> {
        let first_error = match self.obtain_profile(state, mc, loader).await {
            Ok(profile) => return Ok((profile, loader.to_string())),
            Err(e) => e,
        };
        warn!("{} profile {} for {} failed: {}", self.family.name, loader, mc, first_error);

        let others = match self.builds_for(state, mc).await {
            Ok(builds) => stable_first(builds),
            Err(_) => Vec::new(),
        };
        for other in others.iter().filter(|b| b.as_str() != loader) {
            if let Ok(profile) = self.obtain_profile(state, mc, other).await {
                return Ok((profile, other.clone()));
            }
        }
        Err(LauncherError::LoaderApi(format!(
            "{} profile for {}: {}",
            self.family.name, mc, first_error
        )))
    }

    /// `versions/<id>/<id>.jar` must be the loader jar itself.
    fn sync_version_jar(&self, state: &EngineState, profile: &Profile, loader: &str) -> LauncherResult<()> {
        let coord = MavenArtifact::parse(&format!("{}:{}", self.family.loader_coord, loader))?;
        let loader_jar = state.libraries_dir().join(coord.local_path());
        if !is_valid_jar(&loader_jar) {
            return Err(LauncherError::Loader(format!(
                "{} loader jar missing or corrupt at {:?}",
                self.family.name, loader_jar
            )));
        }
        let target = ProfileStore::new(&state.root_dir).jar_path(&profile.id);
        if sync_file_copy(&loader_jar, &target)? {
            debug!("Copied loader jar to {:?}", target);
        }
        Ok(())
    }
}

#[async_trait]
impl LoaderInstaller for FabricInstaller {
    async fn install(&self, ctx: InstallContext<'_>) -> LauncherResult<LoaderInstallResult> {
        let state = ctx.state;
        let base = resolve_base_id(state, ctx.base_version).await?;
        let (mc, loader) = self.resolve_combo(state, &base, ctx.build_hint).await?;
        info!("Installing {} {} for Minecraft {}", self.family.name, loader, mc);

        let (mut profile, loader) = self.fetch_profile(state, &mc, &loader).await?;
        if profile.id.trim().is_empty() {
            profile.id = format!("{}-{}-{}", self.family.id_prefix, loader, mc);
        }
        if profile.parent_id().is_none() {
            profile.inherits_from = Some(mc.clone());
        }
        ensure_loader_libraries(&mut profile, &self.family, &loader, &mc);
        ProfileStore::new(&state.root_dir).save(&profile)?;

        ensure_base_version(state, &mc, ctx.progress).await?;
        acquire_profile_artifacts(state, &profile.id, ctx.progress).await?;
        self.sync_version_jar(state, &profile, &loader)?;

        info!("{} installed successfully as {}", self.family.name, profile.id);
        Ok(LoaderInstallResult {
            version_id: profile.id,
            resolved_build: Some(loader),
            base_version: mc,
        })
    }

    async fn list_builds(&self, state: &EngineState, base_version: &str) -> LauncherResult<Vec<String>> {
        Ok(stable_first(self.builds_for(state, base_version).await?))
    }
}
