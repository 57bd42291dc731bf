// ─── Task Planning ───
// Turns a resolved inheritance chain into the list of files it needs.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::assets::{index_path, AssetIndex};
use crate::core::downloader::{ContentHash, TaskCategory};
use crate::core::maven::MavenArtifact;
use crate::core::resolver::{filter_libraries_for_platform, merge_chain};
use crate::core::version::{Artifact, Library, Platform, Profile, ProfileStore};

/// One file to acquire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub url: String,
    pub dest: PathBuf,
    pub expected_hash: Option<ContentHash>,
    pub label: String,
    pub category: TaskCategory,
    pub size: Option<u64>,
}

/// Where files land and which origins fill gaps in library entries.
pub struct PlanLayout<'a> {
    pub store: &'a ProfileStore,
    pub libraries_dir: &'a Path,
    pub assets_dir: &'a Path,
    pub libraries_base: &'a str,
}

/// Client archive, libraries and natives for a chain (child first).
pub fn plan_chain_tasks(chain: &[Profile], layout: &PlanLayout<'_>, platform: &Platform) -> Vec<DownloadTask> {
    let mut tasks = Vec::new();

    if let Some(task) = client_task(chain, layout.store) {
        tasks.push(task);
    }

    if let Some(merged) = merge_chain(chain) {
        let libraries = filter_libraries_for_platform(merged.libraries, platform);
        for lib in libraries.iter().filter(|l| l.is_allowed_for(platform)) {
            if let Some(task) = library_task(lib, layout) {
                tasks.push(task);
            }
            if let Some(task) = native_task(lib, layout, platform) {
                tasks.push(task);
            }
        }
    }

    dedupe_by_destination(tasks)
}

fn client_task(chain: &[Profile], store: &ProfileStore) -> Option<DownloadTask> {
    chain.iter().find_map(|member| {
        let client = member.client_download()?;
        let url = client.usable_url()?;
        Some(DownloadTask {
            url: url.to_string(),
            dest: store.jar_path(&member.id),
            expected_hash: ContentHash::from_opt(client.sha1.as_deref()),
            label: format!("{} client", member.id),
            category: TaskCategory::Archive,
            size: client.size,
        })
    })
}

fn library_task(lib: &Library, layout: &PlanLayout<'_>) -> Option<DownloadTask> {
    let (path, url, artifact) = match &lib.downloads {
        Some(downloads) => {
            // Classifier-only entries (legacy natives) have no main jar.
            let artifact = downloads.artifact.as_ref()?;
            let path = match &artifact.path {
                Some(path) => path.clone(),
                None => MavenArtifact::parse(&lib.name).ok()?.repo_path(),
            };
            let url = match &artifact.url {
                // An explicit empty URL marks a file the installer generates.
                Some(_) => artifact.usable_url()?.to_string(),
                None => join_url(lib.url.as_deref().unwrap_or(layout.libraries_base), &path),
            };
            (path, url, Some(artifact))
        }
        None => {
            let path = MavenArtifact::parse(&lib.name).ok()?.repo_path();
            let url = join_url(lib.url.as_deref().unwrap_or(layout.libraries_base), &path);
            (path, url, None)
        }
    };

    Some(artifact_task(lib, &path, url, artifact, layout.libraries_dir, TaskCategory::Libraries))
}

fn native_task(lib: &Library, layout: &PlanLayout<'_>, platform: &Platform) -> Option<DownloadTask> {
    let key = lib.native_classifier_for(platform)?;
    let artifact = lib.classifier(&key)?;
    let url = artifact.usable_url()?.to_string();
    let path = match &artifact.path {
        Some(path) => path.clone(),
        None => {
            let mut coord = MavenArtifact::parse(&lib.name).ok()?;
            coord.classifier = Some(key);
            coord.repo_path()
        }
    };
    Some(artifact_task(
        lib,
        &path,
        url,
        Some(artifact),
        layout.libraries_dir,
        TaskCategory::Libraries,
    ))
}

fn artifact_task(
    lib: &Library,
    rel_path: &str,
    url: String,
    artifact: Option<&Artifact>,
    base_dir: &Path,
    category: TaskCategory,
) -> DownloadTask {
    DownloadTask {
        url,
        dest: rel_path
            .split('/')
            .filter(|s| !s.is_empty())
            .fold(base_dir.to_path_buf(), |acc, segment| acc.join(segment)),
        expected_hash: artifact.and_then(|a| ContentHash::from_opt(a.sha1.as_deref())),
        label: lib.name.clone(),
        category,
        size: artifact.and_then(|a| a.size),
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// The asset index document declared by the chain, if any.
pub fn asset_index_task(chain: &[Profile], assets_dir: &Path) -> Option<DownloadTask> {
    let info = chain.iter().find_map(|p| p.asset_index.as_ref())?;
    Some(DownloadTask {
        url: info.url.clone(),
        dest: index_path(assets_dir, &info.id),
        expected_hash: ContentHash::from_opt(info.sha1.as_deref()),
        label: format!("asset index {}", info.id),
        category: TaskCategory::AssetIndex,
        size: info.size,
    })
}

/// One task per distinct object in the index.
pub fn asset_object_tasks(index: &AssetIndex, assets_dir: &Path, resources_base: &str) -> Vec<DownloadTask> {
    index
        .unique_objects()
        .into_iter()
        .map(|object| DownloadTask {
            url: object.url(resources_base),
            dest: object.local_path(assets_dir),
            expected_hash: ContentHash::from_opt(Some(&object.hash)),
            label: format!("asset {}", object.hash),
            category: TaskCategory::Objects,
            size: Some(object.size),
        })
        .collect()
}

/// No two tasks may write the same file; the first one planned wins.
pub fn dedupe_by_destination(tasks: Vec<DownloadTask>) -> Vec<DownloadTask> {
    let mut seen = HashSet::new();
    let before = tasks.len();
    let out: Vec<_> = tasks
        .into_iter()
        .filter(|t| seen.insert(t.dest.clone()))
        .collect();
    if out.len() != before {
        debug!("Dropped {} duplicate download destinations", before - out.len());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::version::{Arch, LibraryDownloads, OsFamily, OsRule, Rule, RuleAction};
    use std::collections::BTreeMap;

    const BASE: &str = "https://libraries.minecraft.net";

    fn linux() -> Platform {
        Platform::new(OsFamily::Linux, Arch::X64)
    }

    fn plan(chain: &[Profile], root: &Path) -> Vec<DownloadTask> {
        let store = ProfileStore::new(root);
        let layout = PlanLayout {
            store: &store,
            libraries_dir: &root.join("libraries"),
            assets_dir: &root.join("assets"),
            libraries_base: BASE,
        };
        plan_chain_tasks(chain, &layout, &linux())
    }

    fn lib(name: &str) -> Library {
        Library {
            name: name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn client_jar_comes_from_declaring_member() {
        let root = Path::new("/mc");
        let mut base = Profile {
            id: "1.20.1".into(),
            ..Default::default()
        };
        base.downloads.insert(
            "client".into(),
            Artifact {
                url: Some("https://piston-data.mojang.com/v1/objects/abc/client.jar".into()),
                sha1: Some("a".repeat(40)),
                size: Some(10),
                path: None,
            },
        );
        let child = Profile {
            id: "1.20.1-forge-47.2.0".into(),
            inherits_from: Some("1.20.1".into()),
            ..Default::default()
        };

        let tasks = plan(&[child, base], root);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].dest, root.join("versions/1.20.1/1.20.1.jar"));
        assert_eq!(tasks[0].category, TaskCategory::Archive);
        assert!(tasks[0].expected_hash.is_some());
    }

    #[test]
    fn library_url_resolution() {
        let root = Path::new("/mc");
        let mut from_maven = lib("net.fabricmc:fabric-loader:0.15.11");
        from_maven.url = Some("https://maven.fabricmc.net/".into());

        let bare = lib("org.ow2.asm:asm:9.6");

        let mut generated = lib("net.minecraftforge:forge:1.20.1-47.2.0:client");
        generated.downloads = Some(LibraryDownloads {
            artifact: Some(Artifact {
                path: Some("net/minecraftforge/forge/1.20.1-47.2.0/forge-1.20.1-47.2.0-client.jar".into()),
                url: Some(String::new()),
                sha1: None,
                size: None,
            }),
            classifiers: None,
        });

        let mut osx_only = lib("ca.weblite:java-objc-bridge:1.1");
        osx_only.rules = Some(vec![Rule {
            action: RuleAction::Allow,
            os: Some(OsRule {
                name: Some("osx".into()),
                arch: None,
                version: None,
            }),
            features: None,
        }]);

        let profile = Profile {
            id: "x".into(),
            libraries: vec![from_maven, bare, generated, osx_only],
            ..Default::default()
        };
        let tasks = plan(&[profile], root);
        let urls: Vec<_> = tasks.iter().map(|t| t.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://maven.fabricmc.net/net/fabricmc/fabric-loader/0.15.11/fabric-loader-0.15.11.jar",
                "https://libraries.minecraft.net/org/ow2/asm/asm/9.6/asm-9.6.jar",
            ]
        );
        assert_eq!(
            tasks[1].dest,
            root.join("libraries/org/ow2/asm/asm/9.6/asm-9.6.jar")
        );
    }

    #[test]
    fn legacy_natives_use_classifier_for_current_os() {
        let mut natives = BTreeMap::new();
        natives.insert("linux".to_string(), "natives-linux".to_string());
        natives.insert("windows".to_string(), "natives-windows".to_string());
        let mut classifiers = BTreeMap::new();
        for os in ["linux", "windows"] {
            classifiers.insert(
                format!("natives-{os}"),
                Artifact {
                    path: Some(format!("org/lwjgl/lwjgl-platform/2.9.4/lwjgl-platform-2.9.4-natives-{os}.jar")),
                    url: Some(format!("{BASE}/org/lwjgl/lwjgl-platform/2.9.4/lwjgl-platform-2.9.4-natives-{os}.jar")),
                    sha1: None,
                    size: None,
                },
            );
        }
        let mut platform_lib = lib("org.lwjgl.lwjgl:lwjgl-platform:2.9.4");
        platform_lib.natives = Some(natives);
        platform_lib.downloads = Some(LibraryDownloads {
            artifact: None,
            classifiers: Some(classifiers),
        });

        let profile = Profile {
            id: "1.12.2".into(),
            libraries: vec![platform_lib],
            ..Default::default()
        };
        let tasks = plan(&[profile], Path::new("/mc"));
        assert_eq!(tasks.len(), 1);
        assert!(tasks[0].url.ends_with("natives-linux.jar"));
    }

    #[test]
    fn destinations_are_unique() {
        let a = lib("org.ow2.asm:asm:9.6");
        let mut b = lib("org.ow2.asm:asm:9.6");
        b.url = Some("https://maven.minecraftforge.net/".into());
        let profile = Profile {
            id: "x".into(),
            libraries: vec![a, b],
            ..Default::default()
        };
        assert_eq!(plan(&[profile], Path::new("/mc")).len(), 1);
    }
}
