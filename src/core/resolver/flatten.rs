// ─── Flattening ───
// Writes a standalone `<id>-flat` profile with no `inheritsFrom`, suitable
// for launchers that do not walk inheritance themselves.

use std::path::Path;

use tracing::{info, warn};

use crate::core::error::LauncherResult;
use crate::core::maven::{MavenArtifact, MOJANG_LIBRARIES};
use crate::core::version::{
    Argument, ArgumentValue, Artifact, Library, LibraryDownloads, Platform, Profile, ProfileStore,
};

use super::args::dedupe_singleton_args;
use super::inherit::{resolve_inheritance, MAX_INHERITANCE_DEPTH};
use super::merge::merge_libraries;
use super::natives::filter_libraries_for_platform;

pub const FLAT_SUFFIX: &str = "-flat";

const LAUNCHWRAPPER_MAIN: &str = "net.minecraft.launchwrapper.Launch";
const LAUNCHWRAPPER_COORD: &str = "net.minecraft:launchwrapper:1.12";
const LIBRARY_DIR_TOKENS: &[&str] = &["${library_directory}", "${libraryDirectory}"];

/// Flatten `version_id` under `root_dir` and return the id to launch.
///
/// Never fails: when there is nothing to flatten, when the profile uses a
/// loader launcher, or on any error, the original id is returned.
pub fn flatten_profile(root_dir: &Path, version_id: &str, platform: &Platform) -> String {
    match try_flatten(root_dir, version_id, platform) {
        Ok(Some(flat_id)) => flat_id,
        Ok(None) => version_id.to_string(),
        Err(e) => {
            warn!("Flatten profile failed ({}): {}", version_id, e);
            version_id.to_string()
        }
    }
}

fn try_flatten(
    root_dir: &Path,
    version_id: &str,
    platform: &Platform,
) -> LauncherResult<Option<String>> {
    let mut store = ProfileStore::new(root_dir);
    let Some(own) = store.load(version_id)? else {
        warn!("Cannot flatten {}: profile not found", version_id);
        return Ok(None);
    };
    if own.parent_id().is_none() || own.is_loader_launcher() {
        return Ok(None);
    }

    let resolved = resolve_inheritance(&mut store, version_id, platform, MAX_INHERITANCE_DEPTH)?;
    let Some(merged) = resolved else {
        warn!("Cannot flatten {}: inheritance chain unresolved", version_id);
        return Ok(None);
    };

    let flat = build_flat_profile(merged, &root_dir.join("libraries"), platform);
    store.save(&flat)?;
    info!("Flattened {} into {}", version_id, flat.id);
    Ok(Some(flat.id))
}

/// Pure transformation of a merged profile into its flattened form.
pub fn build_flat_profile(merged: Profile, libraries_dir: &Path, platform: &Platform) -> Profile {
    let mut flat = merged;
    flat.id = format!("{}{}", flat.id, FLAT_SUFFIX);
    flat.inherits_from = None;

    let libraries = merge_libraries(&flat.libraries, &[]);
    flat.libraries = filter_libraries_for_platform(libraries, platform)
        .into_iter()
        .map(enrich_optifine_library)
        .collect();

    if flat.main_class.as_deref().map(str::trim) == Some(LAUNCHWRAPPER_MAIN)
        && !flat.has_library_prefix(LAUNCHWRAPPER_COORD)
    {
        flat.libraries.push(launchwrapper_library());
    }

    dedupe_singleton_args(&mut flat);
    substitute_library_dir(&mut flat, libraries_dir);
    flat
}

fn substitute_library_dir(profile: &mut Profile, libraries_dir: &Path) {
    let Some(arguments) = profile.arguments.as_mut() else {
        return;
    };
    let dir = libraries_dir.to_string_lossy();
    let replace = |s: &str| {
        LIBRARY_DIR_TOKENS
            .iter()
            .fold(s.to_string(), |acc, token| acc.replace(token, &dir))
    };

    for arg in arguments.jvm.iter_mut() {
        match arg {
            Argument::Plain(s) => *s = replace(s),
            Argument::Conditional { value, .. } => {
                *value = match value {
                    ArgumentValue::Single(s) => ArgumentValue::Single(replace(s)),
                    ArgumentValue::Many(v) => ArgumentValue::Many(v.iter().map(|s| replace(s)).collect()),
                }
            }
            Argument::Other(_) => {}
        }
    }
}

/// OptiFine entries ship without download info; point them at the
/// conventional `optifine/<artifact>/<version>` path.
fn enrich_optifine_library(mut lib: Library) -> Library {
    if !lib.name.to_ascii_lowercase().starts_with("optifine:") {
        return lib;
    }
    let Ok(artifact) = MavenArtifact::parse(&lib.name) else {
        return lib;
    };
    let path = artifact.repo_path();
    let url = format!("{}/{}", MOJANG_LIBRARIES, path);

    if lib.url.is_none() {
        lib.url = Some(format!("{}/", MOJANG_LIBRARIES));
    }
    let downloads = lib.downloads.get_or_insert_with(LibraryDownloads::default);
    let existing = downloads.artifact.take().unwrap_or_default();
    downloads.artifact = Some(Artifact {
        path: Some(path),
        url: Some(url),
        ..existing
    });
    lib
}

fn launchwrapper_library() -> Library {
    let path = "net/minecraft/launchwrapper/1.12/launchwrapper-1.12.jar".to_string();
    Library {
        name: LAUNCHWRAPPER_COORD.into(),
        url: Some(format!("{}/", MOJANG_LIBRARIES)),
        downloads: Some(LibraryDownloads {
            artifact: Some(Artifact {
                url: Some(format!("{}/{}", MOJANG_LIBRARIES, path)),
                path: Some(path),
                sha1: None,
                size: None,
            }),
            classifiers: None,
        }),
        ..Default::default()
    }
}
