// ─── Profile Merging ───
// Field-by-field merge of a child profile onto its parent.

use std::collections::HashMap;

use crate::core::version::{Arguments, Library, Profile};

/// How much a library entry tells us about where to get it.
pub fn library_score(lib: &Library) -> u32 {
    let mut score = 0;
    if !lib.name.is_empty() {
        score += 1;
    }
    if lib.url.is_some() {
        score += 2;
    }
    if lib.downloads.is_some() {
        score += 4;
    }
    if lib.rules.is_some() {
        score += 1;
    }
    if lib.natives.is_some() {
        score += 1;
    }
    score
}

/// One entry per `group:artifact` (classifier and extension kept, version
/// ignored); on collision the higher score wins and ties go to the later
/// (child) entry. Order is first appearance of each key.
pub fn merge_libraries(parent: &[Library], child: &[Library]) -> Vec<Library> {
    let mut out: Vec<Library> = Vec::with_capacity(parent.len() + child.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for lib in parent.iter().chain(child.iter()) {
        let key = library_key(lib);
        match index.get(&key) {
            Some(&slot) => {
                if library_score(lib) >= library_score(&out[slot]) {
                    out[slot] = lib.clone();
                }
            }
            None => {
                index.insert(key, out.len());
                out.push(lib.clone());
            }
        }
    }

    out
}

/// `group:artifact[:classifier][@ext]`, i.e. the coordinate without its
/// version. Names with fewer than three segments are used as-is.
pub fn library_key(lib: &Library) -> String {
    if lib.name.is_empty() {
        return serde_json::to_string(lib).unwrap_or_default();
    }
    let (coord, ext) = match lib.name.split_once('@') {
        Some((coord, ext)) => (coord, Some(ext)),
        None => (lib.name.as_str(), None),
    };
    let parts: Vec<&str> = coord.split(':').collect();
    if parts.len() < 3 {
        return lib.name.clone();
    }

    let mut key = format!("{}:{}", parts[0], parts[1]);
    for classifier in &parts[3..] {
        key.push(':');
        key.push_str(classifier);
    }
    if let Some(ext) = ext {
        key.push('@');
        key.push_str(ext);
    }
    key
}

/// Parent segment first, then child, per argument list.
pub fn merge_arguments(parent: Option<&Arguments>, child: Option<&Arguments>) -> Option<Arguments> {
    match (parent, child) {
        (None, None) => None,
        (Some(p), None) => Some(p.clone()),
        (None, Some(c)) => Some(c.clone()),
        (Some(p), Some(c)) => Some(Arguments {
            game: p.game.iter().chain(c.game.iter()).cloned().collect(),
            jvm: p.jvm.iter().chain(c.jvm.iter()).cloned().collect(),
        }),
    }
}

/// Merge `child` onto `parent`. The result keeps the child's id and
/// inheritance pointer; libraries are not platform-filtered here.
pub fn merge_profiles(parent: &Profile, child: &Profile) -> Profile {
    let mut downloads = parent.downloads.clone();
    downloads.extend(child.downloads.clone());

    let mut extra = parent.extra.clone();
    for (key, value) in &child.extra {
        extra.insert(key.clone(), value.clone());
    }

    Profile {
        id: child.id.clone(),
        inherits_from: child.inherits_from.clone(),
        main_class: child.main_class.clone().or_else(|| parent.main_class.clone()),
        libraries: merge_libraries(&parent.libraries, &child.libraries),
        downloads,
        asset_index: child.asset_index.clone().or_else(|| parent.asset_index.clone()),
        assets: child.assets.clone().or_else(|| parent.assets.clone()),
        java_version: child.java_version.clone().or_else(|| parent.java_version.clone()),
        logging: child.logging.clone().or_else(|| parent.logging.clone()),
        arguments: merge_arguments(parent.arguments.as_ref(), child.arguments.as_ref()),
        minecraft_arguments: child
            .minecraft_arguments
            .clone()
            .or_else(|| parent.minecraft_arguments.clone()),
        extra,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::version::{Argument, Artifact, LibraryDownloads};

    fn lib(name: &str) -> Library {
        Library {
            name: name.into(),
            ..Default::default()
        }
    }

    fn with_downloads(name: &str) -> Library {
        Library {
            name: name.into(),
            downloads: Some(LibraryDownloads {
                artifact: Some(Artifact {
                    path: Some("p.jar".into()),
                    url: Some("https://h/p.jar".into()),
                    sha1: None,
                    size: None,
                }),
                classifiers: None,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn scores() {
        assert_eq!(library_score(&lib("a:b:1")), 1);
        let mut l = with_downloads("a:b:1");
        l.url = Some("https://maven".into());
        assert_eq!(library_score(&l), 7);
    }

    #[test]
    fn higher_score_wins_regardless_of_side() {
        let parent = vec![with_downloads("a:b:1")];
        let child = vec![lib("a:b:1")];
        let merged = merge_libraries(&parent, &child);
        assert_eq!(merged.len(), 1);
        assert!(merged[0].downloads.is_some());
    }

    #[test]
    fn ties_favour_child() {
        let mut parent = lib("a:b:1");
        parent.url = Some("https://parent".into());
        let mut child = lib("a:b:1");
        child.url = Some("https://child".into());
        let merged = merge_libraries(&[parent], &[child]);
        assert_eq!(merged[0].url.as_deref(), Some("https://child"));
    }

    #[test]
    fn first_appearance_order_is_kept() {
        let parent = vec![lib("x:one:1"), lib("x:two:1")];
        let child = vec![lib("x:three:1"), with_downloads("x:one:1")];
        let names: Vec<_> = merge_libraries(&parent, &child)
            .into_iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(names, vec!["x:one:1", "x:two:1", "x:three:1"]);
    }

    #[test]
    fn versions_of_one_artifact_collapse_to_one_entry() {
        let mut old = lib("com.google.guava:guava:31.0");
        old.url = Some("https://libraries.minecraft.net/".into());
        old.rules = Some(vec![]);
        let newer = with_downloads("com.google.guava:guava:31.1");

        let names: Vec<_> = merge_libraries(&[old], &[newer])
            .into_iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(names, vec!["com.google.guava:guava:31.1"]);
    }

    #[test]
    fn classifiers_and_extensions_stay_distinct() {
        let parent = vec![
            lib("org.lwjgl:lwjgl:3.3.1"),
            lib("org.lwjgl:lwjgl:3.3.1:natives-linux"),
            lib("org.lwjgl:lwjgl:3.3.1:natives-windows"),
        ];
        let child = vec![
            lib("org.lwjgl:lwjgl:3.3.3:natives-linux"),
            lib("de.oceanlabs.mcp:mcp_config:1.20.1@zip"),
        ];
        let names: Vec<_> = merge_libraries(&parent, &child)
            .into_iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "org.lwjgl:lwjgl:3.3.1",
                "org.lwjgl:lwjgl:3.3.3:natives-linux",
                "org.lwjgl:lwjgl:3.3.1:natives-windows",
                "de.oceanlabs.mcp:mcp_config:1.20.1@zip",
            ]
        );
        assert_eq!(
            library_key(&lib("de.oceanlabs.mcp:mcp_config:1.20.1@zip")),
            "de.oceanlabs.mcp:mcp_config@zip"
        );
    }

    #[test]
    fn arguments_concatenate_parent_first() {
        let parent = Arguments {
            game: vec![Argument::Plain("--username".into())],
            jvm: vec![],
        };
        let child = Arguments {
            game: vec![Argument::Plain("--launchTarget".into())],
            jvm: vec![Argument::Plain("-Dfml=1".into())],
        };
        let merged = merge_arguments(Some(&parent), Some(&child)).unwrap();
        assert_eq!(
            merged.game,
            vec![
                Argument::Plain("--username".into()),
                Argument::Plain("--launchTarget".into())
            ]
        );
        assert_eq!(merged.jvm.len(), 1);
    }

    #[test]
    fn child_fields_override_and_downloads_merge() {
        let mut parent = Profile {
            id: "1.20.1".into(),
            main_class: Some("net.minecraft.client.main.Main".into()),
            assets: Some("5".into()),
            ..Default::default()
        };
        parent.downloads.insert(
            "client".into(),
            Artifact {
                url: Some("https://piston-data.mojang.com/client.jar".into()),
                ..Default::default()
            },
        );
        parent.extra.insert("type".into(), "release".into());

        let mut child = Profile {
            id: "1.20.1-forge-47.2.0".into(),
            inherits_from: Some("1.20.1".into()),
            main_class: Some("cpw.mods.modlauncher.Launcher".into()),
            ..Default::default()
        };
        child.downloads.insert("server".into(), Artifact::default());

        let merged = merge_profiles(&parent, &child);
        assert_eq!(merged.id, "1.20.1-forge-47.2.0");
        assert_eq!(merged.main_class.as_deref(), Some("cpw.mods.modlauncher.Launcher"));
        assert_eq!(merged.assets.as_deref(), Some("5"));
        assert_eq!(merged.downloads.len(), 2);
        assert_eq!(merged.extra["type"], "release");
    }
}
