// ─── Version File ───
// Typed schema for a version profile document (`versions/<id>/<id>.json`)
// and evaluation of its OS rules. Unknown keys survive a read/write cycle.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::platform::Platform;

/// Launcher-main-class packages whose profiles must stay unflattened.
const LOADER_LAUNCHER_PACKAGES: &[&str] = &["net.fabricmc.loader", "org.quiltmc.loader"];
const LOADER_LAUNCHER_ID_PREFIXES: &[&str] = &["fabric-loader-", "quilt-loader-"];

/// A version profile, possibly inheriting from a parent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherits_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_class: Option<String>,
    #[serde(default)]
    pub libraries: Vec<Library>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub downloads: BTreeMap<String, Artifact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_index: Option<AssetIndexInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub java_version: Option<JavaVersionInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Arguments>,
    /// Legacy `minecraftArguments` field (pre-1.13).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minecraft_arguments: Option<String>,
    /// `type`, `time`, `releaseTime` and anything else we do not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JavaVersionInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    pub major_version: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetIndexInfo {
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_size: Option<u64>,
}

/// A downloadable file: `downloads.client`, a library artifact or a native classifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl Artifact {
    /// URL if declared and non-empty. Installers emit `"url": ""` for
    /// files they generate locally.
    pub fn usable_url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Arguments {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub game: Vec<Argument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub jvm: Vec<Argument>,
}

/// One entry of `arguments.game` / `arguments.jvm`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Argument {
    Plain(String),
    Conditional {
        #[serde(default)]
        rules: Vec<Rule>,
        value: ArgumentValue,
    },
    /// Anything else is carried through untouched.
    Other(Value),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgumentValue {
    Single(String),
    Many(Vec<String>),
}

impl ArgumentValue {
    pub fn tokens(&self) -> Vec<String> {
        match self {
            ArgumentValue::Single(s) => vec![s.clone()],
            ArgumentValue::Many(v) => v.clone(),
        }
    }
}

// ─── Library Entry with Rules ───

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Library {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloads: Option<LibraryDownloads>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<Rule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub natives: Option<BTreeMap<String, String>>,
    /// `extract`, `checksums`, `serverreq`, ...
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryDownloads {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<Artifact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifiers: Option<BTreeMap<String, Artifact>>,
}

// ─── OS Rule Evaluation ───

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub action: RuleAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<OsRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<BTreeMap<String, bool>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Rule {
    fn applies_to(&self, platform: &Platform) -> bool {
        // No launcher feature flags are enabled here.
        if self.features.as_ref().is_some_and(|f| !f.is_empty()) {
            return false;
        }
        let Some(os) = &self.os else {
            return true;
        };
        let name_ok = os
            .name
            .as_deref()
            .map_or(true, |name| platform.os.matches_name(name));
        let arch_ok = os.arch.as_deref().map_or(true, |arch| {
            super::platform::Arch::from_name(arch).map_or(false, |a| a == platform.arch)
        });
        name_ok && arch_ok
    }
}

/// Evaluate a rule list top to bottom.
///
/// - No rules → allowed.
/// - Otherwise start "disallowed"; every matching rule sets the state.
pub fn rules_allow(rules: &[Rule], platform: &Platform) -> bool {
    if rules.is_empty() {
        return true;
    }
    let mut allowed = false;
    for rule in rules {
        if rule.applies_to(platform) {
            allowed = rule.action == RuleAction::Allow;
        }
    }
    allowed
}

impl Library {
    pub fn is_allowed_for(&self, platform: &Platform) -> bool {
        self.rules
            .as_deref()
            .map_or(true, |rules| rules_allow(rules, platform))
    }

    /// Legacy `natives` classifier for this platform, `${arch}` substituted.
    pub fn native_classifier_for(&self, platform: &Platform) -> Option<String> {
        let natives = self.natives.as_ref()?;
        let classifier = natives.get(platform.os.mojang_name())?;
        Some(classifier.replace("${arch}", platform.arch.bits()))
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        self.downloads.as_ref()?.artifact.as_ref()
    }

    pub fn classifier(&self, key: &str) -> Option<&Artifact> {
        self.downloads.as_ref()?.classifiers.as_ref()?.get(key)
    }
}

impl Profile {
    /// Fabric/Quilt profiles rely on their own launcher main class and
    /// version jar; they are kept as-is instead of being flattened.
    pub fn is_loader_launcher(&self) -> bool {
        let by_main_class = self.main_class.as_deref().is_some_and(|mc| {
            LOADER_LAUNCHER_PACKAGES
                .iter()
                .any(|package| mc.contains(package))
        });
        let by_id = LOADER_LAUNCHER_ID_PREFIXES
            .iter()
            .any(|prefix| self.id.starts_with(prefix));
        by_main_class || by_id
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.inherits_from
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    pub fn client_download(&self) -> Option<&Artifact> {
        self.downloads.get("client")
    }

    pub fn has_library_prefix(&self, prefix: &str) -> bool {
        self.libraries.iter().any(|l| l.name.starts_with(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::version::platform::{Arch, OsFamily};

    fn linux() -> Platform {
        Platform::new(OsFamily::Linux, Arch::X64)
    }

    fn rule(action: RuleAction, os: Option<&str>) -> Rule {
        Rule {
            action,
            os: os.map(|name| OsRule {
                name: Some(name.to_string()),
                arch: None,
                version: None,
            }),
            features: None,
        }
    }

    #[test]
    fn no_rules_means_allowed() {
        let lib = Library {
            name: "test:lib:1.0".into(),
            ..Default::default()
        };
        assert!(lib.is_allowed_for(&linux()));
    }

    #[test]
    fn allow_only_osx_excludes_linux() {
        let lib = Library {
            name: "ca.weblite:java-objc-bridge:1.1".into(),
            rules: Some(vec![rule(RuleAction::Allow, Some("osx"))]),
            ..Default::default()
        };
        assert!(!lib.is_allowed_for(&linux()));
        assert!(lib.is_allowed_for(&Platform::new(OsFamily::Osx, Arch::Arm64)));
    }

    #[test]
    fn later_disallow_wins() {
        let rules = vec![
            rule(RuleAction::Allow, None),
            rule(RuleAction::Disallow, Some("linux")),
        ];
        assert!(!rules_allow(&rules, &linux()));
    }

    #[test]
    fn feature_rules_never_apply() {
        let mut features = BTreeMap::new();
        features.insert("is_demo_user".to_string(), true);
        let rules = vec![Rule {
            action: RuleAction::Allow,
            os: None,
            features: Some(features),
        }];
        assert!(!rules_allow(&rules, &linux()));
    }

    #[test]
    fn os_arch_rule_is_honoured() {
        let rules = vec![Rule {
            action: RuleAction::Allow,
            os: Some(OsRule {
                name: Some("windows".into()),
                arch: Some("x86".into()),
                version: None,
            }),
            features: None,
        }];
        assert!(rules_allow(&rules, &Platform::new(OsFamily::Windows, Arch::X86)));
        assert!(!rules_allow(&rules, &Platform::new(OsFamily::Windows, Arch::X64)));
    }

    #[test]
    fn legacy_native_classifier_substitutes_arch() {
        let mut natives = BTreeMap::new();
        natives.insert("windows".to_string(), "natives-windows-${arch}".to_string());
        let lib = Library {
            name: "tv.twitch:twitch-platform:5.16".into(),
            natives: Some(natives),
            ..Default::default()
        };
        assert_eq!(
            lib.native_classifier_for(&Platform::new(OsFamily::Windows, Arch::X86)),
            Some("natives-windows-32".to_string())
        );
        assert_eq!(lib.native_classifier_for(&linux()), None);
    }

    #[test]
    fn unknown_keys_and_conditional_arguments_survive() {
        let raw = serde_json::json!({
            "id": "1.20.1",
            "type": "release",
            "releaseTime": "2023-06-12T13:25:51+00:00",
            "mainClass": "net.minecraft.client.main.Main",
            "arguments": {
                "game": [
                    "--username", "${auth_player_name}",
                    {"rules": [{"action": "allow", "features": {"is_demo_user": true}}], "value": "--demo"},
                    {"rules": [{"action": "allow", "features": {"has_custom_resolution": true}}],
                     "value": ["--width", "${resolution_width}"]}
                ]
            },
            "libraries": [{"name": "a:b:1.0", "extract": {"exclude": ["META-INF/"]}}]
        });

        let profile: Profile = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(profile.extra["type"], "release");
        let args = profile.arguments.as_ref().unwrap();
        assert!(matches!(&args.game[2], Argument::Conditional { value: ArgumentValue::Single(v), .. } if v == "--demo"));
        assert!(profile.libraries[0].extra.contains_key("extract"));

        let back = serde_json::to_value(&profile).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn loader_launcher_detection() {
        let fabric = Profile {
            id: "custom".into(),
            main_class: Some("net.fabricmc.loader.impl.launch.knot.KnotClient".into()),
            ..Default::default()
        };
        let quilt_by_id = Profile {
            id: "quilt-loader-0.26.0-1.20.1".into(),
            ..Default::default()
        };
        let forge = Profile {
            id: "1.20.1-forge-47.2.0".into(),
            main_class: Some("cpw.mods.modlauncher.Launcher".into()),
            ..Default::default()
        };
        assert!(fabric.is_loader_launcher());
        assert!(quilt_by_id.is_loader_launcher());
        assert!(!forge.is_loader_launcher());
    }
}
