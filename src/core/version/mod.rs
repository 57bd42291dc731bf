pub mod manifest;
pub mod ordering;
pub mod platform;
pub mod store;
pub mod version_file;

pub use manifest::{load_manifest, ManifestCache, VersionEntry, VersionManifest};
pub use platform::{Arch, OsFamily, Platform};
pub use store::ProfileStore;
pub use version_file::{
    rules_allow, Argument, ArgumentValue, Arguments, Artifact, AssetIndexInfo, JavaVersionInfo,
    Library, LibraryDownloads, OsRule, Profile, Rule, RuleAction,
};
