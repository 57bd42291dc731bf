use serde::Deserialize;

use crate::core::error::LauncherResult;

/// Subset of a repository `maven-metadata.xml`.
#[derive(Debug, Deserialize)]
pub struct MavenMetadata {
    versioning: MavenVersioning,
}

#[derive(Debug, Deserialize)]
struct MavenVersioning {
    versions: MavenVersions,
}

#[derive(Debug, Deserialize)]
struct MavenVersions {
    #[serde(rename = "version", default)]
    version: Vec<String>,
}

impl MavenMetadata {
    pub fn parse(xml: &str) -> LauncherResult<Self> {
        Ok(quick_xml::de::from_str(xml)?)
    }

    /// Published versions in document order.
    pub fn versions(&self) -> &[String] {
        &self.versioning.versions.version
    }

    pub fn into_versions(self) -> Vec<String> {
        self.versioning.versions.version
    }
}
