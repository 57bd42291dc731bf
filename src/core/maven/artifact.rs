use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::core::error::{LauncherError, LauncherResult};

/// Represents a fully parsed Maven coordinate.
///
/// Supported formats:
///   `groupId:artifactId:version`
///   `groupId:artifactId:version:classifier`
///   `groupId:artifactId:version:classifier@packaging`
///   `groupId:artifactId:version@packaging`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MavenArtifact {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub classifier: Option<String>,
    /// File extension / packaging type. Defaults to `"jar"`.
    pub packaging: String,
}

impl MavenArtifact {
    /// Parse a Maven coordinate string.
    ///
    /// # Examples
    /// ```
    /// use interface_provisioner::core::maven::MavenArtifact;
    ///
    /// let a = MavenArtifact::parse("net.fabricmc:fabric-loader:0.15.11").unwrap();
    /// assert_eq!(a.group_id, "net.fabricmc");
    /// ```
    pub fn parse(coord: &str) -> LauncherResult<Self> {
        // Split off @packaging first
        let (coord_part, packaging_override) = if let Some(idx) = coord.rfind('@') {
            (&coord[..idx], Some(&coord[idx + 1..]))
        } else {
            (coord, None)
        };

        let parts: Vec<&str> = coord_part.split(':').collect();

        match parts.len() {
            3 => Ok(Self {
                group_id: parts[0].to_string(),
                artifact_id: parts[1].to_string(),
                version: parts[2].to_string(),
                classifier: None,
                packaging: packaging_override.unwrap_or("jar").to_string(),
            }),
            4 => Ok(Self {
                group_id: parts[0].to_string(),
                artifact_id: parts[1].to_string(),
                version: parts[2].to_string(),
                classifier: Some(parts[3].to_string()),
                packaging: packaging_override.unwrap_or("jar").to_string(),
            }),
            _ => Err(LauncherError::InvalidMavenCoordinate(coord.to_string())),
        }
    }

    /// Construct the group path portion (`net/sf/jopt-simple`).
    pub fn group_path(&self) -> String {
        self.group_id.replace('.', "/")
    }

    /// Build the artifact filename.
    ///
    /// `artifactId-version[-classifier].packaging`
    pub fn filename(&self) -> String {
        match &self.classifier {
            Some(c) => format!(
                "{}-{}-{}.{}",
                self.artifact_id, self.version, c, self.packaging
            ),
            None => format!("{}-{}.{}", self.artifact_id, self.version, self.packaging),
        }
    }

    /// Construct the full URL for this artifact under the given repository base.
    ///
    /// Template:
    /// `<repo>/<group_path>/<artifact_id>/<version>/<filename>`
    pub fn url(&self, repo_base: &str) -> String {
        format!("{}/{}", repo_base.trim_end_matches('/'), self.repo_path())
    }

    /// Local path relative to the libraries directory.
    ///
    /// Mirrors Maven's local repo layout:
    /// `<group_path>/<artifact_id>/<version>/<filename>`
    pub fn local_path(&self) -> PathBuf {
        PathBuf::from(self.group_path())
            .join(&self.artifact_id)
            .join(&self.version)
            .join(self.filename())
    }

    /// Forward-slash relative path, for joining onto repository URLs.
    pub fn repo_path(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.group_path(),
            self.artifact_id,
            self.version,
            self.filename()
        )
    }

    /// `group:artifact` without version, the identity shared by every
    /// build of one library.
    pub fn base_coordinate(&self) -> String {
        format!("{}:{}", self.group_id, self.artifact_id)
    }
}

impl fmt::Display for MavenArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.classifier {
            Some(c) => write!(
                f,
                "{}:{}:{}:{}@{}",
                self.group_id, self.artifact_id, self.version, c, self.packaging
            ),
            None => write!(
                f,
                "{}:{}:{}@{}",
                self.group_id, self.artifact_id, self.version, self.packaging
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_loader_coordinate() {
        let a = MavenArtifact::parse("net.fabricmc:fabric-loader:0.15.11").unwrap();
        assert_eq!(a.group_id, "net.fabricmc");
        assert_eq!(a.artifact_id, "fabric-loader");
        assert_eq!(a.version, "0.15.11");
        assert_eq!(a.classifier, None);
        assert_eq!(a.packaging, "jar");
        assert_eq!(a.base_coordinate(), "net.fabricmc:fabric-loader");
    }

    #[test]
    fn parse_native_classifier_and_packaging() {
        let a = MavenArtifact::parse("org.lwjgl:lwjgl:3.3.3:natives-windows-arm64").unwrap();
        assert_eq!(a.classifier.as_deref(), Some("natives-windows-arm64"));

        let b = MavenArtifact::parse("de.oceanlabs.mcp:mcp_config:1.20.1@zip").unwrap();
        assert_eq!(b.packaging, "zip");
        assert_eq!(b.filename(), "mcp_config-1.20.1.zip");
    }

    #[test]
    fn rejects_malformed_coordinates() {
        assert!(matches!(
            MavenArtifact::parse("guava"),
            Err(LauncherError::InvalidMavenCoordinate(_))
        ));
        assert!(MavenArtifact::parse("a:b:c:d:e").is_err());
    }

    #[test]
    fn url_ignores_trailing_slash_on_repo() {
        let a = MavenArtifact::parse("net.fabricmc:intermediary:1.16.4").unwrap();
        assert_eq!(
            a.url("https://maven.fabricmc.net/"),
            "https://maven.fabricmc.net/net/fabricmc/intermediary/1.16.4/intermediary-1.16.4.jar"
        );
    }

    #[test]
    fn optifine_layout() {
        let a = MavenArtifact::parse("optifine:OptiFine:1.12.2_HD_U_G5").unwrap();
        assert_eq!(
            a.repo_path(),
            "optifine/OptiFine/1.12.2_HD_U_G5/OptiFine-1.12.2_HD_U_G5.jar"
        );
        assert_eq!(
            a.local_path(),
            PathBuf::from("optifine/OptiFine/1.12.2_HD_U_G5/OptiFine-1.12.2_HD_U_G5.jar")
        );
    }
}
