// ─── Mirror Table ───
// Maps official origins to their mirror counterparts and orders the
// candidate list for one URL according to the configured source.

use crate::core::state::DownloadSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorRule {
    pub origin: String,
    pub mirror: String,
    /// Whether a mirror URL can be mapped back to its origin.
    pub reversible: bool,
}

#[derive(Debug, Clone)]
pub struct MirrorTable {
    rules: Vec<MirrorRule>,
}

impl MirrorTable {
    /// Standard table against a BMCLAPI-compatible mirror at `bmclapi`.
    pub fn new(bmclapi: &str) -> Self {
        let b = bmclapi.trim_end_matches('/');
        let rule = |origin: &str, mirror: String, reversible: bool| MirrorRule {
            origin: origin.to_string(),
            mirror,
            reversible,
        };
        Self::from_rules(vec![
            rule("https://piston-meta.mojang.com/", format!("{b}/"), false),
            rule("https://piston-data.mojang.com/", format!("{b}/"), false),
            rule("https://launchermeta.mojang.com/", format!("{b}/"), false),
            rule("https://launcher.mojang.com/", format!("{b}/"), false),
            rule("https://resources.download.minecraft.net/", format!("{b}/assets/"), true),
            rule("https://libraries.minecraft.net/", format!("{b}/libraries/"), true),
            rule("https://maven.minecraftforge.net/", format!("{b}/maven/"), true),
        ])
    }

    pub fn from_rules(rules: Vec<MirrorRule>) -> Self {
        Self { rules }
    }

    /// `(primary, mirror)` pair for `url`, if any rule covers it.
    fn counterparts(&self, url: &str) -> Option<(String, String)> {
        for rule in &self.rules {
            if let Some(rest) = url.strip_prefix(&rule.origin) {
                return Some((url.to_string(), format!("{}{}", rule.mirror, rest)));
            }
        }
        for rule in self.rules.iter().filter(|r| r.reversible) {
            if let Some(rest) = url.strip_prefix(&rule.mirror) {
                return Some((format!("{}{}", rule.origin, rest), url.to_string()));
            }
        }
        None
    }

    /// Ordered, duplicate-free candidate URLs for one download.
    pub fn build(&self, source: DownloadSource, enabled: bool, url: &str) -> Vec<String> {
        if !enabled {
            return vec![url.to_string()];
        }
        let Some((primary, mirror)) = self.counterparts(url) else {
            return vec![url.to_string()];
        };

        let ordered = match source {
            DownloadSource::Auto if url == mirror => [mirror, primary],
            DownloadSource::Auto => [primary, mirror],
            DownloadSource::Mojang => [primary, mirror],
            DownloadSource::Bmclapi => [mirror, primary],
        };

        let mut out: Vec<String> = Vec::with_capacity(2);
        for candidate in ordered {
            if !out.contains(&candidate) {
                out.push(candidate);
            }
        }
        out
    }
}

/// Free-standing form over the default mirror.
pub fn build_mirrors(source: DownloadSource, enabled: bool, url: &str) -> Vec<String> {
    MirrorTable::new(super::BMCLAPI_BASE).build(source, enabled, url)
}
