// NeoForge versions follow the game's minor line (`1.20.4` → `20.4.x`) and
// are installed through the same installer flow as Forge.

use crate::core::state::Endpoints;
use crate::core::version::ordering::sort_newest_first;

use super::forge::{ForgeFlavor, ForgeInstaller};

/// `1.20.4` → `20.4`, `1.21` → `21.0`.
pub fn mc_to_neoforge_line(mc: &str) -> String {
    let mut parts: Vec<&str> = mc.trim().split('.').filter(|p| !p.is_empty()).collect();
    if parts.first() == Some(&"1") {
        parts.remove(0);
    }
    if parts.len() == 1 {
        parts.push("0");
    }
    parts.truncate(2);
    parts.join(".")
}

fn is_beta(version: &str) -> bool {
    version.to_ascii_lowercase().contains("beta")
}

/// Builds on the game's line, stable releases before betas, each newest first.
pub fn order_neoforge_builds(mc: &str, versions: Vec<String>) -> Vec<String> {
    let prefix = format!("{}.", mc_to_neoforge_line(mc));
    let (mut beta, mut stable): (Vec<String>, Vec<String>) = versions
        .into_iter()
        .filter(|v| v.starts_with(&prefix))
        .partition(|v| is_beta(v));
    sort_newest_first(&mut stable);
    sort_newest_first(&mut beta);
    stable.extend(beta);
    stable
}

impl ForgeInstaller {
    pub fn neoforge(endpoints: &Endpoints) -> Self {
        let metadata = "net/neoforged/neoforge/maven-metadata.xml";
        Self::new(
            ForgeFlavor::NeoForge,
            endpoints.neoforge_maven.clone(),
            vec![
                format!("{}/{}", endpoints.neoforge_maven.trim_end_matches('/'), metadata),
                format!("{}/maven/{}", endpoints.bmclapi.trim_end_matches('/'), metadata),
            ],
        )
    }
}
