// Quilt reuses the Fabric meta protocol; only endpoints and coordinates differ.

use crate::core::state::Endpoints;

use super::fabric::{FabricFamily, FabricInstaller};

impl FabricFamily {
    /// Quilt loader on Fabric's intermediary mappings.
    pub fn quilt(endpoints: &Endpoints) -> Self {
        Self {
            name: "Quilt",
            meta_base: endpoints.quilt_meta.clone(),
            maven: endpoints.quilt_maven.clone(),
            loader_coord: "org.quiltmc:quilt-loader",
            intermediary_coord: "net.fabricmc:intermediary",
            intermediary_maven: endpoints.fabric_maven.clone(),
            id_prefix: "quilt-loader",
            knot_client: "org.quiltmc.loader.impl.launch.knot.KnotClient",
        }
    }
}

impl FabricInstaller {
    pub fn quilt(endpoints: &Endpoints) -> Self {
        Self::new(FabricFamily::quilt(endpoints))
    }
}
