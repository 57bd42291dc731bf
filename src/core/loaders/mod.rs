pub mod context;
pub mod fabric;
pub mod forge;
pub mod installer;
pub mod neoforge;
pub mod quilt;
pub mod vanilla;

pub use context::InstallContext;
pub use fabric::{FabricFamily, FabricInstaller};
pub use forge::{ForgeFlavor, ForgeInstaller};
pub use installer::{is_valid_jar, Installer, LoaderInstallResult, LoaderInstaller, LoaderKind};
pub use vanilla::{ensure_base_profile, ensure_base_version, resolve_base_id, VanillaInstaller};
