// ─── Provisioning Core ───
// Version profile resolution and artifact acquisition for a Minecraft
// game directory.
//
// Architecture:
//   core/
//     version/     Profile schema, OS rules, manifest, on-disk store
//     resolver/    Inheritance walk, merge, flatten
//     downloader/  Mirrors, resumable transfers, hashing, worker pool
//     acquire/     Task planning + batch acquisition
//     assets/      Asset index model
//     maven/       Coordinates and repository metadata
//     loaders/     Vanilla, Fabric, Quilt, Forge, NeoForge
//     java/        Java lookup for external installers
//     state/       Settings and shared engine state

pub mod acquire;
pub mod assets;
pub mod downloader;
pub mod error;
pub mod http;
pub mod java;
pub mod loaders;
pub mod maven;
pub mod resolver;
pub mod state;
pub mod version;
