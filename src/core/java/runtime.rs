// ─── Java Discovery ───
// Locates the Java executable used to run external loader installers.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};

pub fn java_exe() -> &'static str {
    if cfg!(windows) {
        "java.exe"
    } else {
        "java"
    }
}

/// `bin/java` inside a runtime directory, also trying the macOS bundle
/// layout and finally a recursive search.
pub fn locate_java_binary(runtime_root: &Path) -> Option<PathBuf> {
    let primary = runtime_root.join("bin").join(java_exe());
    if primary.is_file() {
        return Some(primary);
    }

    let mac_layout = runtime_root
        .join("Contents")
        .join("Home")
        .join("bin")
        .join(java_exe());
    if mac_layout.is_file() {
        return Some(mac_layout);
    }

    find_java_binary_recursive(runtime_root)
}

fn find_java_binary_recursive(root: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(root).ok()?;
    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();
        let file_type = entry.file_type().ok()?;

        if file_type.is_file() {
            if path.file_name().and_then(|n| n.to_str()) == Some(java_exe()) {
                return Some(path);
            }
        } else if file_type.is_dir() {
            if let Some(found) = find_java_binary_recursive(&path) {
                return Some(found);
            }
        }
    }
    None
}

/// Resolve the Java executable.
///
/// 1. `hint`: an executable, or a runtime directory containing one.
///    A hint that does not resolve is an error.
/// 2. `JAVA_HOME`.
/// 3. `java` on `PATH`.
pub fn resolve_java_binary(hint: Option<&Path>) -> LauncherResult<PathBuf> {
    if let Some(hint) = hint {
        if hint.is_file() {
            return Ok(hint.to_path_buf());
        }
        if hint.is_dir() {
            if let Some(found) = locate_java_binary(hint) {
                return Ok(found);
            }
        }
        return Err(LauncherError::JavaNotFound(format!(
            "configured Java path {} does not contain an executable",
            hint.display()
        )));
    }

    if let Some(home) = std::env::var_os("JAVA_HOME") {
        let candidate = PathBuf::from(home).join("bin").join(java_exe());
        if candidate.is_file() {
            debug!("Using Java from JAVA_HOME: {:?}", candidate);
            return Ok(candidate);
        }
    }

    Ok(PathBuf::from(java_exe()))
}
