use crate::core::version::{Arch, Library, Platform};

/// Drop libraries whose `natives-<os>[-<arch>]` classifier targets another
/// OS or architecture. Libraries without a native classifier always pass.
pub fn filter_libraries_for_platform(libraries: Vec<Library>, platform: &Platform) -> Vec<Library> {
    libraries
        .into_iter()
        .filter(|lib| native_matches(&lib.name, platform))
        .collect()
}

fn native_matches(name: &str, platform: &Platform) -> bool {
    let Some(classifier) = native_classifier(name) else {
        return true;
    };
    let (os, arch) = match classifier.split_once('-') {
        Some((os, arch)) => (os, Some(arch)),
        None => (classifier.as_str(), None),
    };
    if !platform.os.matches_name(os) {
        return false;
    }
    match arch {
        // Unsuffixed natives are the x86_64 build.
        None => platform.arch == Arch::X64,
        Some(suffix) => Arch::from_name(suffix).map_or(true, |a| a == platform.arch),
    }
}

/// `org.lwjgl:lwjgl:3.3.1:natives-windows-x86` → `windows-x86`.
fn native_classifier(name: &str) -> Option<String> {
    let coord = name.split('@').next().unwrap_or(name).to_ascii_lowercase();
    let classifier = coord.split(':').nth(3)?;
    classifier.strip_prefix("natives-").map(str::to_string)
}
