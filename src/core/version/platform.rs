// ─── Platform ───
// The OS/architecture pair that library rules and native classifiers are
// evaluated against. Passed explicitly so resolution is testable anywhere.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsFamily {
    Windows,
    Osx,
    Linux,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X64,
    X86,
    Arm64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
    pub os: OsFamily,
    pub arch: Arch,
}

impl OsFamily {
    /// Name used by `rules[].os.name` and `natives` keys.
    pub fn mojang_name(self) -> &'static str {
        match self {
            OsFamily::Windows => "windows",
            OsFamily::Osx => "osx",
            OsFamily::Linux => "linux",
        }
    }

    /// Accepts both the rule spelling (`osx`) and the classifier spelling (`macos`).
    pub fn matches_name(self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        match self {
            OsFamily::Windows => name == "windows",
            OsFamily::Osx => name == "osx" || name == "macos",
            OsFamily::Linux => name == "linux",
        }
    }
}

impl Arch {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "x86_64" | "amd64" | "x64" => Some(Arch::X64),
            "x86" | "i386" | "i686" | "ia32" => Some(Arch::X86),
            "arm64" | "aarch64" | "aarch_64" => Some(Arch::Arm64),
            _ => None,
        }
    }

    /// Value substituted for `${arch}` in legacy native classifiers.
    pub fn bits(self) -> &'static str {
        match self {
            Arch::X86 => "32",
            Arch::X64 | Arch::Arm64 => "64",
        }
    }
}

impl Platform {
    pub fn new(os: OsFamily, arch: Arch) -> Self {
        Self { os, arch }
    }

    pub fn current() -> Self {
        let os = if cfg!(target_os = "windows") {
            OsFamily::Windows
        } else if cfg!(target_os = "macos") {
            OsFamily::Osx
        } else {
            OsFamily::Linux
        };
        let arch = if cfg!(target_arch = "aarch64") {
            Arch::Arm64
        } else if cfg!(target_arch = "x86") {
            Arch::X86
        } else {
            Arch::X64
        };
        Self { os, arch }
    }
}
