use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the provisioning engine.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    #[error("Range not satisfiable for {url}, partial file discarded")]
    RangeNotSatisfiable { url: String },

    #[error("Attempt on {url} exceeded {after_ms} ms")]
    Timeout { url: String, after_ms: u64 },

    /// Every mirror and attempt for one artifact was exhausted.
    #[error("[{label}] download failed: {cause}")]
    Network { label: String, cause: String },

    // ── Integrity ───────────────────────────────────────
    #[error("Hash mismatch for {path:?}: expected {expected}, got {actual}")]
    Integrity {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    // ── Profiles ────────────────────────────────────────
    #[error("Profile resolution failed: {0}")]
    ProfileResolution(String),

    // ── Maven ───────────────────────────────────────────
    #[error("Invalid Maven coordinate: {0}")]
    InvalidMavenCoordinate(String),

    // ── XML ─────────────────────────────────────────────
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::DeError),

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Java ────────────────────────────────────────────
    #[error("Java not found: {0}")]
    JavaNotFound(String),

    // ── Loader ──────────────────────────────────────────
    #[error("No compatible {loader} build for {version}: {reason}")]
    LoaderCompatibility {
        loader: String,
        version: String,
        reason: String,
    },

    #[error("{loader} installer failed: {output}")]
    InstallerExecution { loader: String, output: String },

    #[error("Loader error: {0}")]
    Loader(String),

    #[error("Loader API unreachable: {0}")]
    LoaderApi(String),

    // ── Archive ─────────────────────────────────────────
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

impl LauncherError {
    /// Whether another mirror or attempt may succeed where this one failed.
    ///
    /// Hash mismatches are terminal: the bytes on disk are kept for
    /// inspection and the batch is aborted.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, LauncherError::Integrity { .. })
    }
}
