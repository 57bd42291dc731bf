use crate::core::downloader::ProgressSink;
use crate::core::state::EngineState;

/// Everything one loader install needs.
pub struct InstallContext<'a> {
    pub state: &'a EngineState,
    /// Base game version id or alias (`latest-release`, ...).
    pub base_version: &'a str,
    /// Loader build requested by the caller, if any.
    pub build_hint: Option<&'a str>,
    pub progress: &'a ProgressSink<'a>,
}
