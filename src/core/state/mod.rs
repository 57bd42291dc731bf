mod app_state;
mod settings;

pub use app_state::{default_data_dir, sync_file_copy, EngineState};
pub use settings::{DownloadSource, Endpoints, EngineSettings, SETTINGS_FILE};
