//! interface-provisioner - install, flatten and download Minecraft versions

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use tracing::{debug, error, info};

use interface_provisioner::commands;
use interface_provisioner::core::downloader::{ProgressAggregator, ProgressEvent, ProgressPhase};
use interface_provisioner::core::error::LauncherError;
use interface_provisioner::core::loaders::LoaderKind;
use interface_provisioner::core::state::{default_data_dir, DownloadSource, EngineSettings, EngineState};

#[derive(Parser)]
#[command(name = "interface-provisioner")]
#[command(author, version, about = "Resolve version profiles and acquire game artifacts")]
struct Cli {
    /// Game directory (defaults to the launcher data dir)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Preferred origin: auto, mojang or bmclapi
    #[arg(long, global = true)]
    source: Option<DownloadSource>,

    /// Disable mirror fallback
    #[arg(long, global = true)]
    no_mirrors: bool,

    /// Concurrent downloads (1-12)
    #[arg(long, global = true)]
    parallel: Option<usize>,

    /// Bandwidth cap per transfer in KiB/s
    #[arg(long, global = true)]
    max_kbps: Option<u64>,

    /// Java executable or runtime directory for loader installers
    #[arg(long, global = true)]
    java: Option<PathBuf>,

    /// Persist the effective settings to the root
    #[arg(long, global = true)]
    save_settings: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install a loader, flatten it and download everything it needs
    Provision {
        /// vanilla, fabric, quilt, forge or neoforge
        loader: LoaderKind,
        /// Base game version or alias (latest-release, latest-snapshot)
        version: String,
        /// Pin a loader build
        #[arg(long)]
        build: Option<String>,
    },
    /// Write a standalone `<id>-flat` profile
    Flatten {
        version_id: String,
    },
    /// Download and verify all files of an installed profile
    Acquire {
        version_id: String,
    },
    /// Install a loader profile without flattening
    #[command(name = "install-loader")]
    InstallLoader {
        loader: LoaderKind,
        version: String,
        #[arg(long)]
        build: Option<String>,
    },
    /// List published loader builds for a game version
    #[command(name = "list-builds")]
    ListBuilds {
        loader: LoaderKind,
        version: String,
    },
    /// Remove leftover partial downloads
    #[command(name = "clean-parts")]
    CleanParts,
}

impl Cli {
    fn settings(&self, root: &std::path::Path) -> EngineSettings {
        let mut settings = EngineSettings::load(root);
        if let Some(source) = self.source {
            settings.download_source = source;
        }
        if self.no_mirrors {
            settings.mirrors_enabled = false;
        }
        if let Some(parallel) = self.parallel {
            settings.parallel = parallel;
        }
        if let Some(max_kbps) = self.max_kbps {
            settings.max_kbps = max_kbps;
        }
        if let Some(java) = &self.java {
            settings.java_path = Some(java.clone());
        }
        settings
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), LauncherError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> Result<(), LauncherError> {
    let root = cli.root.clone().unwrap_or_else(default_data_dir);
    let settings = cli.settings(&root);
    if cli.save_settings {
        settings.save(&root)?;
    }
    let state = EngineState::new(root.clone(), settings)?;

    let aggregator = Mutex::new(ProgressAggregator::new());
    let progress = |event: ProgressEvent| {
        if event.phase != ProgressPhase::Done {
            return;
        }
        let percent = match aggregator.lock() {
            Ok(mut agg) => {
                agg.update(&event);
                agg.percent()
            }
            Err(_) => return,
        };
        debug!(
            "[{:>5.1}%] {:?} {}/{} {}",
            percent, event.category, event.current, event.total, event.label
        );
    };

    match cli.command {
        Commands::Provision {
            loader,
            version,
            build,
        } => {
            let report =
                commands::provision(&state, loader, &version, build.as_deref(), &progress).await?;
            print_json(&report)?;
        }
        Commands::Flatten { version_id } => {
            println!("{}", commands::resolve_and_flatten_profile(&root, &version_id));
        }
        Commands::Acquire { version_id } => {
            let report = commands::acquire_artifacts(&state, &version_id, &progress).await?;
            print_json(&report)?;
        }
        Commands::InstallLoader {
            loader,
            version,
            build,
        } => {
            let result =
                commands::install_loader(&state, loader, &version, build.as_deref(), &progress)
                    .await?;
            print_json(&result)?;
        }
        Commands::ListBuilds { loader, version } => {
            for build in commands::list_loader_builds(&state, loader, &version).await? {
                println!("{}", build);
            }
        }
        Commands::CleanParts => {
            let removed = commands::clean_partial_markers(&root)?;
            info!("Removed {} partial downloads", removed);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    interface_provisioner::init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
