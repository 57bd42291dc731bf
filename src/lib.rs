pub mod commands;
pub mod core;

use tracing_subscriber::EnvFilter;

/// Structured logging to stderr; `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,interface_provisioner=debug")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
