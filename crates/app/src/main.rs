use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use revo_gui::{AppSettings, GuiApp};
use revo_registry::Registry;

/// Desktop frontend for retrieval-based voice conversion.
#[derive(Parser)]
#[command(name = "revo")]
#[command(about = "Voice conversion frontend", long_about = None)]
struct Cli {
    /// Share the interface remotely (unsupported in the native frontend).
    #[arg(long)]
    share: bool,
    /// Directory scanned for model weights.
    #[arg(long)]
    weight_root: Option<PathBuf>,
    /// Directory scanned for retrieval indices.
    #[arg(long)]
    index_root: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    if cli.share {
        warn!("--share requested, but remote sharing is not supported by the native frontend");
    }

    let settings = AppSettings::load().unwrap_or_else(|err| {
        warn!("failed to load settings, using defaults: {err:#}");
        AppSettings::default()
    });

    let weight_root = cli
        .weight_root
        .unwrap_or_else(|| PathBuf::from(settings.resolved_weight_root()));
    let index_root = cli
        .index_root
        .unwrap_or_else(|| PathBuf::from(settings.resolved_index_root()));
    info!(
        "scanning weights in {} and indices in {}",
        weight_root.display(),
        index_root.display()
    );

    let registry = Registry::discover(weight_root, index_root);
    let gui_app = GuiApp::new(registry, settings);

    gui_app
        .run()
        .map_err(|err| anyhow::anyhow!("failed to run GUI application: {err}"))?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
