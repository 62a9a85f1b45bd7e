use anyhow::Result;
use renderer::{load_or_create_phase, Renderer, RendererConfig};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::state::{default_state_file, FilePhaseStore};

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

pub fn run(cli: Cli) -> Result<()> {
    let state_path = match cli.state_file {
        Some(path) => path,
        None => default_state_file()?,
    };
    let mut store = FilePhaseStore::open(state_path)?;
    if cli.reset_phase {
        tracing::info!("--reset-phase requested; discarding persisted phase");
        store.reset();
    }
    let phase = load_or_create_phase(&mut store);

    let config = RendererConfig {
        surface_size: cli.size.unwrap_or((1920, 1080)),
        strength: cli.strength.clamp(0.0, 1.0),
        reduced_motion: cli.reduced_motion,
        phase,
    };
    tracing::info!(
        width = config.surface_size.0,
        height = config.surface_size.1,
        strength = config.strength,
        reduced_motion = config.reduced_motion,
        "starting blobwall background"
    );

    Renderer::new(config).run()
}
