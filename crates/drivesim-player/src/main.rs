/// DriveSim — 2D driving simulation with safety-scenario interruptions
///
/// Architecture:
///   engine/   — Window loop, rasterizer, bitmap font, headless driver
///   game/     — Vehicle, world, camera, scenarios, statistics, HUD
mod engine;
mod game;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use drivesim_common::{GatewayConfig, SimConfig};
use drivesim_gateway::{HttpGateway, JsonFileGateway, NullGateway, PersistenceGateway};

use game::catalog::Catalog;
use game::Simulation;

#[derive(Parser, Debug)]
#[command(name = "drivesim", version, about = "Driving simulation with safety scenarios")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, default_value = "drivesim.toml")]
    config: PathBuf,

    /// Seed for scenario selection and triggers
    #[arg(long)]
    seed: Option<u64>,

    /// Run this many ticks with a scripted driver instead of opening a window
    #[arg(long, value_name = "TICKS")]
    headless: Option<u64>,

    /// Write results as JSON files into this directory
    #[arg(long, value_name = "DIR")]
    offline: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("drivesim=debug".parse()?))
        .init();

    tracing::info!("DriveSim v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let mut config = SimConfig::load_or_default(Some(args.config.as_path()))
        .with_context(|| format!("Loading {}", args.config.display()))?;
    if let Some(seed) = args.seed {
        config.scenarios.seed = Some(seed);
    }
    if let Some(dir) = args.offline {
        // Offline on the command line wins over a configured endpoint
        config.gateway.endpoint = None;
        config.gateway.offline_dir = Some(dir);
    }

    let catalog = match &config.scenarios.catalog {
        Some(path) => Catalog::load(path)
            .with_context(|| format!("Loading scenarios from {}", path.display()))?,
        None => Catalog::builtin().context("Built-in scenario bank")?,
    };
    if catalog.is_empty() {
        tracing::warn!("Scenario catalog is empty, sessions will end immediately");
    } else {
        tracing::info!("Scenario catalog: {} entries", catalog.len());
    }

    let gateway = build_gateway(&config.gateway)?;
    let submit_timeout = Duration::from_secs(config.gateway.timeout_secs);
    let driver_seed = config.scenarios.seed.unwrap_or(0);
    let mut sim = Simulation::new(config, catalog, gateway);

    match args.headless {
        Some(ticks) => {
            let report = engine::headless::run(&mut sim, ticks, driver_seed, submit_timeout);
            let json = serde_json::to_string_pretty(&report)?;
            tracing::info!("Headless run finished:\n{}", json);
            Ok(())
        }
        None => engine::run(sim, submit_timeout),
    }
}

/// HTTP when an endpoint is configured, else JSON files when an offline
/// directory is, else nothing
fn build_gateway(cfg: &GatewayConfig) -> Result<Box<dyn PersistenceGateway>> {
    if let Some(endpoint) = &cfg.endpoint {
        let gateway = HttpGateway::new(endpoint, cfg.token.as_deref(), Duration::from_secs(cfg.timeout_secs))
            .context("Creating HTTP gateway")?;
        tracing::info!("Results go to {}", endpoint);
        return Ok(Box::new(gateway));
    }
    if let Some(dir) = &cfg.offline_dir {
        tracing::info!("Results go to {}", dir.display());
        return Ok(Box::new(JsonFileGateway::new(dir)));
    }
    tracing::warn!("No results endpoint or offline directory configured, results are discarded");
    Ok(Box::new(NullGateway))
}
