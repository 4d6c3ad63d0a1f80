//! Headless river run: scrolls a camera along Z, keeps the biome window
//! around it, and populates the layouts of every biome in view.
//!
//! Run with: `cargo run -p meander-demo -- --seed 42 --distance 20000`

mod driver;

use clap::Parser;
use meander_config::{CliArgs, Config, default_config_dir};
use tracing::{error, info, warn};

fn main() {
    let args = CliArgs::parse();
    let config_dir = args.config.clone().unwrap_or_else(default_config_dir);

    let (mut config, load_error) = match Config::load_or_create(&config_dir) {
        Ok(config) => (config, None),
        Err(err) => (Config::default(), Some(err)),
    };
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    meander_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));
    if let Some(err) = load_error {
        warn!("Using default config: {err}");
    }

    info!(
        "Seed {} | start z={:.0} | distance {:.0} | {} entries per frame",
        config.world.seed,
        config.demo.start_z,
        config.demo.travel_distance,
        config.populate.entries_per_step,
    );

    match driver::run(&config) {
        Ok(stats) => info!(
            "Built {} layouts: {} placements, {} decorations; instances +{} -{}",
            stats.layouts_built,
            stats.placements,
            stats.decorations,
            stats.instances_added,
            stats.instances_pruned,
        ),
        Err(err) => {
            error!("Failed to build the biome window: {err}");
            std::process::exit(1);
        }
    }
}
