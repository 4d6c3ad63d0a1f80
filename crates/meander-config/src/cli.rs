//! Command-line arguments for the demo driver.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "meander", about = "Endless river biome and layout generator")]
pub struct CliArgs {
    /// World seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Camera start coordinate.
    #[arg(long, allow_hyphen_values = true)]
    pub start_z: Option<f64>,

    /// Distance to travel; negative travels toward -z.
    #[arg(long, allow_hyphen_values = true)]
    pub distance: Option<f64>,

    /// Layout entries populated per frame.
    #[arg(long)]
    pub entries_per_step: Option<usize>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Config directory (overrides the platform default).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(seed) = args.seed {
            self.world.seed = seed;
        }
        if let Some(z) = args.start_z {
            self.demo.start_z = z;
        }
        if let Some(distance) = args.distance {
            self.demo.travel_distance = distance;
        }
        if let Some(n) = args.entries_per_step {
            self.populate.entries_per_step = n;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            seed: Some(42),
            distance: Some(-3000.0),
            ..CliArgs::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.world.seed, 42);
        assert_eq!(config.demo.travel_distance, -3000.0);
        // Non-overridden fields retain defaults
        assert_eq!(config.demo.start_z, 0.0);
        assert_eq!(config.populate.entries_per_step, 64);
    }

    #[test]
    fn test_cli_no_override() {
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_parse_negative_values() {
        let args = CliArgs::try_parse_from([
            "meander",
            "--start-z",
            "-500",
            "--distance",
            "-2000.5",
            "--entries-per-step",
            "16",
        ])
        .unwrap();
        assert_eq!(args.start_z, Some(-500.0));
        assert_eq!(args.distance, Some(-2000.5));
        assert_eq!(args.entries_per_step, Some(16));
        assert!(args.config.is_none());
    }
}
