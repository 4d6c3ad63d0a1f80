//! Per-frame driver: keeps the biome window around the camera, starts a
//! populator for every instance in view, and spends a fixed entry budget per
//! frame draining them.

use std::collections::BTreeMap;

use glam::DVec3;
use meander_biome::{BiomeRegistryError, BiomeWindow, BiomeWindowConfig, InstanceKey};
use meander_config::Config;
use meander_layout::{
    LayoutEngineConfig, LayoutPopulator, MeanderParams, MeanderSampler, PathLayoutEngine,
    PopulateConfig, SpawnKind, StepStatus,
};
use tracing::{debug, info};

pub fn window_config(config: &Config) -> BiomeWindowConfig {
    BiomeWindowConfig {
        window_radius: config.window.window_radius,
        prune_radius: config.window.prune_radius,
        transition_width: config.window.transition_width,
    }
}

pub fn engine_config(config: &Config) -> LayoutEngineConfig {
    LayoutEngineConfig {
        sample_step: config.layout.sample_step,
        margin: config.layout.margin,
    }
}

pub fn populate_config(config: &Config) -> PopulateConfig {
    PopulateConfig {
        entries_per_step: config.populate.entries_per_step,
    }
}

/// Counters accumulated over a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DriverStats {
    pub frames: u64,
    pub layouts_built: usize,
    pub placements: usize,
    pub decorations: usize,
    pub instances_added: usize,
    pub instances_pruned: usize,
}

struct ActiveInstance {
    populator: LayoutPopulator,
    done: bool,
}

pub struct RiverDriver {
    window: BiomeWindow,
    engine: PathLayoutEngine,
    sampler: MeanderSampler,
    populate: PopulateConfig,
    active: BTreeMap<InstanceKey, ActiveInstance>,
    stats: DriverStats,
}

impl RiverDriver {
    /// Builds the driver over the built-in biome catalog.
    pub fn new(config: &Config) -> Result<Self, BiomeRegistryError> {
        let (registry, filler) = meander_biome::default_registry()?;
        let seed = config.world.seed;
        let window = BiomeWindow::new(registry, filler, seed, window_config(config))?;
        let sampler = MeanderSampler::new(MeanderParams {
            seed: (seed ^ (seed >> 32)) as u32,
            ..MeanderParams::default()
        });
        Ok(Self {
            window,
            engine: PathLayoutEngine::new(engine_config(config)),
            sampler,
            populate: populate_config(config),
            active: BTreeMap::new(),
            stats: DriverStats::default(),
        })
    }

    pub fn window(&self) -> &BiomeWindow {
        &self.window
    }

    pub fn stats(&self) -> DriverStats {
        self.stats
    }

    /// Number of instances still being populated.
    pub fn pending(&self) -> usize {
        self.active.values().filter(|a| !a.done).count()
    }

    /// Advances one frame with the camera at `camera_z`.
    pub fn frame(&mut self, camera_z: f64) {
        self.stats.frames += 1;
        let radius = self.window.config().window_radius;
        let change = self.window.ensure_window(camera_z, radius);
        self.stats.instances_added += change.added;
        self.stats.instances_pruned += change.pruned;

        let window = &self.window;
        self.active.retain(|key, _| window.instances().any(|inst| inst.key() == *key));

        for segment in self.window.feature_segments(camera_z - radius, camera_z + radius) {
            let inst = &segment.instance;
            if self.active.contains_key(&inst.key()) {
                continue;
            }
            let populator = inst.populator(&self.engine, &self.sampler);
            self.stats.layouts_built += 1;
            debug!(
                "instance {} ({}) [{:.0}, {:.0}]: {} entries to populate",
                inst.key(),
                inst.features().name(),
                inst.z_min(),
                inst.z_max(),
                populator.total()
            );
            self.active.insert(
                inst.key(),
                ActiveInstance {
                    populator,
                    done: false,
                },
            );
        }

        let mut budget = self.populate.entries_per_step;
        let stats = &mut self.stats;
        for active in self.active.values_mut().filter(|a| !a.done) {
            if budget == 0 {
                break;
            }
            let mut used = 0;
            let status = active.populator.step(budget, &mut |req| {
                used += 1;
                match req.kind {
                    SpawnKind::Placement => stats.placements += 1,
                    SpawnKind::Decoration => stats.decorations += 1,
                }
            });
            budget -= used;
            active.done = status == StepStatus::Done;
        }

        if self.stats.frames % 120 == 0 {
            let fog = self.window.fog_density(camera_z);
            let ground = self.window.ground_color(DVec3::new(0.0, 0.0, camera_z));
            debug!(
                "frame {} at z={camera_z:.0}: fog {fog:.4}, ground {ground:?}, {} pending",
                self.stats.frames,
                self.pending()
            );
        }
    }
}

/// Scrolls the camera over the configured distance, one frame at a time.
pub fn run(config: &Config) -> Result<DriverStats, BiomeRegistryError> {
    let mut driver = RiverDriver::new(config)?;
    let demo = &config.demo;
    let per_frame = (demo.speed * demo.frame_dt).abs();
    let frames = if per_frame > 0.0 && demo.travel_distance.is_finite() {
        (demo.travel_distance.abs() / per_frame).ceil() as u64
    } else {
        0
    };
    let sign = demo.travel_distance.signum();

    let mut camera_z = demo.start_z;
    driver.frame(camera_z);
    for frame in 1..=frames {
        let travelled = (frame as f64 * per_frame).min(demo.travel_distance.abs());
        camera_z = demo.start_z + sign * travelled;
        driver.frame(camera_z);
    }

    let stats = driver.stats();
    info!(
        "Reached z={camera_z:.0} after {} frames; {} instances active, {} pending",
        stats.frames,
        driver.window().len(),
        driver.pending()
    );
    Ok(stats)
}
