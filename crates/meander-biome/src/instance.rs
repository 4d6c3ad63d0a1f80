//! Materialized biome instances and their lazily built layouts.

use std::fmt;
use std::sync::{Arc, OnceLock};

use meander_layout::{
    BoatPathLayout, Decoration, GeometrySampler, LayoutPopulator, PathLayoutEngine,
    scatter_decorations,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::features::BiomeFeatures;
use crate::registry::BiomeId;
use crate::seed::{Direction, derive_instance_seed, derive_sub_seed};

/// Position of an instance in its direction's sequence.
///
/// Ordinal 0 of each direction touches `z = 0`; ordinals grow outward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceKey {
    pub direction: Direction,
    pub ordinal: u64,
}

impl InstanceKey {
    pub fn new(direction: Direction, ordinal: u64) -> Self {
        Self { direction, ordinal }
    }

    /// The key of the instance adjacent to this one toward `toward`.
    pub fn neighbor(self, toward: Direction) -> Self {
        if self.direction == toward {
            Self::new(toward, self.ordinal + 1)
        } else if self.ordinal == 0 {
            Self::new(toward, 0)
        } else {
            Self::new(self.direction, self.ordinal - 1)
        }
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = match self.direction {
            Direction::Negative => '-',
            Direction::Positive => '+',
        };
        write!(f, "{sign}{}", self.ordinal)
    }
}

/// One materialized occurrence of a biome type over `(z_min, z_max]`.
///
/// Bounds and type never change. The layout, decorations and population seed
/// derive only from the world seed and the instance's [`InstanceKey`].
pub struct BiomeInstance {
    key: InstanceKey,
    biome: BiomeId,
    z_min: f64,
    z_max: f64,
    seed: u64,
    features: Arc<BiomeFeatures>,
    layout: OnceLock<Arc<BoatPathLayout>>,
    decorations: OnceLock<Arc<[Decoration]>>,
}

impl BiomeInstance {
    pub fn new(
        key: InstanceKey,
        biome: BiomeId,
        features: Arc<BiomeFeatures>,
        z_min: f64,
        z_max: f64,
        world_seed: u64,
    ) -> Self {
        Self {
            key,
            biome,
            z_min,
            z_max,
            seed: derive_instance_seed(world_seed, key.direction, key.ordinal),
            features,
            layout: OnceLock::new(),
            decorations: OnceLock::new(),
        }
    }

    pub fn key(&self) -> InstanceKey {
        self.key
    }

    pub fn biome(&self) -> BiomeId {
        self.biome
    }

    pub fn z_min(&self) -> f64 {
        self.z_min
    }

    pub fn z_max(&self) -> f64 {
        self.z_max
    }

    pub fn length(&self) -> f64 {
        self.z_max - self.z_min
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn features(&self) -> &Arc<BiomeFeatures> {
        &self.features
    }

    /// Half-open membership: `z_min < z <= z_max`.
    pub fn contains(&self, z: f64) -> bool {
        self.z_min < z && z <= self.z_max
    }

    /// The layout of this instance, built on first access and cached.
    pub fn layout<S>(&self, engine: &PathLayoutEngine, sampler: &S) -> Arc<BoatPathLayout>
    where
        S: GeometrySampler + ?Sized,
    {
        let layout = self.layout.get_or_init(|| {
            let mut rng = ChaCha8Rng::seed_from_u64(derive_sub_seed(self.seed, "layout"));
            Arc::new(engine.create_layout(
                sampler,
                self.z_min,
                self.z_max,
                self.features.layout_config(),
                &mut rng,
            ))
        });
        Arc::clone(layout)
    }

    /// The cached layout, if it has been built.
    pub fn cached_layout(&self) -> Option<&Arc<BoatPathLayout>> {
        self.layout.get()
    }

    /// Bank decorations of this instance, built on first access and cached.
    pub fn decorations<S>(&self, engine: &PathLayoutEngine, sampler: &S) -> Arc<[Decoration]>
    where
        S: GeometrySampler + ?Sized,
    {
        let decorations = self.decorations.get_or_init(|| {
            let layout = self.layout(engine, sampler);
            let mut rng = ChaCha8Rng::seed_from_u64(derive_sub_seed(self.seed, "decorations"));
            scatter_decorations(self.features.decoration_config(), &layout, &mut rng).into()
        });
        Arc::clone(decorations)
    }

    /// A fresh populator over this instance's layout and decorations.
    pub fn populator<S>(&self, engine: &PathLayoutEngine, sampler: &S) -> LayoutPopulator
    where
        S: GeometrySampler + ?Sized,
    {
        LayoutPopulator::new(
            self.layout(engine, sampler),
            self.decorations(engine, sampler),
            derive_sub_seed(self.seed, "populate"),
        )
    }
}

impl fmt::Debug for BiomeInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BiomeInstance")
            .field("key", &self.key)
            .field("biome", &self.features.name())
            .field("z_min", &self.z_min)
            .field("z_max", &self.z_max)
            .field("layout_built", &self.layout.get().is_some())
            .finish()
    }
}
