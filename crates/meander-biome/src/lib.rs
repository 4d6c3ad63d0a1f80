//! Endless biome sequencing along the river axis: a registry of biome types,
//! deterministic per-direction decks, a hysteresis window of instances with
//! lazily built layouts, and boundary cross-fades.

mod deck;
mod features;
mod instance;
mod registry;
mod window;

pub mod catalog;
pub mod seed;

pub use catalog::{FILLER_BIOME, default_registry};
pub use deck::BiomeDeck;
pub use features::{BiomeFeatures, GroundColorFn, SkyGradient, SkyGradientFn};
pub use instance::{BiomeInstance, InstanceKey};
pub use registry::{BiomeId, BiomeRegistry, BiomeRegistryError};
pub use seed::Direction;
pub use window::{
    BiomeBounds, BiomeWindow, BiomeWindowConfig, BlendWeights, FeatureSegment, WindowChange,
};
