//! River path layout: centerline sampling, boat path weaving, stage and pattern
//! placement, bank decorations, and resumable population.

mod engine;
mod layout;
mod pattern;
mod populate;
mod stage;
mod weave;

pub mod config;
pub mod decoration;
pub mod geometry;

pub use config::{
    EntityTag, ExplicitPlacement, LayoutConfig, LayoutConfigError, PatternChoice, PatternConfig,
    PatternLogic, PlaceMode, StageConfig, TrackConfig,
};
pub use decoration::{
    Decoration, DecorationConfig, DecorationRule, DecorationSide, scatter_decorations,
};
pub use engine::{LayoutEngineConfig, PathLayoutEngine};
pub use geometry::{GeometrySample, GeometrySampler, MeanderParams, MeanderSampler};
pub use layout::{BoatPathLayout, LayoutBlock, PathFrame, PathPoint, Placement, Side};
pub use pattern::place_entity;
pub use populate::{LayoutPopulator, PopulateConfig, SpawnKind, SpawnRequest, StepStatus};
pub use stage::{StageInstance, generate_stages};
pub use weave::{crossings_from_stages, weave_offset};
