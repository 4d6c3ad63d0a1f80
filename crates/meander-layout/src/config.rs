//! Declarative layout configuration: patterns, stages, and tracks.
//!
//! A [`LayoutConfig`] is immutable input to the layout engine. It may be built
//! in code or authored as RON; [`LayoutConfig::validate`] checks the internal
//! references and numeric ranges.

use std::fmt;

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

/// Identifier of a spawnable entity type (e.g. `"rock"`, `"crocodile"`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityTag(pub String);

impl EntityTag {
    /// Creates a tag from any string-like value.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityTag {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a pattern distributes its instances along a path-index range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternLogic {
    /// Uniformly random positions.
    Scatter,
    /// Evenly spaced positions.
    Sequence,
    /// Evenly spaced pairs, one member on each side of the path.
    Gate,
    /// Evenly spaced, alternating sides.
    Staggered,
    /// Tight group around one random center.
    Cluster,
}

/// Where across the river a placement's lateral range lies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceMode {
    /// Directly on the boat path.
    Path,
    /// Between the boat path and a bank.
    Slalom,
    /// Along a bank, reaching past it.
    Shore,
}

/// A reusable distribution rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatternConfig {
    pub logic: PatternLogic,
    pub place: PlaceMode,
    /// Instances per 100 distance units at progress 0 and 1.
    pub density: [f64; 2],
    /// Candidate entity types; one is chosen uniformly per instance.
    pub tags: Vec<EntityTag>,
    #[serde(default)]
    pub min_count: Option<u32>,
    #[serde(default)]
    pub max_count: Option<u32>,
    /// Aggressiveness at progress 0 and 1, copied onto each placement.
    #[serde(default)]
    pub aggressiveness: Option<[f64; 2]>,
}

impl PatternConfig {
    /// Creates a pattern with no count bounds or aggressiveness.
    pub fn new(
        logic: PatternLogic,
        place: PlaceMode,
        density: [f64; 2],
        tags: impl IntoIterator<Item = EntityTag>,
    ) -> Self {
        Self {
            logic,
            place,
            density,
            tags: tags.into_iter().collect(),
            min_count: None,
            max_count: None,
            aggressiveness: None,
        }
    }

    /// Sets the count bounds.
    pub fn with_counts(mut self, min: Option<u32>, max: Option<u32>) -> Self {
        self.min_count = min;
        self.max_count = max;
        self
    }

    /// Sets the aggressiveness ramp.
    pub fn with_aggressiveness(mut self, range: [f64; 2]) -> Self {
        self.aggressiveness = Some(range);
        self
    }

    /// Density at biome progress `progress`, linearly interpolated.
    pub fn density_at(&self, progress: f64) -> f64 {
        lerp(self.density[0], self.density[1], progress.clamp(0.0, 1.0))
    }

    /// Aggressiveness at biome progress `progress`, if configured.
    pub fn aggressiveness_at(&self, progress: f64) -> Option<f64> {
        self.aggressiveness
            .map(|[lo, hi]| lerp(lo, hi, progress.clamp(0.0, 1.0)))
    }

    /// Clamps `count` into `[min_count, max_count]`.
    pub fn clamp_count(&self, count: u32) -> u32 {
        let mut count = count;
        if let Some(min) = self.min_count {
            count = count.max(min);
        }
        if let Some(max) = self.max_count {
            count = count.min(max);
        }
        count
    }
}

/// One weighted option in a stage's pattern choice set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatternChoice {
    /// Key into [`LayoutConfig::patterns`].
    pub pattern: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl PatternChoice {
    pub fn new(pattern: impl Into<String>, weight: f64) -> Self {
        Self {
            pattern: pattern.into(),
            weight,
        }
    }
}

/// A progress-bounded procedural rule set within a track.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    /// Biome progress window `[lo, hi)` in which the stage may be selected.
    pub progress_range: [f64; 2],
    /// Parallel choice sets; one pattern is drawn from each.
    pub choices: Vec<Vec<PatternChoice>>,
}

impl StageConfig {
    pub fn new(progress_range: [f64; 2], choices: Vec<Vec<PatternChoice>>) -> Self {
        Self {
            progress_range,
            choices,
        }
    }

    /// Whether the stage may start at `progress`.
    pub fn is_eligible(&self, progress: f64) -> bool {
        progress >= self.progress_range[0] && progress < self.progress_range[1]
    }
}

/// A single hand-placed entity at a fixed biome progress.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExplicitPlacement {
    pub name: String,
    pub place: PlaceMode,
    /// Biome progress in `[0, 1]`.
    pub at: f64,
    pub tag: EntityTag,
}

/// An independent lane of content generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TrackConfig {
    /// Fills the biome by repeated stage selection.
    Stages(Vec<StageConfig>),
    /// Places each entry exactly once.
    Explicit(Vec<ExplicitPlacement>),
}

/// Full layout description for one biome type.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub patterns: HashMap<String, PatternConfig>,
    pub tracks: Vec<TrackConfig>,
    /// Entities that live in the water; shore placements for anything else are
    /// pushed up onto the bank.
    pub water_entity_tags: HashSet<EntityTag>,
}

/// Problems found by [`LayoutConfig::validate`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutConfigError {
    /// A stage choice names a pattern that does not exist.
    #[error("stage choice references unknown pattern: {0}")]
    UnknownPattern(String),
    /// A density bound is negative or not a number.
    #[error("pattern {0} has an invalid density range")]
    InvalidDensity(String),
    /// A stage progress range is outside `[0, 1]` or empty.
    #[error("invalid stage progress range [{0}, {1}]")]
    InvalidProgressRange(f64, f64),
    /// `min_count` exceeds `max_count`.
    #[error("pattern {0} has min_count greater than max_count")]
    InvalidCountBounds(String),
    /// An explicit placement sits outside `[0, 1]`.
    #[error("explicit placement {0} has progress outside [0, 1]")]
    InvalidProgress(String),
    /// A pattern has no candidate tags.
    #[error("pattern {0} has no tags")]
    EmptyTags(String),
    /// A choice weight is negative or not a number.
    #[error("pattern choice {0} has an invalid weight")]
    InvalidWeight(String),
}

impl LayoutConfig {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a named pattern.
    pub fn with_pattern(mut self, name: impl Into<String>, pattern: PatternConfig) -> Self {
        self.patterns.insert(name.into(), pattern);
        self
    }

    /// Appends a track.
    pub fn with_track(mut self, track: TrackConfig) -> Self {
        self.tracks.push(track);
        self
    }

    /// Marks entity tags as water-dwelling.
    pub fn with_water_tags(mut self, tags: impl IntoIterator<Item = EntityTag>) -> Self {
        self.water_entity_tags.extend(tags);
        self
    }

    /// Whether `tag` is a water-dwelling entity.
    pub fn is_water_entity(&self, tag: &EntityTag) -> bool {
        self.water_entity_tags.contains(tag)
    }

    /// Checks every reference and numeric range in the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first [`LayoutConfigError`] encountered.
    pub fn validate(&self) -> Result<(), LayoutConfigError> {
        for (name, pattern) in &self.patterns {
            let [lo, hi] = pattern.density;
            if !(lo >= 0.0 && hi >= 0.0) {
                return Err(LayoutConfigError::InvalidDensity(name.clone()));
            }
            if let (Some(min), Some(max)) = (pattern.min_count, pattern.max_count)
                && min > max
            {
                return Err(LayoutConfigError::InvalidCountBounds(name.clone()));
            }
            if pattern.tags.is_empty() {
                return Err(LayoutConfigError::EmptyTags(name.clone()));
            }
        }

        for track in &self.tracks {
            match track {
                TrackConfig::Stages(stages) => {
                    for stage in stages {
                        let [lo, hi] = stage.progress_range;
                        if !(0.0..=1.0).contains(&lo) || !(0.0..=1.0).contains(&hi) || lo >= hi {
                            return Err(LayoutConfigError::InvalidProgressRange(lo, hi));
                        }
                        for choice in stage.choices.iter().flatten() {
                            if !self.patterns.contains_key(&choice.pattern) {
                                return Err(LayoutConfigError::UnknownPattern(
                                    choice.pattern.clone(),
                                ));
                            }
                            if !(choice.weight >= 0.0) {
                                return Err(LayoutConfigError::InvalidWeight(
                                    choice.pattern.clone(),
                                ));
                            }
                        }
                    }
                }
                TrackConfig::Explicit(placements) => {
                    for placement in placements {
                        if !(0.0..=1.0).contains(&placement.at) {
                            return Err(LayoutConfigError::InvalidProgress(
                                placement.name.clone(),
                            ));
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

pub(crate) fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rocks() -> PatternConfig {
        PatternConfig::new(
            PatternLogic::Scatter,
            PlaceMode::Slalom,
            [1.0, 3.0],
            [EntityTag::from("rock")],
        )
    }

    fn single_stage(pattern: &str) -> TrackConfig {
        TrackConfig::Stages(vec![StageConfig::new(
            [0.0, 1.0],
            vec![vec![PatternChoice::new(pattern, 1.0)]],
        )])
    }

    #[test]
    fn test_density_interpolates_across_progress() {
        let p = rocks();
        assert_eq!(p.density_at(0.0), 1.0);
        assert_eq!(p.density_at(0.5), 2.0);
        assert_eq!(p.density_at(1.0), 3.0);
        assert_eq!(p.density_at(7.0), 3.0, "progress is clamped");
    }

    #[test]
    fn test_clamp_count_respects_bounds() {
        let p = rocks().with_counts(Some(2), Some(5));
        assert_eq!(p.clamp_count(0), 2);
        assert_eq!(p.clamp_count(3), 3);
        assert_eq!(p.clamp_count(9), 5);
        assert_eq!(rocks().clamp_count(9), 9);
    }

    #[test]
    fn test_stage_eligibility_is_half_open() {
        let stage = StageConfig::new([0.2, 0.6], vec![]);
        assert!(!stage.is_eligible(0.1));
        assert!(stage.is_eligible(0.2));
        assert!(stage.is_eligible(0.59));
        assert!(!stage.is_eligible(0.6));
    }

    #[test]
    fn test_valid_config_passes() {
        let config = LayoutConfig::new()
            .with_pattern("rocks", rocks())
            .with_track(single_stage("rocks"));
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_unknown_pattern_rejected() {
        let config = LayoutConfig::new()
            .with_pattern("rocks", rocks())
            .with_track(single_stage("logs"));
        assert_eq!(
            config.validate(),
            Err(LayoutConfigError::UnknownPattern("logs".into()))
        );
    }

    #[test]
    fn test_inverted_count_bounds_rejected() {
        let config =
            LayoutConfig::new().with_pattern("rocks", rocks().with_counts(Some(4), Some(1)));
        assert_eq!(
            config.validate(),
            Err(LayoutConfigError::InvalidCountBounds("rocks".into()))
        );
    }

    #[test]
    fn test_bad_progress_range_rejected() {
        let config = LayoutConfig::new().with_pattern("rocks", rocks()).with_track(
            TrackConfig::Stages(vec![StageConfig::new(
                [0.8, 0.3],
                vec![vec![PatternChoice::new("rocks", 1.0)]],
            )]),
        );
        assert!(matches!(
            config.validate(),
            Err(LayoutConfigError::InvalidProgressRange(_, _))
        ));
    }

    #[test]
    fn test_explicit_progress_out_of_range_rejected() {
        let config = LayoutConfig::new().with_track(TrackConfig::Explicit(vec![
            ExplicitPlacement {
                name: "bridge".into(),
                place: PlaceMode::Path,
                at: 1.5,
                tag: "bridge".into(),
            },
        ]));
        assert_eq!(
            config.validate(),
            Err(LayoutConfigError::InvalidProgress("bridge".into()))
        );
    }

    #[test]
    fn test_nan_density_rejected() {
        let mut p = rocks();
        p.density = [f64::NAN, 1.0];
        let config = LayoutConfig::new().with_pattern("rocks", p);
        assert_eq!(
            config.validate(),
            Err(LayoutConfigError::InvalidDensity("rocks".into()))
        );
    }

    #[test]
    fn test_parse_from_ron() {
        let src = r#"(
            patterns: {
                "rocks": (
                    logic: scatter,
                    place: slalom,
                    density: (1.0, 2.0),
                    tags: ["rock", "boulder"],
                    max_count: Some(6),
                ),
            },
            tracks: [
                Stages([
                    (progress_range: (0.0, 1.0), choices: [[(pattern: "rocks")]]),
                ]),
                Explicit([
                    (name: "dock", place: shore, at: 0.9, tag: "dock"),
                ]),
            ],
            water_entity_tags: ["rock", "boulder"],
        )"#;
        let config: LayoutConfig = ron::from_str(src).unwrap();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.patterns["rocks"].max_count, Some(6));
        assert_eq!(config.tracks.len(), 2);
        assert!(config.is_water_entity(&"boulder".into()));
        let TrackConfig::Stages(stages) = &config.tracks[0] else {
            panic!("first track should be procedural");
        };
        assert_eq!(stages[0].choices[0][0].weight, 1.0, "weight defaults to 1");
    }
}
