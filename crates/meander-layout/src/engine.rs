//! The path layout engine: samples a biome's centerline, weaves the boat path,
//! and resolves every track into placement blocks.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{LayoutConfig, PlaceMode, TrackConfig};
use crate::geometry::GeometrySampler;
use crate::layout::{BoatPathLayout, LayoutBlock};
use crate::pattern::{apply_pattern, place_entity, random_side, side_opposite_boat};
use crate::stage::{StageInstance, generate_stages};
use crate::weave::{crossings_from_stages, weave_path};

/// Tunables for [`PathLayoutEngine`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutEngineConfig {
    /// Arc-length distance between centerline samples.
    pub sample_step: f64,
    /// Clearance kept between the boat path and the bank.
    pub margin: f64,
}

impl Default for LayoutEngineConfig {
    fn default() -> Self {
        Self {
            sample_step: 10.0,
            margin: 5.0,
        }
    }
}

/// Builds [`BoatPathLayout`]s from a [`LayoutConfig`].
#[derive(Clone, Debug, Default)]
pub struct PathLayoutEngine {
    config: LayoutEngineConfig,
}

/// Stage sequence generated for one track, or `None` for explicit tracks.
type TrackStages = Option<Vec<StageInstance>>;

impl PathLayoutEngine {
    pub fn new(config: LayoutEngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutEngineConfig {
        &self.config
    }

    /// Generates the layout of the biome spanning `[z_min, z_max]`.
    ///
    /// Never fails: too few samples produce an empty layout, and degenerate
    /// tracks, stages or patterns contribute nothing.
    pub fn create_layout<S, R>(
        &self,
        sampler: &S,
        z_min: f64,
        z_max: f64,
        config: &LayoutConfig,
        rng: &mut R,
    ) -> BoatPathLayout
    where
        S: GeometrySampler + ?Sized,
        R: Rng + ?Sized,
    {
        let samples = sampler.sample(z_min, z_max, self.config.sample_step);
        if samples.len() < 2 {
            log::debug!(
                "layout [{z_min:.1}, {z_max:.1}]: {} samples, skipping",
                samples.len()
            );
            return BoatPathLayout::empty();
        }
        let total = samples[samples.len() - 1].arc_length - samples[0].arc_length;

        let tracks: Vec<TrackStages> = config
            .tracks
            .iter()
            .map(|track| match track {
                TrackConfig::Stages(stages) => {
                    Some(generate_stages(stages, &config.patterns, total, rng))
                }
                TrackConfig::Explicit(_) => None,
            })
            .collect();

        let weave_stages = tracks.iter().flatten().next().map_or(&[][..], Vec::as_slice);
        let crossings = crossings_from_stages(weave_stages);

        let mut layout = BoatPathLayout {
            path: weave_path(samples, &crossings, self.config.margin),
            sections: Vec::new(),
            crossings,
        };

        let mut sections = partition_blocks(&layout);
        fill_sections(&mut sections, &layout, config, &tracks, rng);
        place_explicit(&mut sections, &layout, config, rng);
        for block in &mut sections {
            block.sort_placements();
        }
        layout.sections = sections;

        log::debug!(
            "layout [{z_min:.1}, {z_max:.1}]: {} points, {} blocks, {} placements",
            layout.path.len(),
            layout.sections.len(),
            layout.placement_count()
        );
        layout
    }
}

/// One block per pair of consecutive crossings. Crossings that round to the
/// same sample index produce no block, so blocks still tile the path.
fn partition_blocks(layout: &BoatPathLayout) -> Vec<LayoutBlock> {
    let last = layout.path.len().saturating_sub(1);
    let n = layout.crossings.len();
    let indices: Vec<usize> = layout
        .crossings
        .iter()
        .enumerate()
        .map(|(k, &c)| match k {
            0 => 0,
            k if k + 1 == n => last,
            _ => (layout.index_at_progress(c).round() as usize).min(last),
        })
        .collect();

    indices
        .windows(2)
        .filter(|w| w[1] > w[0])
        .map(|w| LayoutBlock::new(w[0], w[1]))
        .collect()
}

/// A stage's span in whole sample indices, rounded the way block edges are, so
/// the stages of the weaving track coincide with their blocks.
fn stage_span(layout: &BoatPathLayout, stage: &StageInstance) -> Option<(f64, f64)> {
    let last = layout.path.len().saturating_sub(1) as f64;
    let lo = layout.index_at_progress(stage.start).round().min(last);
    let hi = layout.index_at_progress(stage.end).round().min(last);
    (hi > lo).then_some((lo, hi))
}

/// First block ending at or past `index` and past `stage_lo`: a placement on a
/// shared edge stays with the block its stage starts in.
fn owning_block(sections: &[LayoutBlock], index: f64, stage_lo: f64) -> usize {
    sections
        .partition_point(|block| {
            let end = block.i_end as f64;
            end < index || end <= stage_lo
        })
        .min(sections.len() - 1)
}

/// Applies each procedural stage once over its whole span, then hands every
/// placement to the block that owns its index.
fn fill_sections<R: Rng + ?Sized>(
    sections: &mut [LayoutBlock],
    layout: &BoatPathLayout,
    config: &LayoutConfig,
    tracks: &[TrackStages],
    rng: &mut R,
) {
    if sections.is_empty() {
        return;
    }
    for stages in tracks.iter().flatten() {
        for stage in stages {
            let Some((lo, hi)) = stage_span(layout, stage) else {
                continue;
            };
            let mut scratch = LayoutBlock::new(lo as usize, hi as usize);
            for name in &stage.patterns {
                if let Some(pattern) = config.patterns.get(name) {
                    apply_pattern(pattern, layout, config, lo, hi, &mut scratch, rng);
                }
            }
            for (tag, placements) in scratch.placements {
                for placement in placements {
                    let b = owning_block(sections, placement.index, lo);
                    sections[b].push(tag.clone(), placement);
                }
            }
        }
    }
}

/// Places each explicit entry exactly once, in the block containing its index.
fn place_explicit<R: Rng + ?Sized>(
    sections: &mut [LayoutBlock],
    layout: &BoatPathLayout,
    config: &LayoutConfig,
    rng: &mut R,
) {
    if sections.is_empty() {
        return;
    }
    for track in &config.tracks {
        let TrackConfig::Explicit(placements) = track else {
            continue;
        };
        for explicit in placements {
            let index = layout.index_at_progress(explicit.at);
            let b = sections
                .partition_point(|block| (block.i_end as f64) <= index)
                .min(sections.len() - 1);
            let side = match explicit.place {
                PlaceMode::Path => random_side(rng),
                _ => side_opposite_boat(layout.frame_at(index).boat_offset, rng),
            };
            let placement = place_entity(
                explicit.place,
                layout,
                config,
                index,
                side,
                &explicit.tag,
                None,
            );
            sections[b].push(explicit.tag.clone(), placement);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        EntityTag, ExplicitPlacement, PatternChoice, PatternConfig, PatternLogic, StageConfig,
    };
    use crate::geometry::{MeanderParams, MeanderSampler};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn sampler() -> MeanderSampler {
        MeanderSampler::new(MeanderParams::default())
    }

    fn config() -> LayoutConfig {
        LayoutConfig::new()
            .with_pattern(
                "rocks",
                PatternConfig::new(
                    PatternLogic::Scatter,
                    PlaceMode::Slalom,
                    [1.0, 4.0],
                    [EntityTag::from("rock"), EntityTag::from("boulder")],
                )
                .with_counts(Some(2), None),
            )
            .with_pattern(
                "gates",
                PatternConfig::new(
                    PatternLogic::Gate,
                    PlaceMode::Slalom,
                    [0.5, 1.0],
                    [EntityTag::from("buoy")],
                ),
            )
            .with_pattern(
                "reeds",
                PatternConfig::new(
                    PatternLogic::Sequence,
                    PlaceMode::Shore,
                    [2.0, 2.0],
                    [EntityTag::from("reed")],
                ),
            )
            .with_track(TrackConfig::Stages(vec![StageConfig::new(
                [0.0, 1.0],
                vec![vec![
                    PatternChoice::new("rocks", 2.0),
                    PatternChoice::new("gates", 1.0),
                ]],
            )]))
            .with_track(TrackConfig::Stages(vec![StageConfig::new(
                [0.0, 1.0],
                vec![vec![PatternChoice::new("reeds", 1.0)]],
            )]))
            .with_track(TrackConfig::Explicit(vec![ExplicitPlacement {
                name: "dock".into(),
                place: PlaceMode::Shore,
                at: 0.5,
                tag: EntityTag::from("dock"),
            }]))
            .with_water_tags([EntityTag::from("rock"), EntityTag::from("boulder")])
    }

    fn build(seed: u64, z_min: f64, z_max: f64) -> BoatPathLayout {
        let engine = PathLayoutEngine::default();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        engine.create_layout(&sampler(), z_min, z_max, &config(), &mut rng)
    }

    #[test]
    fn test_blocks_tile_the_path() {
        let layout = build(1, 0.0, 2000.0);
        assert!(!layout.sections.is_empty());
        assert_eq!(layout.sections[0].i_start, 0);
        assert_eq!(
            layout.sections.last().unwrap().i_end,
            layout.path.len() - 1
        );
        for pair in layout.sections.windows(2) {
            assert_eq!(pair[0].i_end, pair[1].i_start, "blocks must be contiguous");
        }
    }

    #[test]
    fn test_boat_offset_within_margin() {
        let layout = build(2, -1500.0, 0.0);
        for p in &layout.path {
            assert!(
                p.boat_offset.abs() <= p.sample.bank_dist - 5.0 + 1e-9,
                "offset {} exceeds bank {}",
                p.boat_offset,
                p.sample.bank_dist
            );
        }
    }

    #[test]
    fn test_boat_weaves_to_both_sides() {
        let layout = build(3, 0.0, 3000.0);
        assert!(layout.crossings.len() > 3);
        assert!(layout.path.iter().any(|p| p.boat_offset > 1.0));
        assert!(layout.path.iter().any(|p| p.boat_offset < -1.0));
    }

    #[test]
    fn test_placements_inside_their_block() {
        let layout = build(4, 0.0, 2500.0);
        assert!(layout.placement_count() > 0);
        for block in &layout.sections {
            for list in block.placements.values() {
                for p in list {
                    assert!(
                        p.index >= block.i_start as f64 && p.index <= block.i_end as f64,
                        "placement {} outside block [{}, {}]",
                        p.index,
                        block.i_start,
                        block.i_end
                    );
                    assert!(p.range[0] <= p.range[1]);
                }
            }
        }
    }

    #[test]
    fn test_explicit_placement_appears_once() {
        let layout = build(5, 0.0, 2000.0);
        let docks: usize = layout
            .sections
            .iter()
            .filter_map(|b| b.placements.get(&EntityTag::from("dock")))
            .map(Vec::len)
            .sum();
        assert_eq!(docks, 1);
    }

    #[test]
    fn test_land_shore_placements_pushed_past_bank() {
        let layout = build(6, 0.0, 2000.0);
        for block in &layout.sections {
            if let Some(reeds) = block.placements.get(&EntityTag::from("reed")) {
                for p in reeds {
                    let bank = layout.frame_at(p.index).bank_dist;
                    assert!(p.range[0].abs().min(p.range[1].abs()) >= bank);
                }
            }
        }
    }

    #[test]
    fn test_same_seed_same_layout() {
        assert_eq!(build(7, 0.0, 1800.0), build(7, 0.0, 1800.0));
        assert_ne!(build(7, 0.0, 1800.0), build(8, 0.0, 1800.0));
    }

    #[test]
    fn test_placements_sorted_by_index() {
        let layout = build(9, 0.0, 2000.0);
        for block in &layout.sections {
            for list in block.placements.values() {
                for pair in list.windows(2) {
                    assert!(pair[0].index <= pair[1].index);
                }
            }
        }
    }

    #[test]
    fn test_too_short_range_is_empty() {
        let layout = build(1, 10.0, 10.0);
        assert!(layout.is_empty());
        assert!(layout.sections.is_empty());
    }

    fn counted_pattern(density: f64, min: u32, max: u32, tag: &str) -> PatternConfig {
        PatternConfig::new(
            PatternLogic::Sequence,
            PlaceMode::Slalom,
            [density, density],
            [EntityTag::from(tag)],
        )
        .with_counts(Some(min), Some(max))
    }

    fn single_stage_track(pattern: &str) -> TrackConfig {
        TrackConfig::Stages(vec![StageConfig::new(
            [0.0, 1.0],
            vec![vec![PatternChoice::new(pattern, 1.0)]],
        )])
    }

    #[test]
    fn test_stage_counts_bounded_within_each_block() {
        let config = LayoutConfig::new()
            .with_pattern("a", counted_pattern(0.5, 2, 4, "a"))
            .with_track(single_stage_track("a"));
        let engine = PathLayoutEngine::default();
        for seed in 0..30 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let layout = engine.create_layout(&sampler(), 0.0, 4000.0, &config, &mut rng);
            assert!(layout.sections.len() > 2, "seed {seed}");
            for block in &layout.sections {
                let list = block.placements.get(&EntityTag::from("a"));
                let indices: Vec<f64> = list.into_iter().flatten().map(|p| p.index).collect();
                assert!(
                    (2..=4).contains(&indices.len()),
                    "seed {seed} block [{}, {}]: {indices:?}",
                    block.i_start,
                    block.i_end
                );
                for pair in indices.windows(2) {
                    assert!(
                        pair[1] - pair[0] >= 1.0,
                        "seed {seed}: stacked placements {indices:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_secondary_track_counted_per_stage_not_per_block() {
        // Stages of 1000..2000 units on the second track, one placement each.
        let config = LayoutConfig::new()
            .with_pattern("a", counted_pattern(0.5, 2, 4, "a"))
            .with_pattern("b", counted_pattern(0.1, 1, 1, "b"))
            .with_track(single_stage_track("a"))
            .with_track(single_stage_track("b"));
        let engine = PathLayoutEngine::default();
        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let layout = engine.create_layout(&sampler(), 0.0, 4000.0, &config, &mut rng);
            let b: usize = layout
                .sections
                .iter()
                .filter_map(|block| block.placements.get(&EntityTag::from("b")))
                .map(Vec::len)
                .sum();
            let total = layout.total_arc_length();
            let (fewest, most) = ((total / 2000.0).ceil(), (total / 1000.0).ceil());
            assert!(
                (fewest..=most).contains(&(b as f64)),
                "seed {seed}: {b} placements of b over {total:.0} units"
            );
        }
    }

    #[test]
    fn test_config_without_tracks_has_one_block() {
        let engine = PathLayoutEngine::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let layout =
            engine.create_layout(&sampler(), 0.0, 500.0, &LayoutConfig::new(), &mut rng);
        assert_eq!(layout.crossings, vec![0.0, 1.0]);
        assert_eq!(layout.sections.len(), 1);
        assert_eq!(layout.placement_count(), 0);
    }
}
