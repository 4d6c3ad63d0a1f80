//! Stage sequencing: fills a track's biome progress with stage instances.

use hashbrown::HashMap;
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;

use crate::config::{PatternChoice, PatternConfig, StageConfig};

/// Hard cap on stages per track, guarding against pathologically short draws.
const MAX_STAGES_PER_TRACK: usize = 4096;

/// One instantiated stage: a progress interval and the patterns drawn for it.
#[derive(Clone, Debug, PartialEq)]
pub struct StageInstance {
    /// Biome progress at which the stage begins.
    pub start: f64,
    /// Biome progress at which the stage ends.
    pub end: f64,
    /// Index of the originating [`StageConfig`] within its track.
    pub stage: usize,
    /// One pattern name per choice set that yielded a pattern.
    pub patterns: Vec<String>,
}

impl StageInstance {
    /// Whether the stage overlaps the progress interval `(lo, hi)`.
    pub fn overlaps(&self, lo: f64, hi: f64) -> bool {
        self.start < hi && self.end > lo
    }
}

/// Draws one choice from a weighted set. Returns `None` for empty sets or sets
/// whose weights are all zero or invalid.
pub fn draw_choice<'a, R: Rng + ?Sized>(
    choices: &'a [PatternChoice],
    rng: &mut R,
) -> Option<&'a PatternChoice> {
    let dist = WeightedIndex::new(choices.iter().map(|c| c.weight)).ok()?;
    choices.get(dist.sample(rng))
}

/// Generates the stage sequence for one procedural track.
///
/// Starting at progress 0, repeatedly picks an eligible stage uniformly, draws
/// a pattern from each of its choice sets, and sizes the stage so every drawn
/// pattern can reach its minimum count. Stops when progress reaches 1 or no
/// stage is eligible. The boundaries are then rescaled by one common factor so
/// that the last stage ends exactly on its configured upper bound.
pub fn generate_stages<R: Rng + ?Sized>(
    stages: &[StageConfig],
    patterns: &HashMap<String, PatternConfig>,
    total_arc_length: f64,
    rng: &mut R,
) -> Vec<StageInstance> {
    let mut out: Vec<StageInstance> = Vec::new();
    if stages.is_empty() || !(total_arc_length > 0.0) {
        return out;
    }

    let mut cursor = 0.0;
    while cursor < 1.0 && out.len() < MAX_STAGES_PER_TRACK {
        let eligible: Vec<usize> = stages
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_eligible(cursor))
            .map(|(i, _)| i)
            .collect();
        if eligible.is_empty() {
            break;
        }
        let stage_index = eligible[rng.random_range(0..eligible.len())];
        let stage = &stages[stage_index];

        let drawn: Vec<String> = stage
            .choices
            .iter()
            .filter_map(|set| draw_choice(set, rng))
            .map(|choice| choice.pattern.clone())
            .collect();

        let length = stage_length(stage, &drawn, patterns, cursor, total_arc_length, rng);
        let advance = length / total_arc_length;
        if !(advance > 0.0) {
            break;
        }

        out.push(StageInstance {
            start: cursor,
            end: cursor + advance,
            stage: stage_index,
            patterns: drawn,
        });
        cursor += advance;
    }

    if let Some(last) = out.last() {
        let target = stages[last.stage].progress_range[1];
        let factor = target / last.end;
        if factor.is_finite() && factor > 0.0 {
            for stage in &mut out {
                stage.start *= factor;
                stage.end *= factor;
            }
        }
    }

    out
}

/// Chooses the length, in distance units, of a stage starting at `cursor`.
///
/// Each drawn pattern needs `min_count / (density / 100)` units to fit its
/// minimum count. The length is uniform in `[max, max(2 * min, max)]` over
/// those needs. Without any sized pattern the stage runs to the end of its
/// progress window.
fn stage_length<R: Rng + ?Sized>(
    stage: &StageConfig,
    drawn: &[String],
    patterns: &HashMap<String, PatternConfig>,
    cursor: f64,
    total_arc_length: f64,
    rng: &mut R,
) -> f64 {
    let needs: Vec<f64> = drawn
        .iter()
        .filter_map(|name| patterns.get(name))
        .filter_map(|pattern| {
            let density = pattern.density_at(cursor);
            (density > 0.0).then(|| {
                let min_count = pattern.min_count.unwrap_or(1).max(1) as f64;
                min_count / (density / 100.0)
            })
        })
        .collect();

    if needs.is_empty() {
        return (stage.progress_range[1] - cursor).max(0.0) * total_arc_length;
    }

    let lo = needs.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = needs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let upper = (2.0 * lo).max(hi);
    if upper > hi {
        rng.random_range(hi..=upper)
    } else {
        hi
    }
}
