//! Pattern application: turns one pattern over a path-index span into
//! placements.

use rand::Rng;

use crate::config::{EntityTag, LayoutConfig, PatternConfig, PatternLogic, PlaceMode};
use crate::layout::{BoatPathLayout, LayoutBlock, Placement, Side};

/// Half width of the lateral window for `place = path`.
pub const PATH_HALF_WIDTH: f64 = 2.0;
/// Gap between the boat path and the inner edge of a slalom range.
pub const SLALOM_PATH_GAP: f64 = 3.0;
/// Distance kept from the bank by slalom placements.
pub const BANK_CLEARANCE: f64 = 1.5;
/// How far past the bank water-dwelling shore placements may reach.
pub const SHORE_OVERHANG: f64 = 6.0;
/// Land shore placements start this far beyond the bank...
pub const LAND_SETBACK: f64 = 2.0;
/// ...and may reach this far beyond it.
pub const LAND_REACH: f64 = 14.0;
/// Half extent, in distance units, of a cluster around its center.
pub const CLUSTER_SPREAD: f64 = 12.0;

/// Expected instance count for a span of `length` distance units.
pub fn expected_count(length: f64, density: f64) -> f64 {
    (length / 100.0 * density).max(0.0)
}

/// Rounds an expected count stochastically, then applies the pattern's bounds.
///
/// `floor(expected)` plus one more with probability `fract(expected)`.
pub fn resolve_count<R: Rng + ?Sized>(
    expected: f64,
    pattern: &PatternConfig,
    rng: &mut R,
) -> u32 {
    let base = expected.floor();
    let extra = if rng.random::<f64>() < expected - base {
        1
    } else {
        0
    };
    pattern.clamp_count(base as u32 + extra)
}

/// Lateral offset range for a placement.
///
/// `slalom` runs from just past the boat path to just short of the bank on
/// `side`. `shore` runs from mid-bank to past the bank, or lies wholly on land
/// for entities that are not water-dwelling. `path` hugs the boat path.
pub fn lateral_range(
    place: PlaceMode,
    side: Side,
    boat_offset: f64,
    bank_dist: f64,
    is_water: bool,
) -> [f64; 2] {
    let s = side.sign();
    let (a, b) = match place {
        PlaceMode::Path => (boat_offset - PATH_HALF_WIDTH, boat_offset + PATH_HALF_WIDTH),
        PlaceMode::Slalom => (
            boat_offset + s * SLALOM_PATH_GAP,
            s * (bank_dist - BANK_CLEARANCE),
        ),
        PlaceMode::Shore if is_water => (s * bank_dist * 0.5, s * (bank_dist + SHORE_OVERHANG)),
        PlaceMode::Shore => (s * (bank_dist + LAND_SETBACK), s * (bank_dist + LAND_REACH)),
    };
    [a.min(b), a.max(b)]
}

/// Side opposite the boat, or a random side when the boat is centered.
pub fn side_opposite_boat<R: Rng + ?Sized>(boat_offset: f64, rng: &mut R) -> Side {
    match Side::of_offset(boat_offset) {
        Some(side) => side.opposite(),
        None => random_side(rng),
    }
}

pub fn random_side<R: Rng + ?Sized>(rng: &mut R) -> Side {
    if rng.random_bool(0.5) {
        Side::Left
    } else {
        Side::Right
    }
}

/// Applies `pattern` over fractional path indices `[lo, hi]` and merges the
/// results into `block`.
pub fn apply_pattern<R: Rng + ?Sized>(
    pattern: &PatternConfig,
    layout: &BoatPathLayout,
    config: &LayoutConfig,
    lo: f64,
    hi: f64,
    block: &mut LayoutBlock,
    rng: &mut R,
) {
    if pattern.tags.is_empty() || !(hi > lo) {
        return;
    }

    let length = layout.frame_at(hi).arc_length - layout.frame_at(lo).arc_length;
    let mid_progress = layout.progress_at_index((lo + hi) * 0.5);
    let expected = expected_count(length, pattern.density_at(mid_progress));
    let count = resolve_count(expected, pattern, rng);
    if count == 0 {
        return;
    }

    let span = hi - lo;
    let even = |j: u32| lo + (j as f64 + 0.5) * span / count as f64;

    match pattern.logic {
        PatternLogic::Scatter => {
            for _ in 0..count {
                let index = rng.random_range(lo..=hi);
                let side = default_side(pattern.place, layout, index, rng);
                emit(pattern, layout, config, index, side, block, rng);
            }
        }
        PatternLogic::Sequence => {
            for j in 0..count {
                let index = even(j);
                let side = default_side(pattern.place, layout, index, rng);
                emit(pattern, layout, config, index, side, block, rng);
            }
        }
        PatternLogic::Staggered => {
            let first = random_side(rng);
            for j in 0..count {
                let index = even(j);
                let side = if pattern.place == PlaceMode::Path {
                    random_side(rng)
                } else if j % 2 == 0 {
                    first
                } else {
                    first.opposite()
                };
                emit(pattern, layout, config, index, side, block, rng);
            }
        }
        PatternLogic::Gate => {
            for j in 0..count {
                let index = even(j);
                emit(pattern, layout, config, index, Side::Left, block, rng);
                emit(pattern, layout, config, index, Side::Right, block, rng);
            }
        }
        PatternLogic::Cluster => {
            let center = rng.random_range(lo..=hi);
            let step = layout.total_arc_length() / (layout.path.len().max(2) - 1) as f64;
            let spread = if step > 0.0 {
                (CLUSTER_SPREAD / step).min(span * 0.5)
            } else {
                0.0
            };
            for _ in 0..count {
                let jitter = if spread > 0.0 {
                    rng.random_range(-spread..=spread)
                } else {
                    0.0
                };
                let index = (center + jitter).clamp(lo, hi);
                let side = default_side(pattern.place, layout, index, rng);
                emit(pattern, layout, config, index, side, block, rng);
            }
        }
    }
}

fn default_side<R: Rng + ?Sized>(
    place: PlaceMode,
    layout: &BoatPathLayout,
    index: f64,
    rng: &mut R,
) -> Side {
    match place {
        PlaceMode::Path => random_side(rng),
        _ => side_opposite_boat(layout.frame_at(index).boat_offset, rng),
    }
}

fn emit<R: Rng + ?Sized>(
    pattern: &PatternConfig,
    layout: &BoatPathLayout,
    config: &LayoutConfig,
    index: f64,
    side: Side,
    block: &mut LayoutBlock,
    rng: &mut R,
) {
    let tag = pattern.tags[rng.random_range(0..pattern.tags.len())].clone();
    let placement = place_entity(
        pattern.place,
        layout,
        config,
        index,
        side,
        &tag,
        pattern.aggressiveness_at(layout.progress_at_index(index)),
    );
    block.push(tag, placement);
}

/// Builds a single placement at `index` on `side`.
pub fn place_entity(
    place: PlaceMode,
    layout: &BoatPathLayout,
    config: &LayoutConfig,
    index: f64,
    side: Side,
    tag: &EntityTag,
    aggressiveness: Option<f64>,
) -> Placement {
    let frame = layout.frame_at(index);
    Placement {
        index,
        range: lateral_range(
            place,
            side,
            frame.boat_offset,
            frame.bank_dist,
            config.is_water_entity(tag),
        ),
        side,
        aggressiveness,
    }
}
