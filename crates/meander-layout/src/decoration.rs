//! Bank decorations: spaced scenery beyond either bank of a laid-out biome.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::EntityTag;
use crate::layout::{BoatPathLayout, Side};

/// Candidates tested per accepted point.
const CANDIDATE_ATTEMPTS: u32 = 30;

/// One decoration rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecorationRule {
    pub tag: EntityTag,
    /// Minimum distance between two decorations of this rule on one side.
    pub spacing: f64,
    /// Distance band `[near, far]` beyond the bank.
    pub offset: [f64; 2],
    #[serde(default = "both_sides")]
    pub sides: Vec<DecorationSide>,
}

fn both_sides() -> Vec<DecorationSide> {
    vec![DecorationSide::Left, DecorationSide::Right]
}

/// Serializable mirror of [`Side`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecorationSide {
    Left,
    Right,
}

impl From<DecorationSide> for Side {
    fn from(side: DecorationSide) -> Self {
        match side {
            DecorationSide::Left => Side::Left,
            DecorationSide::Right => Side::Right,
        }
    }
}

impl DecorationRule {
    pub fn new(tag: impl Into<EntityTag>, spacing: f64, offset: [f64; 2]) -> Self {
        Self {
            tag: tag.into(),
            spacing,
            offset,
            sides: both_sides(),
        }
    }
}

/// Decoration rules for one biome type.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecorationConfig {
    pub rules: Vec<DecorationRule>,
}

impl DecorationConfig {
    pub fn new(rules: Vec<DecorationRule>) -> Self {
        Self { rules }
    }
}

/// A placed decoration.
#[derive(Clone, Debug, PartialEq)]
pub struct Decoration {
    pub tag: EntityTag,
    /// Fractional index into the layout's path.
    pub index: f64,
    /// Signed lateral offset from the centerline.
    pub lateral: f64,
}

/// Best-candidate sampling inside an axis-aligned rectangle.
///
/// Each round tests [`CANDIDATE_ATTEMPTS`] random candidates and keeps the one
/// farthest from every accepted point, provided it is at least `min_distance`
/// away. Stops once a round finds no acceptable candidate.
pub fn best_candidate_2d<R: Rng + ?Sized>(
    rng: &mut R,
    region_min: (f64, f64),
    region_max: (f64, f64),
    min_distance: f64,
) -> Vec<(f64, f64)> {
    let mut points: Vec<(f64, f64)> = Vec::new();
    let width = region_max.0 - region_min.0;
    let height = region_max.1 - region_min.1;
    if !(min_distance > 0.0) || !(width > 0.0) || height < 0.0 {
        return points;
    }

    // A zero-height band degenerates to a line of points.
    let area = width * height.max(min_distance);
    let max_points = (area / (min_distance * min_distance * 0.7)) as usize;

    for _ in 0..max_points {
        let mut best_candidate = None;
        let mut best_distance = 0.0f64;

        for _ in 0..CANDIDATE_ATTEMPTS {
            let x = rng.random_range(region_min.0..=region_max.0);
            let y = if height > 0.0 {
                rng.random_range(region_min.1..=region_max.1)
            } else {
                region_min.1
            };

            let nearest = points
                .iter()
                .map(|&(px, py)| ((x - px).powi(2) + (y - py).powi(2)).sqrt())
                .fold(f64::INFINITY, f64::min);

            if nearest >= min_distance && nearest > best_distance {
                best_candidate = Some((x, y));
                best_distance = nearest;
            }
        }

        match best_candidate {
            Some(point) => points.push(point),
            None => break,
        }
    }

    points
}

/// Scatters every rule's decorations along both banks of `layout`.
///
/// Output is ordered by path index.
pub fn scatter_decorations<R: Rng + ?Sized>(
    config: &DecorationConfig,
    layout: &BoatPathLayout,
    rng: &mut R,
) -> Vec<Decoration> {
    let total = layout.total_arc_length();
    let mut out = Vec::new();
    if layout.path.len() < 2 || !(total > 0.0) {
        return out;
    }

    for rule in &config.rules {
        let [near, far] = rule.offset;
        let (near, far) = (near.min(far), near.max(far));
        for &side in &rule.sides {
            let sign = Side::from(side).sign();
            for (arc, offset) in best_candidate_2d(rng, (0.0, near), (total, far), rule.spacing) {
                let index = layout.index_at_arc(arc);
                let bank = layout.frame_at(index).bank_dist;
                out.push(Decoration {
                    tag: rule.tag.clone(),
                    index,
                    lateral: sign * (bank + offset),
                });
            }
        }
    }

    out.sort_by(|a, b| a.index.total_cmp(&b.index));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeometrySample;
    use crate::layout::PathPoint;
    use glam::DVec3;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn layout() -> BoatPathLayout {
        let path = (0..=50)
            .map(|i| PathPoint {
                sample: GeometrySample {
                    position: DVec3::new(0.0, 0.0, i as f64 * 10.0),
                    tangent: DVec3::Z,
                    normal: DVec3::X,
                    bank_dist: 25.0,
                    arc_length: i as f64 * 10.0,
                },
                boat_offset: 0.0,
            })
            .collect();
        BoatPathLayout {
            path,
            sections: Vec::new(),
            crossings: vec![0.0, 1.0],
        }
    }

    #[test]
    fn test_best_candidate_maintains_minimum_distance() {
        let mut rng = ChaCha8Rng::seed_from_u64(123);
        let points = best_candidate_2d(&mut rng, (0.0, 0.0), (200.0, 40.0), 10.0);
        assert!(points.len() > 20, "got {} points", points.len());
        for (i, a) in points.iter().enumerate() {
            for b in &points[i + 1..] {
                let d = ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt();
                assert!(d >= 10.0 - 1e-9, "points too close: {d}");
            }
        }
    }

    #[test]
    fn test_best_candidate_within_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        for (x, y) in best_candidate_2d(&mut rng, (10.0, 20.0), (50.0, 80.0), 3.0) {
            assert!((10.0..=50.0).contains(&x) && (20.0..=80.0).contains(&y));
        }
    }

    #[test]
    fn test_zero_height_band_is_a_line() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let points = best_candidate_2d(&mut rng, (0.0, 4.0), (100.0, 4.0), 10.0);
        assert!(!points.is_empty());
        assert!(points.iter().all(|&(_, y)| y == 4.0));
    }

    #[test]
    fn test_decorations_sit_beyond_the_bank() {
        let config = DecorationConfig::new(vec![DecorationRule::new("pine", 12.0, [3.0, 20.0])]);
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let decorations = scatter_decorations(&config, &layout(), &mut rng);
        assert!(decorations.iter().any(|d| d.lateral > 0.0));
        assert!(decorations.iter().any(|d| d.lateral < 0.0));
        for d in &decorations {
            let beyond = d.lateral.abs() - 25.0;
            assert!((3.0 - 1e-9..=20.0 + 1e-9).contains(&beyond), "offset {beyond}");
        }
        for pair in decorations.windows(2) {
            assert!(pair[0].index <= pair[1].index);
        }
    }

    #[test]
    fn test_single_side_rule() {
        let mut rule = DecorationRule::new("cliff", 15.0, [0.0, 5.0]);
        rule.sides = vec![DecorationSide::Left];
        let config = DecorationConfig::new(vec![rule]);
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let decorations = scatter_decorations(&config, &layout(), &mut rng);
        assert!(!decorations.is_empty());
        assert!(decorations.iter().all(|d| d.lateral < 0.0));
    }

    #[test]
    fn test_empty_layout_has_no_decorations() {
        let config = DecorationConfig::new(vec![DecorationRule::new("pine", 12.0, [3.0, 20.0])]);
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        assert!(scatter_decorations(&config, &BoatPathLayout::empty(), &mut rng).is_empty());
    }
}
