//! Layout output types: the woven boat path and its placement blocks.

use std::collections::BTreeMap;

use glam::DVec3;

use crate::config::EntityTag;
use crate::geometry::GeometrySample;

/// Which side of the river, looking along the direction of travel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// Negative lateral offsets.
    Left,
    /// Positive lateral offsets.
    Right,
}

impl Side {
    /// `-1.0` for [`Side::Left`], `1.0` for [`Side::Right`].
    pub fn sign(self) -> f64 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// The side a lateral offset lies on, or `None` on the centerline.
    pub fn of_offset(offset: f64) -> Option<Self> {
        if offset > 0.0 {
            Some(Side::Right)
        } else if offset < 0.0 {
            Some(Side::Left)
        } else {
            None
        }
    }
}

/// A centerline sample augmented with the woven boat path offset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathPoint {
    pub sample: GeometrySample,
    /// Signed lateral offset of the boat path from the centerline.
    pub boat_offset: f64,
}

/// A resolved slot for one entity.
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    /// Fractional index into [`BoatPathLayout::path`].
    pub index: f64,
    /// Lateral offset range `[lo, hi]` the entity may occupy.
    pub range: [f64; 2],
    pub side: Side,
    pub aggressiveness: Option<f64>,
}

/// A contiguous run of path indices and the placements that fall inside it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutBlock {
    pub i_start: usize,
    pub i_end: usize,
    pub placements: BTreeMap<EntityTag, Vec<Placement>>,
}

impl LayoutBlock {
    /// Creates an empty block spanning `[i_start, i_end]`.
    pub fn new(i_start: usize, i_end: usize) -> Self {
        Self {
            i_start,
            i_end,
            placements: BTreeMap::new(),
        }
    }

    /// Adds a placement under `tag`.
    pub fn push(&mut self, tag: EntityTag, placement: Placement) {
        self.placements.entry(tag).or_default().push(placement);
    }

    /// Total number of placements across all tags.
    pub fn placement_count(&self) -> usize {
        self.placements.values().map(Vec::len).sum()
    }

    /// Orders each tag's placements by path index.
    pub(crate) fn sort_placements(&mut self) {
        for list in self.placements.values_mut() {
            list.sort_by(|a, b| a.index.total_cmp(&b.index));
        }
    }
}

/// Interpolated path state at a fractional index.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathFrame {
    pub position: DVec3,
    pub tangent: DVec3,
    pub normal: DVec3,
    pub bank_dist: f64,
    pub boat_offset: f64,
    pub arc_length: f64,
}

/// The generated layout of one biome instance.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoatPathLayout {
    pub path: Vec<PathPoint>,
    pub sections: Vec<LayoutBlock>,
    /// Weave crossing points as biome progress fractions, starting at 0 and
    /// ending at 1.
    pub crossings: Vec<f64>,
}

impl BoatPathLayout {
    /// A layout with no path and no sections.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// Arc length from the first to the last path point.
    pub fn total_arc_length(&self) -> f64 {
        match (self.path.first(), self.path.last()) {
            (Some(first), Some(last)) => last.sample.arc_length - first.sample.arc_length,
            _ => 0.0,
        }
    }

    /// Total number of placements across all sections.
    pub fn placement_count(&self) -> usize {
        self.sections.iter().map(LayoutBlock::placement_count).sum()
    }

    /// Fractional path index at arc length `arc` (relative to the first point).
    pub fn index_at_arc(&self, arc: f64) -> f64 {
        let Some(first) = self.path.first() else {
            return 0.0;
        };
        let target = first.sample.arc_length + arc;
        let i = self.path.partition_point(|p| p.sample.arc_length < target);
        if i == 0 {
            return 0.0;
        }
        if i >= self.path.len() {
            return (self.path.len() - 1) as f64;
        }
        let a = self.path[i - 1].sample.arc_length;
        let b = self.path[i].sample.arc_length;
        let t = if b > a { (target - a) / (b - a) } else { 0.0 };
        (i - 1) as f64 + t
    }

    /// Fractional path index at biome progress `progress`.
    pub fn index_at_progress(&self, progress: f64) -> f64 {
        self.index_at_arc(progress.clamp(0.0, 1.0) * self.total_arc_length())
    }

    /// Biome progress at a fractional path index.
    pub fn progress_at_index(&self, index: f64) -> f64 {
        let total = self.total_arc_length();
        if total <= 0.0 {
            return 0.0;
        }
        ((self.frame_at(index).arc_length - self.path[0].sample.arc_length) / total)
            .clamp(0.0, 1.0)
    }

    /// Path state linearly interpolated at a fractional index.
    ///
    /// Indices outside the path clamp to its ends. An empty layout yields a
    /// zeroed frame.
    pub fn frame_at(&self, index: f64) -> PathFrame {
        let Some(last) = self.path.len().checked_sub(1) else {
            return PathFrame {
                position: DVec3::ZERO,
                tangent: DVec3::Z,
                normal: DVec3::X,
                bank_dist: 0.0,
                boat_offset: 0.0,
                arc_length: 0.0,
            };
        };
        let index = index.clamp(0.0, last as f64);
        let i0 = (index.floor() as usize).min(last);
        let i1 = (i0 + 1).min(last);
        let t = index - i0 as f64;
        let (a, b) = (&self.path[i0], &self.path[i1]);
        let lerp = |x: f64, y: f64| x + (y - x) * t;

        PathFrame {
            position: a.sample.position.lerp(b.sample.position, t),
            tangent: a
                .sample
                .tangent
                .lerp(b.sample.tangent, t)
                .try_normalize()
                .unwrap_or(DVec3::Z),
            normal: a
                .sample
                .normal
                .lerp(b.sample.normal, t)
                .try_normalize()
                .unwrap_or(DVec3::X),
            bank_dist: lerp(a.sample.bank_dist, b.sample.bank_dist),
            boat_offset: lerp(a.boat_offset, b.boat_offset),
            arc_length: lerp(a.sample.arc_length, b.sample.arc_length),
        }
    }
}
