//! The active biome window: a contiguous run of instances around a moving
//! centre, grown and pruned with hysteresis, with point and range queries and
//! cross-fades across instance boundaries.

use std::collections::VecDeque;
use std::sync::Arc;

use glam::{DVec3, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::deck::BiomeDeck;
use crate::features::{BiomeFeatures, SkyGradient};
use crate::instance::{BiomeInstance, InstanceKey};
use crate::registry::{BiomeId, BiomeRegistry, BiomeRegistryError};
use crate::seed::{Direction, instance_rng};

/// Nudge applied past a segment cursor before looking up its owner.
const SEGMENT_PROBE_EPS: f64 = 1e-4;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiomeWindowConfig {
    /// Half-width guaranteed to be covered around the centre.
    pub window_radius: f64,
    /// Half-width beyond which edge instances may be pruned.
    pub prune_radius: f64,
    /// Width of the cross-fade centred on every boundary.
    pub transition_width: f64,
}

impl Default for BiomeWindowConfig {
    fn default() -> Self {
        Self {
            window_radius: 2000.0,
            prune_radius: 2500.0,
            transition_width: 50.0,
        }
    }
}

/// Bounds of one instance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiomeBounds {
    pub z_min: f64,
    pub z_max: f64,
}

/// One piece of a [`BiomeWindow::feature_segments`] walk.
#[derive(Clone, Debug)]
pub struct FeatureSegment {
    pub instance: Arc<BiomeInstance>,
    /// Where the segment starts, in walk order.
    pub z_start: f64,
    /// Where the segment ends, in walk order.
    pub z_end: f64,
    pub biome_z_min: f64,
    pub biome_z_max: f64,
}

impl FeatureSegment {
    pub fn features(&self) -> &Arc<BiomeFeatures> {
        self.instance.features()
    }
}

/// Cross-fade weights at one coordinate.
#[derive(Clone, Debug)]
pub struct BlendWeights {
    /// The instance owning the coordinate.
    pub primary: Arc<BiomeInstance>,
    /// The neighbour across the nearer boundary, when inside a transition.
    pub secondary: Option<Arc<BiomeInstance>>,
    pub w1: f64,
    pub w2: f64,
}

/// What one [`BiomeWindow::ensure_window`] call changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WindowChange {
    pub added: usize,
    pub pruned: usize,
}

impl WindowChange {
    pub fn is_empty(&self) -> bool {
        self.added == 0 && self.pruned == 0
    }
}

/// The set of active biome instances, ordered by `z_min` with no gaps.
///
/// Instance `(direction, ordinal)` always has the same type and length for a
/// given world seed, so an instance pruned and later regrown is identical.
pub struct BiomeWindow {
    config: BiomeWindowConfig,
    registry: BiomeRegistry,
    world_seed: u64,
    positive: BiomeDeck,
    negative: BiomeDeck,
    instances: VecDeque<Arc<BiomeInstance>>,
}

impl BiomeWindow {
    /// Builds a window and materializes it around `z = 0`.
    ///
    /// The positive sequence grows first from `z = 0`, then the negative one
    /// ending at `z = 0`. Both start with `filler`.
    ///
    /// # Errors
    ///
    /// Returns [`BiomeRegistryError::Empty`] for an empty registry and
    /// [`BiomeRegistryError::UnknownFiller`] if `filler` is not registered.
    pub fn new(
        registry: BiomeRegistry,
        filler: BiomeId,
        world_seed: u64,
        config: BiomeWindowConfig,
    ) -> Result<Self, BiomeRegistryError> {
        if registry.is_empty() {
            return Err(BiomeRegistryError::Empty);
        }
        if registry.try_get(filler).is_none() {
            return Err(BiomeRegistryError::UnknownFiller(filler));
        }
        let deck = |direction| BiomeDeck::new(filler, registry.ids(), world_seed, direction);
        let positive = deck(Direction::Positive);
        let negative = deck(Direction::Negative);

        let mut window = Self {
            config,
            registry,
            world_seed,
            positive,
            negative,
            instances: VecDeque::new(),
        };
        let radius = window.config.window_radius;
        window.ensure_window(0.0, radius);
        Ok(window)
    }

    pub fn config(&self) -> &BiomeWindowConfig {
        &self.config
    }

    pub fn registry(&self) -> &BiomeRegistry {
        &self.registry
    }

    pub fn world_seed(&self) -> u64 {
        self.world_seed
    }

    /// Active instances in ascending `z` order.
    pub fn instances(&self) -> impl ExactSizeIterator<Item = &Arc<BiomeInstance>> + '_ {
        self.instances.iter()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Always `false` once constructed.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Lowest and highest materialized coordinates.
    pub fn extent(&self) -> Option<BiomeBounds> {
        Some(BiomeBounds {
            z_min: self.instances.front()?.z_min(),
            z_max: self.instances.back()?.z_max(),
        })
    }

    /// Guarantees `[center - radius, center + radius]` is covered by the
    /// second instance from each end, then prunes edge instances whose
    /// third-from-end neighbour lies wholly beyond the prune distance.
    ///
    /// The prune distance is `radius` plus the configured gap between prune
    /// and window radius. Idempotent for an unchanged centre.
    pub fn ensure_window(&mut self, center: f64, radius: f64) -> WindowChange {
        let mut change = WindowChange::default();
        if !center.is_finite() || !radius.is_finite() {
            log::warn!("ensure_window({center}, {radius}) ignored: non-finite input");
            return change;
        }
        let radius = radius.max(0.0);
        let hi = center + radius;
        let lo = center - radius;

        while self.instances.len() < 2 || self.instances[self.instances.len() - 2].z_max() < hi {
            let next = self.grow(Direction::Positive);
            self.instances.push_back(next);
            change.added += 1;
        }
        while self.instances[1].z_min() > lo {
            let next = self.grow(Direction::Negative);
            self.instances.push_front(next);
            change.added += 1;
        }

        let prune = radius + (self.config.prune_radius - self.config.window_radius).max(0.0);
        while self.instances.len() > 3
            && self.instances[self.instances.len() - 3].z_min() > center + prune
        {
            self.instances.pop_back();
            change.pruned += 1;
        }
        while self.instances.len() > 3 && self.instances[2].z_max() < center - prune {
            self.instances.pop_front();
            change.pruned += 1;
        }

        if !change.is_empty() {
            log::debug!(
                "biome window at {center:.1}: +{} -{} -> {} instances [{:.1}, {:.1}]",
                change.added,
                change.pruned,
                self.instances.len(),
                self.instances.front().map_or(0.0, |i| i.z_min()),
                self.instances.back().map_or(0.0, |i| i.z_max()),
            );
        }
        change
    }

    /// Materializes the instance abutting the current end in `toward`.
    fn grow(&self, toward: Direction) -> Arc<BiomeInstance> {
        let (key, boundary) = match toward {
            Direction::Positive => match self.instances.back() {
                Some(last) => (last.key().neighbor(toward), last.z_max()),
                None => (InstanceKey::new(Direction::Positive, 0), 0.0),
            },
            Direction::Negative => match self.instances.front() {
                Some(first) => (first.key().neighbor(toward), first.z_min()),
                None => (InstanceKey::new(Direction::Negative, 0), 0.0),
            },
        };

        let deck = match key.direction {
            Direction::Positive => &self.positive,
            Direction::Negative => &self.negative,
        };
        let biome = deck.draw(key.ordinal);
        let features = Arc::clone(self.registry.get(biome));
        let mut rng = instance_rng(self.world_seed, key.direction, key.ordinal);
        let length = features.draw_length(&mut rng);

        let (z_min, z_max) = match toward {
            Direction::Positive => (boundary, boundary + length),
            Direction::Negative => (boundary - length, boundary),
        };
        Arc::new(BiomeInstance::new(
            key,
            biome,
            features,
            z_min,
            z_max,
            self.world_seed,
        ))
    }

    /// Index of the instance owning `z`, clamped to the materialized range.
    fn index_at(&self, z: f64) -> usize {
        let i = self.instances.partition_point(|inst| inst.z_max() < z);
        let last = self.instances.len().saturating_sub(1);
        let outside = i > last || self.instances.front().is_some_and(|first| z < first.z_min());
        if outside {
            log::warn!(
                "biome query at z={z} outside the active window {:?}; call ensure_window first",
                self.extent()
            );
        }
        i.min(last)
    }

    /// The instance owning `z` (`z_min < z <= z_max`; the first instance also
    /// owns its own `z_min`). Outside the window, the nearest end instance.
    pub fn instance_at(&self, z: f64) -> &Arc<BiomeInstance> {
        &self.instances[self.index_at(z)]
    }

    pub fn boundaries_at(&self, z: f64) -> BiomeBounds {
        let inst = self.instance_at(z);
        BiomeBounds {
            z_min: inst.z_min(),
            z_max: inst.z_max(),
        }
    }

    /// Splits `[a, b]` (walked from `a` toward `b`) into per-instance segments.
    ///
    /// Segments are contiguous: the first starts at `a`, the last ends at `b`.
    /// `a == b` yields one zero-length segment.
    pub fn feature_segments(&self, a: f64, b: f64) -> Vec<FeatureSegment> {
        let segment = |inst: &Arc<BiomeInstance>, z_start: f64, z_end: f64| FeatureSegment {
            instance: Arc::clone(inst),
            z_start,
            z_end,
            biome_z_min: inst.z_min(),
            biome_z_max: inst.z_max(),
        };

        if a == b || !a.is_finite() || !b.is_finite() {
            return vec![segment(self.instance_at(a), a, b)];
        }

        let dir = if b > a { 1.0 } else { -1.0 };
        let mut out = Vec::new();
        let mut cursor = a;
        while (b - cursor) * dir > 0.0 {
            let inst = self.instance_at(cursor + dir * SEGMENT_PROBE_EPS);
            let boundary = if dir > 0.0 { inst.z_max() } else { inst.z_min() };
            let end = if (boundary - b) * dir >= 0.0 || (boundary - cursor) * dir <= 0.0 {
                b
            } else {
                boundary
            };
            out.push(segment(inst, cursor, end));
            cursor = end;
        }
        out
    }

    /// Cross-fade weights at `z`.
    ///
    /// Within half a transition width of a boundary shared with a
    /// materialized neighbour, `w1` runs linearly from 0.5 at the boundary to
    /// 1.0 at the half-width; `w2 = 1 - w1`. Elsewhere `w1 = 1`.
    pub fn blend_weights(&self, z: f64) -> BlendWeights {
        let index = self.index_at(z);
        let primary = Arc::clone(&self.instances[index]);
        let half = self.config.transition_width / 2.0;

        let to_min = (z - primary.z_min()).max(0.0);
        let to_max = (primary.z_max() - z).max(0.0);
        let (distance, neighbor) = if to_min <= to_max {
            (to_min, index.checked_sub(1))
        } else {
            (to_max, Some(index + 1))
        };
        let secondary = neighbor
            .filter(|_| half > 0.0 && distance < half)
            .and_then(|i| self.instances.get(i))
            .cloned();

        match secondary {
            Some(secondary) => {
                let w1 = 0.5 + 0.5 * (distance / half).clamp(0.0, 1.0);
                BlendWeights {
                    primary,
                    secondary: Some(secondary),
                    w1,
                    w2: 1.0 - w1,
                }
            }
            None => BlendWeights {
                primary,
                secondary: None,
                w1: 1.0,
                w2: 0.0,
            },
        }
    }

    /// Evaluates `mix(f1, f2, w1, w2)` with the features and weights at `z`.
    /// Away from transitions `f2` is `f1` and `w2` is 0.
    pub fn blended_attribute<T, F>(&self, z: f64, mix: F) -> T
    where
        F: FnOnce(&BiomeFeatures, &BiomeFeatures, f64, f64) -> T,
    {
        let weights = self.blend_weights(z);
        let f1 = weights.primary.features();
        let f2 = weights.secondary.as_ref().map_or(f1, |s| s.features());
        mix(f1.as_ref(), f2.as_ref(), weights.w1, weights.w2)
    }

    pub fn fog_density(&self, z: f64) -> f64 {
        self.blended_attribute(z, |a, b, w1, w2| a.fog_density() * w1 + b.fog_density() * w2)
    }

    pub fn fog_range(&self, z: f64) -> (f64, f64) {
        self.blended_attribute(z, |a, b, w1, w2| {
            let (an, af) = a.fog_range();
            let (bn, bf) = b.fog_range();
            (an * w1 + bn * w2, af * w1 + bf * w2)
        })
    }

    pub fn ground_color(&self, position: DVec3) -> Vec3 {
        self.blended_attribute(position.z, |a, b, w1, w2| {
            a.ground_color(position) * w1 as f32 + b.ground_color(position) * w2 as f32
        })
    }

    pub fn screen_tint(&self, z: f64) -> Vec4 {
        self.blended_attribute(z, |a, b, w1, w2| {
            a.screen_tint() * w1 as f32 + b.screen_tint() * w2 as f32
        })
    }

    pub fn sky_gradient(&self, z: f64, dayness: f32) -> SkyGradient {
        self.blended_attribute(z, |a, b, w1, w2| {
            a.sky_gradient(dayness)
                .mix(b.sky_gradient(dayness), w1 as f32, w2 as f32)
        })
    }

    pub fn amplitude_multiplier(&self, z: f64) -> f64 {
        self.blended_attribute(z, |a, b, w1, w2| {
            a.amplitude_multiplier() * w1 + b.amplitude_multiplier() * w2
        })
    }

    pub fn width_multiplier(&self, z: f64) -> f64 {
        self.blended_attribute(z, |a, b, w1, w2| {
            a.width_multiplier() * w1 + b.width_multiplier() * w2
        })
    }
}

impl std::fmt::Debug for BiomeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BiomeWindow")
            .field("world_seed", &self.world_seed)
            .field("instances", &self.instances.len())
            .field("extent", &self.extent())
            .finish_non_exhaustive()
    }
}
