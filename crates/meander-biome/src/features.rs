//! Per-biome feature handle: environmental attributes, colour strategies, and
//! the declarative layout/decoration tables of one biome type.

use std::fmt;
use std::sync::Arc;

use glam::{DVec3, Vec3, Vec4};
use meander_layout::{DecorationConfig, LayoutConfig};
use rand::Rng;

/// Colour strategy evaluated at a world position.
pub type GroundColorFn = dyn Fn(DVec3) -> Vec3 + Send + Sync;

/// Sky strategy evaluated at a dayness in `[0, 1]` (0 = night, 1 = noon).
pub type SkyGradientFn = dyn Fn(f32) -> SkyGradient + Send + Sync;

/// Vertical sky colour gradient.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SkyGradient {
    pub zenith: Vec3,
    pub horizon: Vec3,
}

impl SkyGradient {
    pub fn new(zenith: Vec3, horizon: Vec3) -> Self {
        Self { zenith, horizon }
    }

    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            zenith: self.zenith.lerp(other.zenith, t),
            horizon: self.horizon.lerp(other.horizon, t),
        }
    }

    /// Weighted sum of two gradients.
    pub fn mix(self, other: Self, w1: f32, w2: f32) -> Self {
        Self {
            zenith: self.zenith * w1 + other.zenith * w2,
            horizon: self.horizon * w1 + other.horizon * w2,
        }
    }
}

/// Everything the world needs to know about one biome type.
///
/// Scalar attributes are plain data; colours that vary with position or time
/// of day are strategy closures. Layout and decoration tables are shared
/// behind `Arc` so instances of the same type never copy them.
#[derive(Clone)]
pub struct BiomeFeatures {
    name: String,
    length: (f64, f64),
    ground_color: Arc<GroundColorFn>,
    screen_tint: Vec4,
    sky_gradient: Arc<SkyGradientFn>,
    fog_density: f64,
    fog_range: (f64, f64),
    amplitude_multiplier: f64,
    width_multiplier: f64,
    layout: Arc<LayoutConfig>,
    decorations: Arc<DecorationConfig>,
}

const DEFAULT_LENGTH: f64 = 1500.0;

impl BiomeFeatures {
    /// A neutral biome: grey ground, no tint, a plain day/night sky, no
    /// layout tracks and no decorations.
    pub fn new(name: impl Into<String>) -> Self {
        let day = SkyGradient::new(Vec3::new(0.35, 0.55, 0.9), Vec3::new(0.75, 0.85, 0.95));
        let night = SkyGradient::new(Vec3::new(0.02, 0.03, 0.08), Vec3::new(0.08, 0.1, 0.2));
        Self {
            name: name.into(),
            length: (DEFAULT_LENGTH, DEFAULT_LENGTH),
            ground_color: Arc::new(|_| Vec3::splat(0.5)),
            screen_tint: Vec4::ZERO,
            sky_gradient: Arc::new(move |dayness| night.lerp(day, dayness.clamp(0.0, 1.0))),
            fog_density: 0.002,
            fog_range: (100.0, 1500.0),
            amplitude_multiplier: 1.0,
            width_multiplier: 1.0,
            layout: Arc::new(LayoutConfig::new()),
            decorations: Arc::new(DecorationConfig::default()),
        }
    }

    /// Instance length range; each new instance draws uniformly within it.
    pub fn with_length(mut self, min: f64, max: f64) -> Self {
        self.length = (min, max);
        self
    }

    pub fn with_ground_color<F>(mut self, f: F) -> Self
    where
        F: Fn(DVec3) -> Vec3 + Send + Sync + 'static,
    {
        self.ground_color = Arc::new(f);
        self
    }

    pub fn with_flat_ground_color(self, color: Vec3) -> Self {
        self.with_ground_color(move |_| color)
    }

    pub fn with_screen_tint(mut self, tint: Vec4) -> Self {
        self.screen_tint = tint;
        self
    }

    /// Sky that lerps from `night` to `day` with dayness.
    pub fn with_sky_palettes(self, night: SkyGradient, day: SkyGradient) -> Self {
        self.with_sky_gradient(move |dayness| night.lerp(day, dayness.clamp(0.0, 1.0)))
    }

    pub fn with_sky_gradient<F>(mut self, f: F) -> Self
    where
        F: Fn(f32) -> SkyGradient + Send + Sync + 'static,
    {
        self.sky_gradient = Arc::new(f);
        self
    }

    pub fn with_fog(mut self, density: f64, near: f64, far: f64) -> Self {
        self.fog_density = density;
        self.fog_range = (near, far);
        self
    }

    pub fn with_multipliers(mut self, amplitude: f64, width: f64) -> Self {
        self.amplitude_multiplier = amplitude;
        self.width_multiplier = width;
        self
    }

    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = Arc::new(layout);
        self
    }

    pub fn with_decorations(mut self, decorations: DecorationConfig) -> Self {
        self.decorations = Arc::new(decorations);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn length(&self) -> (f64, f64) {
        self.length
    }

    /// Draws an instance length: uniform in the configured range, `min` for
    /// degenerate ranges, never below 1.
    pub fn draw_length<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let (min, max) = self.length;
        let length = if max > min {
            rng.random_range(min..=max)
        } else {
            min
        };
        if length.is_finite() { length.max(1.0) } else { 1.0 }
    }

    pub fn ground_color(&self, position: DVec3) -> Vec3 {
        (self.ground_color)(position)
    }

    pub fn screen_tint(&self) -> Vec4 {
        self.screen_tint
    }

    pub fn sky_gradient(&self, dayness: f32) -> SkyGradient {
        (self.sky_gradient)(dayness)
    }

    pub fn fog_density(&self) -> f64 {
        self.fog_density
    }

    /// `(near, far)` fog distances.
    pub fn fog_range(&self) -> (f64, f64) {
        self.fog_range
    }

    pub fn amplitude_multiplier(&self) -> f64 {
        self.amplitude_multiplier
    }

    pub fn width_multiplier(&self) -> f64 {
        self.width_multiplier
    }

    pub fn layout_config(&self) -> &LayoutConfig {
        &self.layout
    }

    pub fn decoration_config(&self) -> &DecorationConfig {
        &self.decorations
    }
}

impl fmt::Debug for BiomeFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BiomeFeatures")
            .field("name", &self.name)
            .field("length", &self.length)
            .field("fog_density", &self.fog_density)
            .field("fog_range", &self.fog_range)
            .field("tracks", &self.layout.tracks.len())
            .field("decoration_rules", &self.decorations.rules.len())
            .finish_non_exhaustive()
    }
}
