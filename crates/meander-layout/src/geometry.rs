//! River centerline sampling.
//!
//! [`GeometrySampler`] is the contract the layout engine consumes: ordered
//! samples of the centerline at a fixed arc-length step. [`MeanderSampler`] is
//! a self-contained sinusoidal river with noise-driven bank width, used by the
//! demo and by tests.

use glam::DVec3;
use noise::{NoiseFn, Simplex};

/// A single sample of the river centerline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeometrySample {
    /// World-space centerline position.
    pub position: DVec3,
    /// Unit direction of travel along the centerline.
    pub tangent: DVec3,
    /// Unit lateral direction. Positive lateral offsets point along it.
    pub normal: DVec3,
    /// Lateral distance from the centerline to the navigable edge. Always `> 0`.
    pub bank_dist: f64,
    /// Cumulative distance along the centerline, measured from the start of
    /// the sampled range.
    pub arc_length: f64,
}

/// Produces ordered centerline samples over a Z range.
pub trait GeometrySampler {
    /// Samples the centerline between `z_start` and `z_end` every `step` units
    /// of arc length.
    ///
    /// Samples are ordered by increasing `arc_length`. Implementations return an
    /// empty list for an empty or inverted range.
    fn sample(&self, z_start: f64, z_end: f64, step: f64) -> Vec<GeometrySample>;
}

/// Parameters for [`MeanderSampler`].
#[derive(Clone, Debug, PartialEq)]
pub struct MeanderParams {
    /// Seed for the bank-width noise field.
    pub seed: u32,
    /// Peak lateral swing of the centerline, in world units.
    pub amplitude: f64,
    /// Distance along Z of one full left/right swing.
    pub wavelength: f64,
    /// Mean distance from the centerline to either bank.
    pub base_width: f64,
    /// Relative bank-width variation in `[0.0, 1.0)`.
    pub width_variation: f64,
    /// Frequency of the bank-width noise along Z.
    pub width_frequency: f64,
}

impl Default for MeanderParams {
    fn default() -> Self {
        Self {
            seed: 0,
            amplitude: 40.0,
            wavelength: 600.0,
            base_width: 30.0,
            width_variation: 0.35,
            width_frequency: 0.004,
        }
    }
}

/// Sinusoidal river centerline in the XZ plane.
///
/// The centerline is `x = amplitude * sin(2π z / wavelength)`. The range is
/// marched finely along Z and a sample is emitted at every exact multiple of
/// the arc-length step, plus one closing sample at `z_end`.
pub struct MeanderSampler {
    noise: Simplex,
    params: MeanderParams,
}

/// Sub-steps per arc-length step used when marching the curve.
const MARCH_SUBDIVISIONS: f64 = 8.0;

/// Bank distance never drops below this, whatever the noise says.
const MIN_BANK_DIST: f64 = 6.0;

impl MeanderSampler {
    /// Creates a sampler with the given parameters.
    pub fn new(params: MeanderParams) -> Self {
        let noise = Simplex::new(params.seed);
        Self { noise, params }
    }

    /// Returns the sampler parameters.
    pub fn params(&self) -> &MeanderParams {
        &self.params
    }

    /// Centerline position at `z`.
    pub fn centerline(&self, z: f64) -> DVec3 {
        let k = std::f64::consts::TAU / self.params.wavelength;
        DVec3::new(self.params.amplitude * (k * z).sin(), 0.0, z)
    }

    /// Bank distance at `z`.
    pub fn bank_dist(&self, z: f64) -> f64 {
        let n = self.noise.get([z * self.params.width_frequency, 0.5]);
        let variation = self.params.width_variation.clamp(0.0, 0.95);
        (self.params.base_width * (1.0 + variation * n)).max(MIN_BANK_DIST)
    }

    fn sample_at(&self, z: f64, arc_length: f64) -> GeometrySample {
        let k = std::f64::consts::TAU / self.params.wavelength;
        let dx_dz = self.params.amplitude * k * (k * z).cos();
        let tangent = DVec3::new(dx_dz, 0.0, 1.0).normalize();
        let normal = DVec3::new(tangent.z, 0.0, -tangent.x);
        GeometrySample {
            position: self.centerline(z),
            tangent,
            normal,
            bank_dist: self.bank_dist(z),
            arc_length,
        }
    }
}

impl GeometrySampler for MeanderSampler {
    fn sample(&self, z_start: f64, z_end: f64, step: f64) -> Vec<GeometrySample> {
        if !(z_start.is_finite() && z_end.is_finite() && step > 0.0) || z_end <= z_start {
            return Vec::new();
        }

        let dz = step / MARCH_SUBDIVISIONS;
        let mut samples = vec![self.sample_at(z_start, 0.0)];
        let mut next_target = step;
        let mut arc = 0.0;
        let mut z = z_start;
        let mut prev = self.centerline(z);

        while z < z_end {
            let z_next = (z + dz).min(z_end);
            let pos = self.centerline(z_next);
            let seg = pos.distance(prev);

            while seg > 0.0 && next_target <= arc + seg {
                let f = (next_target - arc) / seg;
                samples.push(self.sample_at(z + f * (z_next - z), next_target));
                next_target += step;
            }

            arc += seg;
            z = z_next;
            prev = pos;
        }

        // Close the range unless the last step sample already sits on the end.
        let last_arc = samples.last().map_or(0.0, |s| s.arc_length);
        if arc - last_arc > step * 0.01 {
            samples.push(self.sample_at(z_end, arc));
        }

        samples
    }
}
