use serde::{Deserialize, Serialize};

use super::core::{Point3, Vec3, lerp};

/// One recorded point on a sampled curve.
///
/// `percent` is the global parameter of the sample in the full buffer. The
/// remaining fields are carried metadata: the engine never interprets them, it
/// only blends them when evaluating between two samples.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Sample {
    pub position: Point3,
    /// Unit tangent in the direction of increasing percent.
    pub forward: Vec3,
    /// Unit normal.
    pub up: Vec3,
    /// RGBA color.
    pub color: [f64; 4],
    /// Thickness / scale factor.
    pub size: f64,
    pub percent: f64,
}

impl Sample {
    /// A sample with a +Z tangent, +Y normal, white color and unit size.
    #[must_use]
    pub const fn new(position: Point3, percent: f64) -> Self {
        Self {
            position,
            forward: Vec3::Z,
            up: Vec3::Y,
            color: [1.0, 1.0, 1.0, 1.0],
            size: 1.0,
            percent,
        }
    }

    #[must_use]
    pub const fn with_frame(mut self, forward: Vec3, up: Vec3) -> Self {
        self.forward = forward;
        self.up = up;
        self
    }

    #[must_use]
    pub const fn with_color(mut self, color: [f64; 4]) -> Self {
        self.color = color;
        self
    }

    #[must_use]
    pub const fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    /// Blends two samples. Directions are renormalized, everything else is linear.
    #[must_use]
    pub fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Self {
            position: a.position.lerp(b.position, t),
            forward: a.forward.nlerp(b.forward, t),
            up: a.up.nlerp(b.up, t),
            color: [
                lerp(a.color[0], b.color[0], t),
                lerp(a.color[1], b.color[1], t),
                lerp(a.color[2], b.color[2], t),
                lerp(a.color[3], b.color[3], t),
            ],
            size: lerp(a.size, b.size, t),
            percent: lerp(a.percent, b.percent, t),
        }
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.forward.is_finite()
            && self.up.is_finite()
            && self.size.is_finite()
            && self.percent.is_finite()
            && self.color.iter().all(|c| c.is_finite())
    }
}
