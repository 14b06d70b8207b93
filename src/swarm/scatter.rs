use glam::Vec3;
use serde::{Deserialize, Serialize};

/// The volume scattered particles rest in.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", tag = "shape")]
pub(crate) enum ScatterField {
    /// Uniform inside a box of half extents `spread * (1, 0.75, 0.5)`.
    Box { spread: f32 },

    /// A ring around the y axis: horizontal distance in `[inner, outer]`, uniform height and
    /// depth.
    Annulus { inner: f32, outer: f32, height: f32, depth: f32 },
}

impl Default for ScatterField {
    fn default() -> Self {
        Self::Annulus { inner: 5.0, outer: 20.0, height: 20.0, depth: 15.0 }
    }
}

impl ScatterField {
    /// The same field with every extent multiplied by `factor`.
    pub(crate) fn scaled(self, factor: f32) -> Self {
        match self {
            Self::Box { spread } => Self::Box { spread: spread * factor },
            Self::Annulus { inner, outer, height, depth } => Self::Annulus {
                inner: inner * factor,
                outer: outer * factor,
                height: height * factor,
                depth: depth * factor,
            },
        }
    }

    /// The largest extent of the field, used to validate it.
    pub(crate) fn radius(&self) -> f32 {
        match self {
            Self::Box { spread } => *spread,
            Self::Annulus { outer, .. } => *outer,
        }
    }

    fn point(&self, rng: &mut fastrand::Rng) -> Vec3 {
        match *self {
            Self::Box { spread } => Vec3::new(
                (rng.f32() - 0.5) * spread * 2.0,
                (rng.f32() - 0.5) * spread * 1.5,
                (rng.f32() - 0.5) * spread,
            ),
            Self::Annulus { inner, outer, height, depth } => {
                let angle = rng.f32() * std::f32::consts::TAU;
                let radius = inner + rng.f32() * (outer - inner).max(0.0);
                let side = if rng.bool() { 1.0 } else { -1.0 };
                Vec3::new(angle.cos() * radius * side, (rng.f32() - 0.5) * height, (rng.f32() - 0.5) * depth)
            }
        }
    }
}

/// Generate one resting position per particle.
pub(crate) fn generate(count: usize, field: &ScatterField, rng: &mut fastrand::Rng) -> Vec<Vec3> {
    (0..count).map(|_| field.point(rng)).collect()
}
