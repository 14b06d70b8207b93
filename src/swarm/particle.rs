use super::color::Color;
use glam::Vec3;
use serde::Serialize;

/// A single animated point.
#[derive(Clone, Debug)]
pub(crate) struct Particle {
    target: Vec3,
    rest: Vec3,
    velocity: Vec3,
    color: Color,
    seed: u32,
}

impl Particle {
    pub(crate) fn new(target: Vec3, rest: Vec3, velocity: Vec3, color: Color, seed: u32) -> Self {
        Self { target, rest, velocity, color, seed }
    }

    /// Where this particle sits once the glyph is formed.
    pub(crate) fn target(&self) -> Vec3 {
        self.target
    }

    /// Where this particle drifts while scattered.
    pub(crate) fn rest(&self) -> Vec3 {
        self.rest
    }

    /// The explosion direction for the current scattering phase.
    pub(crate) fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub(crate) fn color(&self) -> Color {
        self.color
    }

    /// Decorrelates this particle's idle motion from its neighbours'.
    pub(crate) fn seed(&self) -> u32 {
        self.seed
    }

    pub(crate) fn settle(&mut self, rest: Vec3) {
        self.rest = rest;
    }

    pub(crate) fn launch(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }
}

/// How a particle should be drawn on a given frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub(crate) struct RenderTransform {
    pub(crate) position: Vec3,
    pub(crate) scale: f32,
    pub(crate) rotation: Vec3,
    pub(crate) color: Color,
}
