use super::{SwarmError, animator::Frame, color::Color, particle::RenderTransform};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

const AMBIENT_COLORS: [Color; 7] = [
    Color::from_hex(0x00d4ff),
    Color::from_hex(0x0066ff),
    Color::from_hex(0x8b5cf6),
    Color::from_hex(0xd946ef),
    Color::from_hex(0xec4899),
    Color::from_hex(0x22d3ee),
    Color::from_hex(0xa855f7),
];

/// Tuning for the translucent blocks drifting behind a swarm.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct AmbientParams {
    /// How many blocks drift.
    pub(crate) block_count: usize,

    /// Full size of the box the blocks are spread over.
    pub(crate) extent: Vec3,

    /// Depth the box is centered on; negative values sit behind the glyph.
    pub(crate) depth: f32,

    /// Smallest block edge, and how much larger than that a block may be.
    pub(crate) size: (f32, f32),

    /// Slowest drift frequency, and how much faster than that a block may drift.
    pub(crate) speed: (f32, f32),

    /// How far a block wanders from its home position.
    pub(crate) wander: f32,

    /// Tumble speed around x and y, in radians per second.
    pub(crate) spin: Vec2,

    /// How opaque the blocks are.
    pub(crate) opacity: f32,
}

impl Default for AmbientParams {
    fn default() -> Self {
        Self {
            block_count: 80,
            extent: Vec3::new(35.0, 25.0, 20.0),
            depth: -5.0,
            size: (0.06, 0.12),
            speed: (0.2, 0.3),
            wander: 0.5,
            spin: Vec2::new(0.2, 0.15),
            opacity: 0.4,
        }
    }
}

impl AmbientParams {
    /// The sparser, smaller field used on narrow screens.
    pub(crate) fn narrow() -> Self {
        Self { block_count: 40, extent: Vec3::new(20.0, 15.0, 12.0), size: (0.04, 0.08), ..Default::default() }
    }

    pub(crate) fn validate(&self) -> Result<(), SwarmError> {
        if self.block_count == 0 {
            return Err(SwarmError::NoParticles);
        }
        if !self.extent.is_finite() || self.extent.min_element() < 0.0 {
            return Err(SwarmError::InvalidParameter("ambient extent", self.extent.min_element() as f64));
        }
        if !self.size.0.is_finite() || self.size.0 <= 0.0 {
            return Err(SwarmError::InvalidParameter("ambient block size", self.size.0 as f64));
        }
        let non_negative = [
            ("ambient size range", self.size.1),
            ("ambient speed", self.speed.0),
            ("ambient speed range", self.speed.1),
            ("ambient wander", self.wander),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(SwarmError::InvalidParameter(name, value as f64));
            }
        }
        if !self.depth.is_finite() || !self.spin.is_finite() {
            return Err(SwarmError::InvalidParameter("ambient depth", self.depth as f64));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(SwarmError::InvalidParameter("ambient opacity", self.opacity as f64));
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
struct Block {
    home: Vec3,
    size: f32,
    speed: f32,
    color: Color,
}

/// Translucent blocks orbiting their home positions. Unlike a swarm they never gather.
#[derive(Debug)]
pub(crate) struct AmbientField {
    blocks: Vec<Block>,
    params: AmbientParams,
}

impl AmbientField {
    pub(crate) fn new(params: &AmbientParams, mut rng: fastrand::Rng) -> Result<Self, SwarmError> {
        params.validate()?;
        let blocks = (0..params.block_count)
            .map(|_| {
                let offset = Vec3::new(rng.f32() - 0.5, rng.f32() - 0.5, rng.f32() - 0.5) * params.extent;
                Block {
                    home: offset + Vec3::Z * params.depth,
                    size: params.size.0 + rng.f32() * params.size.1,
                    speed: params.speed.0 + rng.f32() * params.speed.1,
                    color: AMBIENT_COLORS[rng.usize(..AMBIENT_COLORS.len())],
                }
            })
            .collect::<Vec<_>>();
        log::info!("built ambient field: {} blocks", blocks.len());
        Ok(Self { blocks, params: params.clone() })
    }

    pub(crate) fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Compute the blocks' transforms at `now` (seconds). Each block's edge length is its scale.
    pub(crate) fn tick(&self, now: f64) -> Frame {
        let time = now as f32;
        let spin = self.params.spin;
        let particles = self
            .blocks
            .iter()
            .enumerate()
            .map(|(index, block)| {
                let offset = index as f32;
                let sway = time * block.speed + offset;
                let drift = Vec3::new(sway.sin(), (time * block.speed * 0.8 + offset).cos(), 0.0);
                RenderTransform {
                    position: block.home + drift * self.params.wander,
                    scale: block.size,
                    rotation: Vec3::new(time * spin.x + offset, time * spin.y + offset, 0.0),
                    color: block.color.dimmed(self.params.opacity),
                }
            })
            .collect();
        Frame {
            time: now,
            phase: None,
            progress: 0.0,
            group_rotation: Vec3::ZERO,
            block_size: 1.0,
            scale: 1.0,
            particles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn field(params: &AmbientParams) -> AmbientField {
        AmbientField::new(params, fastrand::Rng::with_seed(21)).expect("construction failed")
    }

    #[rstest]
    #[case::wide(AmbientParams::default(), 80)]
    #[case::narrow(AmbientParams::narrow(), 40)]
    fn blocks_stay_in_their_box(#[case] params: AmbientParams, #[case] count: usize) {
        let field = field(&params);
        assert_eq!(field.len(), count);
        let half = params.extent / 2.0 + Vec3::new(params.wander, params.wander, 0.0);
        for now in [0.0, 1.5, 40.0] {
            for transform in field.tick(now).particles {
                let local = transform.position - Vec3::Z * params.depth;
                assert!(local.abs().cmple(half + 1e-4).all(), "{} outside {half}", transform.position);
                assert!(transform.scale >= params.size.0 && transform.scale <= params.size.0 + params.size.1);
            }
        }
    }

    #[test]
    fn blocks_drift_without_a_cycle() {
        let field = field(&AmbientParams::default());
        let first = field.tick(0.0);
        let later = field.tick(2.0);
        assert_eq!(first.phase, None);
        assert_eq!(later.progress, 0.0);
        let moved = first.particles.iter().zip(&later.particles).filter(|(a, b)| a.position != b.position).count();
        assert!(moved > 0);
        for (a, b) in first.particles.iter().zip(&later.particles) {
            assert_eq!(a.position.z, b.position.z);
            assert!((a.position - b.position).length() <= 4.0 * AmbientParams::default().wander);
        }
    }

    #[test]
    fn blocks_are_translucent() {
        let field = field(&AmbientParams::default());
        for transform in field.tick(0.0).particles {
            let brightest = transform.color.r.max(transform.color.g).max(transform.color.b);
            assert!(brightest > 0 && brightest <= 102, "{:?}", transform.color);
        }
    }

    #[rstest]
    #[case::no_blocks(AmbientParams { block_count: 0, ..Default::default() })]
    #[case::negative_extent(AmbientParams { extent: Vec3::new(-1.0, 1.0, 1.0), ..Default::default() })]
    #[case::zero_size(AmbientParams { size: (0.0, 0.1), ..Default::default() })]
    #[case::opaque_beyond_one(AmbientParams { opacity: 1.5, ..Default::default() })]
    #[case::nan_wander(AmbientParams { wander: f32::NAN, ..Default::default() })]
    fn invalid_params_are_rejected(#[case] params: AmbientParams) {
        assert!(AmbientField::new(&params, fastrand::Rng::with_seed(1)).is_err());
    }
}
