use super::{
    SwarmError,
    clock::Phase,
    easing::{ease_in_out_cubic, ease_out_quart},
    particle::{Particle, RenderTransform},
};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;

/// Tuning knobs for how particles move within each phase.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct MotionProfile {
    /// Per axis amplitude of the slow drift while scattered.
    pub(crate) drift: Vec3,

    /// Per axis amplitude of the shimmer while the glyph is formed.
    pub(crate) shimmer: Vec3,

    /// Scale of a scattered particle relative to a formed one.
    pub(crate) rest_scale: f32,

    /// How much the scattered scale pulses around `rest_scale`.
    pub(crate) rest_pulse: f32,

    /// How much the formed scale pulses around 1.
    pub(crate) formed_pulse: f32,

    /// Scale a particle shrinks to by the end of an explosion.
    pub(crate) scale_floor: f32,

    /// Radians a gathering particle turns around its target on the way in.
    pub(crate) swirl: f32,

    /// Spin speed around each axis, in radians per second.
    pub(crate) spin: Vec3,

    /// Peak yaw of the whole swarm while formed, in radians.
    pub(crate) sway: f32,

    /// Angular frequency of the sway.
    pub(crate) sway_speed: f32,

    /// Range of explosion speeds rolled on every scatter.
    pub(crate) burst_speed: (f32, f32),
}

impl Default for MotionProfile {
    fn default() -> Self {
        Self {
            drift: Vec3::new(0.5, 0.5, 0.3),
            shimmer: Vec3::new(0.015, 0.015, 0.02),
            rest_scale: 0.2,
            rest_pulse: 0.1,
            formed_pulse: 0.05,
            scale_floor: 0.2,
            swirl: 1.2,
            spin: Vec3::new(0.5, 0.3, 0.35),
            sway: 0.08,
            sway_speed: 0.15,
            burst_speed: (0.15, 0.35),
        }
    }
}

impl MotionProfile {
    pub(crate) fn validate(&self) -> Result<(), SwarmError> {
        // past a quarter turn a gathering particle could swing further from its start than the
        // straight path would take it
        if !(0.0..FRAC_PI_2).contains(&self.swirl) {
            return Err(SwarmError::InvalidParameter("swirl", self.swirl as f64));
        }
        if !(self.rest_scale > 0.0 && self.rest_scale <= 1.0) {
            return Err(SwarmError::InvalidParameter("rest scale", self.rest_scale as f64));
        }
        if !(0.0..=1.0).contains(&self.scale_floor) {
            return Err(SwarmError::InvalidParameter("scale floor", self.scale_floor as f64));
        }
        let (low, high) = self.burst_speed;
        if !(low >= 0.0 && high >= low && high.is_finite()) {
            return Err(SwarmError::InvalidParameter("burst speed", high as f64));
        }
        Ok(())
    }

    /// Roll a fresh outward velocity for an explosion.
    pub(crate) fn burst(&self, rng: &mut fastrand::Rng) -> Vec3 {
        let (low, high) = self.burst_speed;
        let angle = rng.f32() * std::f32::consts::TAU;
        let speed = low + rng.f32() * (high - low);
        Vec3::new(angle.cos() * speed, (rng.f32() - 0.5) * speed * 1.5, (rng.f32() - 0.5) * speed)
    }

    fn free_rotation(&self, time: f32, seed: f32) -> Vec3 {
        self.spin * time + Vec3::new(0.1, 0.1, 0.1) * seed
    }
}

/// Apply the phase's easing curve to a linear progress value.
pub(crate) fn eased(phase: Phase, progress: f32) -> f32 {
    match phase {
        Phase::Gathering => ease_out_quart(progress),
        Phase::Scattering => ease_in_out_cubic(progress),
        Phase::Scattered | Phase::Formed => progress.clamp(0.0, 1.0),
    }
}

/// The swarm's overall rotation for this frame.
pub(crate) fn group_rotation(phase: Phase, time: f32, motion: &MotionProfile) -> Vec3 {
    match phase {
        Phase::Formed => Vec3::new(0.0, (time * motion.sway_speed).sin() * motion.sway, 0.0),
        _ => Vec3::ZERO,
    }
}

/// Compute a particle's transform.
///
/// `eased` must already be run through [eased]. `time` drives the idle motion and is the same
/// value for every particle in a frame.
pub(crate) fn interpolate(
    phase: Phase,
    eased: f32,
    time: f32,
    particle: &Particle,
    motion: &MotionProfile,
    explosion_strength: f32,
) -> RenderTransform {
    let seed = particle.seed() as f32;
    let phase_offset = seed * 0.1;
    let free_rotation = motion.free_rotation(time, seed);
    let (position, scale, rotation) = match phase {
        Phase::Scattered => {
            let drift = Vec3::new(
                (time * 0.3 + phase_offset).sin(),
                (time * 0.25 + phase_offset).cos(),
                (time * 0.2 + phase_offset).sin(),
            ) * motion.drift;
            let scale = motion.rest_scale + (time * 1.5 + seed).sin() * motion.rest_pulse;
            (particle.rest() + drift, scale, free_rotation)
        }
        Phase::Gathering => {
            // shrink the offset from the target while turning it, so the path spirals inwards
            let offset = (particle.rest() - particle.target()) * (1.0 - eased);
            let turned = Vec2::from_angle(motion.swirl * eased).rotate(offset.truncate());
            let position = particle.target() + turned.extend(offset.z);
            let scale = motion.rest_scale * (1.0 - eased) + eased;
            (position, scale, free_rotation * (1.0 - eased))
        }
        Phase::Formed => {
            let shimmer = Vec3::new(
                (time * 2.0 + seed * 0.05).sin(),
                (time * 1.5 + seed * 0.05).cos(),
                (time * 1.8 + seed * 0.08).sin(),
            ) * motion.shimmer;
            let scale = 1.0 + (time * 3.0 + seed * 0.03).sin() * motion.formed_pulse;
            (particle.target() + shimmer, scale, Vec3::ZERO)
        }
        Phase::Scattering => {
            let position = particle.target() + particle.velocity() * (eased * explosion_strength);
            let scale = 1.0 - eased * (1.0 - motion.scale_floor);
            (position, scale, free_rotation * eased)
        }
    };
    RenderTransform { position, scale: scale.max(0.0), rotation, color: particle.color() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swarm::color::Color;

    fn particle() -> Particle {
        let target = Vec3::new(1.0, 2.0, 0.1);
        let rest = Vec3::new(-8.0, 5.0, 3.0);
        Particle::new(target, rest, Vec3::new(0.2, -0.1, 0.05), Color::new(1, 2, 3), 7)
    }

    #[test]
    fn gathering_starts_at_rest_and_ends_on_target() {
        let motion = MotionProfile::default();
        let p = particle();
        let start = interpolate(Phase::Gathering, 0.0, 12.3, &p, &motion, 15.0);
        assert!((start.position - p.rest()).length() < 1e-5);
        assert!((start.scale - motion.rest_scale).abs() < 1e-6);

        let end = interpolate(Phase::Gathering, 1.0, 12.3, &p, &motion, 15.0);
        assert_eq!(end.position, p.target());
        assert_eq!(end.scale, 1.0);
        assert_eq!(end.rotation, Vec3::ZERO);
    }

    #[test]
    fn gathering_spirals_closer_every_step() {
        let motion = MotionProfile::default();
        let p = particle();
        let mut last = f32::MAX;
        for step in 0..=20 {
            let e = step as f32 / 20.0;
            let distance = (interpolate(Phase::Gathering, e, 0.0, &p, &motion, 15.0).position - p.target()).length();
            assert!(distance <= last + 1e-6);
            last = distance;
        }
    }

    #[test]
    fn formed_stays_near_target() {
        let motion = MotionProfile::default();
        let p = particle();
        for frame in 0..200 {
            let t = interpolate(Phase::Formed, 0.5, frame as f32 * 0.05, &p, &motion, 15.0);
            assert!((t.position - p.target()).length() <= motion.shimmer.length() + 1e-6);
        }
    }

    #[test]
    fn scattering_flies_along_velocity() {
        let motion = MotionProfile::default();
        let p = particle();
        let start = interpolate(Phase::Scattering, 0.0, 3.0, &p, &motion, 15.0);
        assert_eq!(start.position, p.target());
        assert_eq!(start.scale, 1.0);
        let end = interpolate(Phase::Scattering, 1.0, 3.0, &p, &motion, 15.0);
        assert!((end.position - (p.target() + p.velocity() * 15.0)).length() < 1e-5);
        assert!((end.scale - motion.scale_floor).abs() < 1e-6);
    }

    #[test]
    fn scattered_drifts_around_rest() {
        let motion = MotionProfile::default();
        let p = particle();
        for frame in 0..100 {
            let t = interpolate(Phase::Scattered, 0.0, frame as f32 * 0.1, &p, &motion, 15.0);
            assert!((t.position - p.rest()).length() <= motion.drift.length() + 1e-5);
            assert!(t.scale > 0.0 && t.scale < 0.5);
        }
    }

    #[test]
    fn sway_only_when_formed() {
        let motion = MotionProfile::default();
        assert_eq!(group_rotation(Phase::Gathering, 4.0, &motion), Vec3::ZERO);
        let sway = group_rotation(Phase::Formed, 4.0, &motion);
        assert!(sway.y != 0.0 && sway.y.abs() <= motion.sway);
    }

    #[test]
    fn burst_speed_within_range() {
        let motion = MotionProfile::default();
        let mut rng = fastrand::Rng::with_seed(11);
        for _ in 0..100 {
            let v = motion.burst(&mut rng);
            assert!(v.x.abs() <= motion.burst_speed.1);
            assert!(v.y.abs() <= motion.burst_speed.1 * 0.75);
            assert!(v.z.abs() <= motion.burst_speed.1 * 0.5);
        }
    }

    #[test]
    fn rejects_wide_swirl() {
        let motion = MotionProfile { swirl: 2.0, ..Default::default() };
        assert!(matches!(motion.validate(), Err(SwarmError::InvalidParameter("swirl", _))));
        assert!(MotionProfile::default().validate().is_ok());
    }
}
