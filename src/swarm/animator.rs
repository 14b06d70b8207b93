use super::{
    SwarmError,
    clock::{Phase, PhaseClock, PhaseDurations},
    color::Palette,
    glyph::{self, Glyph, GlyphLayout},
    motion::{self, MotionProfile},
    particle::{Particle, RenderTransform},
    scatter::{self, ScatterField},
};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Settings shared by every swarm regardless of the viewport it is built for.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct AnimatorSettings {
    /// The glyph the swarm gathers into.
    pub(crate) glyph: Glyph,

    /// The palette particles are colored from.
    pub(crate) palette: Palette,

    /// How long each phase lasts.
    pub(crate) durations: PhaseDurations,

    /// How particles move within each phase.
    pub(crate) motion: MotionProfile,

    /// Where scattered particles rest, before the viewport's spread multiplier.
    pub(crate) scatter: ScatterField,

    /// Distance between sample points along the glyph's strokes.
    pub(crate) sample_step: f32,

    /// Noise added to every sample point.
    pub(crate) sample_jitter: f32,

    /// Extra in-plane noise added to every particle target.
    pub(crate) target_spread: f32,

    /// Thickness of the formed glyph along z.
    pub(crate) depth: f32,

    /// Seed for every random choice; a fresh one is drawn when unset.
    pub(crate) seed: Option<u64>,
}

impl Default for AnimatorSettings {
    fn default() -> Self {
        Self {
            glyph: Glyph::K,
            palette: Palette::Frost,
            durations: PhaseDurations::default(),
            motion: MotionProfile::default(),
            scatter: ScatterField::default(),
            sample_step: 0.03,
            sample_jitter: 0.0,
            target_spread: 0.06,
            depth: 0.3,
            seed: None,
        }
    }
}

impl AnimatorSettings {
    pub(crate) fn validate(&self) -> Result<(), SwarmError> {
        self.durations.validate()?;
        self.motion.validate()?;
        positive("sample step", self.sample_step)?;
        positive("scatter radius", self.scatter.radius())?;
        let non_negative =
            [("sample jitter", self.sample_jitter), ("target spread", self.target_spread), ("depth", self.depth)];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(SwarmError::InvalidParameter(name, value as f64));
            }
        }
        Ok(())
    }

    /// A random source for one swarm, seeded from the settings when a seed is configured.
    pub(crate) fn rng(&self) -> fastrand::Rng {
        match self.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        }
    }
}

/// Parameters that depend on the viewport a swarm is built for.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ConstructionParams {
    /// How many particles the swarm has.
    pub(crate) particle_count: usize,

    /// Edge length of one particle.
    pub(crate) block_size: f32,

    /// Space between neighbouring blocks in the block layout.
    pub(crate) block_gap: f32,

    /// Multiplier applied to the scatter field.
    pub(crate) spread: f32,

    /// Where the glyph's center sits.
    pub(crate) glyph_offset: Vec2,

    /// Height of the glyph in blocks.
    pub(crate) height_units: u32,

    /// Overall scale the renderer applies to the swarm.
    pub(crate) scale: f32,

    /// How far exploding particles fly.
    pub(crate) explosion_strength: f32,

    /// How the glyph is sampled.
    pub(crate) layout: GlyphLayout,
}

impl Default for ConstructionParams {
    fn default() -> Self {
        Self {
            particle_count: 3000,
            block_size: 0.032,
            block_gap: 0.0,
            spread: 1.0,
            glyph_offset: Vec2::ZERO,
            height_units: 150,
            scale: 1.0,
            explosion_strength: 15.0,
            layout: GlyphLayout::Strokes,
        }
    }
}

impl ConstructionParams {
    pub(crate) fn validate(&self) -> Result<(), SwarmError> {
        if self.particle_count == 0 {
            return Err(SwarmError::NoParticles);
        }
        if self.height_units == 0 {
            return Err(SwarmError::InvalidParameter("height units", 0.0));
        }
        positive("block size", self.block_size)?;
        positive("spread", self.spread)?;
        positive("scale", self.scale)?;
        positive("explosion strength", self.explosion_strength)?;
        if !self.block_gap.is_finite() || self.block_gap < 0.0 {
            return Err(SwarmError::InvalidParameter("block gap", self.block_gap as f64));
        }
        if !self.glyph_offset.is_finite() {
            return Err(SwarmError::InvalidParameter("glyph offset", self.glyph_offset.length() as f64));
        }
        Ok(())
    }

    /// Distance between neighbouring grid cells.
    pub(crate) fn cell(&self) -> f32 {
        self.block_size + self.block_gap
    }

    /// Half the glyph's height in scene units.
    pub(crate) fn half_height(&self) -> f32 {
        self.height_units as f32 * self.cell() / 2.0
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), SwarmError> {
    if value.is_finite() && value > 0.0 { Ok(()) } else { Err(SwarmError::InvalidParameter(name, value as f64)) }
}

/// Everything a renderer needs to draw one frame of a swarm.
#[derive(Clone, Debug, Serialize)]
pub(crate) struct Frame {
    /// The time this frame was computed for.
    pub(crate) time: f64,

    /// The phase this frame was rendered in, if the layer cycles through phases at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) phase: Option<Phase>,

    /// Eased progress through `phase`.
    pub(crate) progress: f32,

    /// Rotation applied to the whole swarm.
    pub(crate) group_rotation: Vec3,

    /// Edge length of one particle at scale 1.
    pub(crate) block_size: f32,

    /// Overall scale of the swarm.
    pub(crate) scale: f32,

    /// One transform per particle, in construction order.
    pub(crate) particles: Vec<RenderTransform>,
}

/// A swarm of particles cycling between scattered and formed.
///
/// The animator owns all of its mutable state and only changes it inside [Animator::tick].
#[derive(Debug)]
pub(crate) struct Animator {
    clock: PhaseClock,
    particles: Vec<Particle>,
    motion: MotionProfile,
    params: ConstructionParams,
    rng: fastrand::Rng,
}

impl Animator {
    /// Build a swarm in the scattered phase, anchored by its first tick.
    pub(crate) fn new(
        settings: &AnimatorSettings,
        params: &ConstructionParams,
        rng: fastrand::Rng,
    ) -> Result<Self, SwarmError> {
        let clock = PhaseClock::new(settings.durations)?;
        Self::build(settings, params, clock, rng)
    }

    /// Build a swarm that is already in `phase`, which began at `start`.
    pub(crate) fn starting_in(
        settings: &AnimatorSettings,
        params: &ConstructionParams,
        phase: Phase,
        start: f64,
        rng: fastrand::Rng,
    ) -> Result<Self, SwarmError> {
        let clock = PhaseClock::starting_in(settings.durations, phase, start)?;
        Self::build(settings, params, clock, rng)
    }

    fn build(
        settings: &AnimatorSettings,
        params: &ConstructionParams,
        clock: PhaseClock,
        mut rng: fastrand::Rng,
    ) -> Result<Self, SwarmError> {
        settings.validate()?;
        params.validate()?;

        let half_height = params.half_height();
        let outline = settings.glyph.outline(half_height);
        let points = match params.layout {
            GlyphLayout::Strokes => glyph::sample(&outline, settings.sample_step, settings.sample_jitter, &mut rng)?,
            GlyphLayout::Blocks => {
                let points = glyph::sample(&outline, params.cell(), 0.0, &mut rng)?;
                glyph::snap_to_grid(&points, params.cell())
            }
        };
        let targets = glyph::place_targets(
            &points,
            params.particle_count,
            params.layout,
            settings.target_spread,
            settings.depth,
            params.glyph_offset,
            &mut rng,
        )?;
        let field = settings.scatter.scaled(params.spread);
        let rests = scatter::generate(params.particle_count, &field, &mut rng);

        let particles = targets
            .into_iter()
            .zip(rests)
            .enumerate()
            .map(|(index, (target, rest))| {
                let velocity = Vec3::new(rng.f32() - 0.5, rng.f32() - 0.5, rng.f32() - 0.5) * 0.02;
                let color = settings.palette.pick(&mut rng, target.y - params.glyph_offset.y, half_height);
                Particle::new(target, rest, velocity, color, index as u32)
            })
            .collect::<Vec<_>>();

        log::info!(
            "built {} swarm: {} particles from {} sample points, {} layout",
            settings.glyph,
            particles.len(),
            points.len(),
            params.layout
        );
        Ok(Self { clock, particles, motion: settings.motion.clone(), params: params.clone(), rng })
    }

    pub(crate) fn phase(&self) -> Phase {
        self.clock.phase()
    }

    pub(crate) fn phase_start(&self) -> Option<f64> {
        self.clock.phase_start()
    }

    pub(crate) fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub(crate) fn durations(&self) -> &PhaseDurations {
        self.clock.durations()
    }

    /// Advance to `now` (seconds) and compute this frame's transforms.
    pub(crate) fn tick(&mut self, now: f64) -> Frame {
        let reading = self.clock.advance(now);
        let progress = motion::eased(reading.phase, reading.progress);
        let time = now as f32;
        let strength = self.params.explosion_strength;
        let mut transforms = Vec::with_capacity(self.particles.len());
        for particle in &mut self.particles {
            let transform = motion::interpolate(reading.phase, progress, time, particle, &self.motion, strength);
            if reading.phase == Phase::Scattering {
                particle.settle(transform.position);
            }
            transforms.push(transform);
        }
        if reading.entered == Some(Phase::Scattering) {
            self.launch();
        }
        Frame {
            time: now,
            phase: Some(reading.phase),
            progress,
            group_rotation: motion::group_rotation(reading.phase, time, &self.motion),
            block_size: self.params.block_size,
            scale: self.params.scale,
            particles: transforms,
        }
    }

    /// Replace every particle's velocity with a fresh explosion direction.
    fn launch(&mut self) {
        let velocities: Vec<_> = self.particles.iter().map(|_| self.motion.burst(&mut self.rng)).collect();
        for (particle, velocity) in self.particles.iter_mut().zip(velocities) {
            particle.launch(velocity);
        }
    }
}
