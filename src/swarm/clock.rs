use super::{SwarmError, easing::clamp_progress};
use serde::{Deserialize, Serialize};

/// The four states a swarm cycles through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, strum::Display, strum::EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub(crate) enum Phase {
    /// Drifting around the scatter field.
    Scattered,

    /// Flying from the scatter field into the glyph.
    Gathering,

    /// Holding the glyph shape.
    Formed,

    /// Exploding outwards from the glyph.
    Scattering,
}

impl Phase {
    /// The phase that follows this one.
    pub(crate) fn next(self) -> Self {
        match self {
            Self::Scattered => Self::Gathering,
            Self::Gathering => Self::Formed,
            Self::Formed => Self::Scattering,
            Self::Scattering => Self::Scattered,
        }
    }
}

/// How long each phase lasts, in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PhaseDurations {
    pub(crate) scattered: f64,
    pub(crate) gathering: f64,
    pub(crate) formed: f64,
    pub(crate) scattering: f64,
}

impl Default for PhaseDurations {
    fn default() -> Self {
        Self { scattered: 1.0, gathering: 2.5, formed: 3.0, scattering: 2.0 }
    }
}

impl PhaseDurations {
    pub(crate) fn of(&self, phase: Phase) -> f64 {
        match phase {
            Phase::Scattered => self.scattered,
            Phase::Gathering => self.gathering,
            Phase::Formed => self.formed,
            Phase::Scattering => self.scattering,
        }
    }

    /// Every duration must be finite and strictly positive.
    pub(crate) fn validate(&self) -> Result<(), SwarmError> {
        use strum::IntoEnumIterator;
        for phase in Phase::iter() {
            let duration = self.of(phase);
            if !duration.is_finite() || duration <= 0.0 {
                return Err(SwarmError::InvalidDuration(phase, duration));
            }
        }
        Ok(())
    }

    /// The length of one full cycle.
    pub(crate) fn cycle(&self) -> f64 {
        self.scattered + self.gathering + self.formed + self.scattering
    }
}

/// What the clock says about a single tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ClockReading {
    /// The phase this tick renders in.
    pub(crate) phase: Phase,

    /// Linear progress through `phase`, clamped to `[0, 1]`.
    pub(crate) progress: f32,

    /// The phase entered at the end of this tick, if the current one ran out.
    pub(crate) entered: Option<Phase>,
}

/// A cyclic four state timer.
///
/// A tick always renders the phase that was active when it arrived: the tick that exhausts a
/// phase renders that phase at full progress and the following tick starts the next one.
#[derive(Clone, Debug)]
pub(crate) struct PhaseClock {
    phase: Phase,
    phase_start: Option<f64>,
    durations: PhaseDurations,
}

impl PhaseClock {
    /// A clock in the scattered phase, anchored by the first tick it sees.
    pub(crate) fn new(durations: PhaseDurations) -> Result<Self, SwarmError> {
        durations.validate()?;
        Ok(Self { phase: Phase::Scattered, phase_start: None, durations })
    }

    /// A clock already in `phase`, which began at `start`.
    pub(crate) fn starting_in(durations: PhaseDurations, phase: Phase, start: f64) -> Result<Self, SwarmError> {
        durations.validate()?;
        Ok(Self { phase, phase_start: Some(start), durations })
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn phase_start(&self) -> Option<f64> {
        self.phase_start
    }

    pub(crate) fn durations(&self) -> &PhaseDurations {
        &self.durations
    }

    pub(crate) fn advance(&mut self, now: f64) -> ClockReading {
        let start = *self.phase_start.get_or_insert(now);
        // a clock that goes backwards is treated as standing still
        let elapsed = (now - start).max(0.0);
        let duration = self.durations.of(self.phase);
        let phase = self.phase;
        let progress = clamp_progress(elapsed / duration);

        let entered = if elapsed >= duration {
            self.phase = phase.next();
            self.phase_start = Some(now);
            log::debug!("phase {phase} finished after {elapsed:.3}s, entering {}", self.phase);
            Some(self.phase)
        } else {
            None
        };
        ClockReading { phase, progress, entered }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn first_tick_anchors_the_clock() {
        let mut clock = PhaseClock::new(PhaseDurations::default()).unwrap();
        assert_eq!(clock.phase_start(), None);
        let reading = clock.advance(42.0);
        assert_eq!(reading, ClockReading { phase: Phase::Scattered, progress: 0.0, entered: None });
        assert_eq!(clock.phase_start(), Some(42.0));
    }

    #[test]
    fn visits_phases_in_cyclic_order() {
        let durations = PhaseDurations { scattered: 0.3, gathering: 0.7, formed: 0.5, scattering: 0.4 };
        let mut clock = PhaseClock::new(durations).unwrap();
        let dt = 1.0 / 60.0;
        let mut visited = vec![clock.phase()];
        let mut time_in_phase = Vec::new();
        let mut last_change = 0.0;
        for frame in 0..=600 {
            let now = frame as f64 * dt;
            if let Some(entered) = clock.advance(now).entered {
                time_in_phase.push((*visited.last().unwrap(), now - last_change));
                visited.push(entered);
                last_change = now;
            }
        }
        let expected = [Phase::Scattered, Phase::Gathering, Phase::Formed, Phase::Scattering];
        for (index, phase) in visited.iter().enumerate() {
            assert_eq!(*phase, expected[index % 4]);
        }
        assert!(visited.len() > 8);
        for (phase, spent) in time_in_phase {
            let duration = durations.of(phase);
            assert!(spent >= duration - 1e-9 && spent < duration + dt + 1e-9, "{phase} lasted {spent}");
        }
    }

    #[test]
    fn exhausting_tick_renders_full_progress() {
        let mut clock = PhaseClock::starting_in(PhaseDurations::default(), Phase::Gathering, 0.0).unwrap();
        let reading = clock.advance(2.5);
        assert_eq!(reading.phase, Phase::Gathering);
        assert_eq!(reading.progress, 1.0);
        assert_eq!(reading.entered, Some(Phase::Formed));
        assert_eq!(clock.phase_start(), Some(2.5));

        let reading = clock.advance(2.5);
        assert_eq!(reading, ClockReading { phase: Phase::Formed, progress: 0.0, entered: None });
    }

    #[test]
    fn late_frame_is_clamped() {
        let mut clock = PhaseClock::starting_in(PhaseDurations::default(), Phase::Scattering, 0.0).unwrap();
        let reading = clock.advance(9.0);
        assert_eq!(reading.progress, 1.0);
        // one transition per tick, however late
        assert_eq!(reading.entered, Some(Phase::Scattered));
        assert_eq!(clock.phase(), Phase::Scattered);
    }

    #[test]
    fn time_going_backwards_stands_still() {
        let mut clock = PhaseClock::starting_in(PhaseDurations::default(), Phase::Formed, 10.0).unwrap();
        let reading = clock.advance(4.0);
        assert_eq!(reading, ClockReading { phase: Phase::Formed, progress: 0.0, entered: None });
    }

    #[rstest]
    #[case::zero_scattered(PhaseDurations { scattered: 0.0, ..Default::default() }, Phase::Scattered)]
    #[case::negative_gathering(PhaseDurations { gathering: -1.0, ..Default::default() }, Phase::Gathering)]
    #[case::nan_formed(PhaseDurations { formed: f64::NAN, ..Default::default() }, Phase::Formed)]
    #[case::infinite_scattering(PhaseDurations { scattering: f64::INFINITY, ..Default::default() }, Phase::Scattering)]
    fn invalid_durations(#[case] durations: PhaseDurations, #[case] offending: Phase) {
        let error = PhaseClock::new(durations).unwrap_err();
        assert!(matches!(error, SwarmError::InvalidDuration(phase, _) if phase == offending));
    }

    #[test]
    fn cycle_length() {
        assert_eq!(PhaseDurations::default().cycle(), 8.5);
    }
}
