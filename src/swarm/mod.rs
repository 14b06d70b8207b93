mod ambient;
mod animator;
mod clock;
mod color;
mod easing;
mod glyph;
mod motion;
mod particle;
mod scatter;

pub(crate) use ambient::{AmbientField, AmbientParams};
pub(crate) use animator::{Animator, AnimatorSettings, ConstructionParams, Frame};
pub(crate) use clock::Phase;
pub(crate) use color::{Color, Palette};
pub(crate) use glyph::GlyphLayout;
pub(crate) use scatter::ScatterField;

/// Errors that can occur when building a swarm
#[derive(thiserror::Error, Debug)]
pub(crate) enum SwarmError {
    #[error("phase '{0}' must last a positive number of seconds, got {1}")]
    InvalidDuration(Phase, f64),

    #[error("a swarm needs at least one particle")]
    NoParticles,

    #[error("the glyph produced no sample points")]
    EmptyShape,

    #[error("invalid {0}: {1}")]
    InvalidParameter(&'static str, f64),
}
