mod canvas;
mod json;
mod terminal;

pub(crate) use canvas::{Camera, Canvas};
pub(crate) use json::JsonLinesSink;
pub(crate) use terminal::TerminalSink;

use crate::stage::LayerFrame;
use std::io;

/// Something that consumes the frames produced by a stage tick.
pub(crate) trait FrameSink {
    /// Present one tick's worth of layers. Layers at zero opacity may be skipped.
    fn present(&mut self, layers: &[LayerFrame]) -> Result<(), RenderError>;
}

/// Errors that can occur while presenting frames
#[derive(thiserror::Error, Debug)]
pub(crate) enum RenderError {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("serializing frame: {0}")]
    Serialize(#[from] serde_json::Error),
}
