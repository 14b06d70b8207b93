use super::{FrameSink, RenderError};
use crate::{
    stage::{LayerFrame, LayerId},
    swarm::Frame,
};
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct LayerRecord<'a> {
    layer: LayerId,
    name: &'a str,
    opacity: f32,
    #[serde(flatten)]
    frame: &'a Frame,
}

/// Writes every visible layer of every frame as one JSON object per line.
pub(crate) struct JsonLinesSink<W: Write> {
    writer: W,
    records: usize,
}

impl<W: Write> JsonLinesSink<W> {
    pub(crate) fn new(writer: W) -> Self {
        Self { writer, records: 0 }
    }

    /// How many lines have been written so far.
    pub(crate) fn records(&self) -> usize {
        self.records
    }

    pub(crate) fn into_inner(mut self) -> Result<W, RenderError> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> FrameSink for JsonLinesSink<W> {
    fn present(&mut self, layers: &[LayerFrame]) -> Result<(), RenderError> {
        for layer in layers.iter().filter(|layer| !layer.is_hidden()) {
            let record =
                LayerRecord { layer: layer.id, name: &layer.name, opacity: layer.opacity, frame: &layer.frame };
            serde_json::to_writer(&mut self.writer, &record)?;
            self.writer.write_all(b"\n")?;
            self.records += 1;
        }
        Ok(())
    }
}
