use super::{Camera, Canvas, FrameSink, RenderError};
use crate::{stage::LayerFrame, swarm::Color};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    style::{self, Print, ResetColor, SetForegroundColor},
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io::{self, Write};

/// Draws frames into a terminal using true color escape sequences.
///
/// The bottom row is kept for a status line; everything above it is canvas.
pub(crate) struct TerminalSink<W: Write> {
    writer: W,
    canvas: Canvas,
    camera: Camera,
    status: String,
    active: bool,
}

impl<W: Write> TerminalSink<W> {
    pub(crate) fn new(writer: W, camera: Camera, columns: u16, rows: u16) -> Self {
        let canvas = Canvas::new(columns, rows.saturating_sub(1));
        Self { writer, canvas, camera, status: String::new(), active: false }
    }

    /// Switch to the alternate screen in raw mode.
    pub(crate) fn enter(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(self.writer, EnterAlternateScreen, Hide, Clear(ClearType::All))?;
        self.active = true;
        Ok(())
    }

    /// Restore the terminal to the state it was in before [TerminalSink::enter].
    pub(crate) fn leave(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        execute!(self.writer, ResetColor, Show, LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub(crate) fn resize(&mut self, columns: u16, rows: u16) -> io::Result<()> {
        self.canvas.resize(columns, rows.saturating_sub(1));
        queue!(self.writer, Clear(ClearType::All))
    }

    pub(crate) fn set_status<S: Into<String>>(&mut self, status: S) {
        self.status = status.into();
    }

    fn flush_canvas(&mut self) -> io::Result<()> {
        let columns = self.canvas.columns();
        for row in 0..self.canvas.rows() {
            queue!(self.writer, MoveTo(0, row))?;
            let mut current: Option<Color> = None;
            for cell in self.canvas.row(row) {
                match cell {
                    Some(cell) => {
                        if current != Some(cell.color) {
                            let Color { r, g, b } = cell.color;
                            queue!(self.writer, SetForegroundColor(style::Color::Rgb { r, g, b }))?;
                            current = Some(cell.color);
                        }
                        queue!(self.writer, Print(cell.symbol))?;
                    }
                    None => queue!(self.writer, Print(' '))?,
                }
            }
        }
        let status: String = self.status.chars().take(columns as usize).collect();
        queue!(
            self.writer,
            ResetColor,
            MoveTo(0, self.canvas.rows()),
            Clear(ClearType::CurrentLine),
            Print(status)
        )?;
        self.writer.flush()
    }
}

impl<W: Write> FrameSink for TerminalSink<W> {
    fn present(&mut self, layers: &[LayerFrame]) -> Result<(), RenderError> {
        self.canvas.clear();
        for layer in layers {
            self.canvas.draw(layer, &self.camera);
        }
        self.flush_canvas()?;
        Ok(())
    }
}

impl<W: Write> Drop for TerminalSink<W> {
    fn drop(&mut self) {
        if let Err(e) = self.leave() {
            log::warn!("failed to restore terminal: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        stage::Stage,
        swarm::{Animator, AnimatorSettings, ConstructionParams, Phase},
        visibility::ScrollState,
    };

    fn formed_layers() -> Vec<LayerFrame> {
        let settings = AnimatorSettings { seed: Some(21), ..Default::default() };
        let params = ConstructionParams { particle_count: 200, ..Default::default() };
        let animator = Animator::starting_in(&settings, &params, Phase::Formed, 0.0, settings.rng()).unwrap();
        let mut stage = Stage::default();
        stage.mount("hero", animator, None);
        stage.tick(1.0, ScrollState::default())
    }

    #[test]
    fn writes_colored_cells_and_status() {
        let mut sink = TerminalSink::new(Vec::new(), Camera::default(), 40, 12);
        sink.set_status("formed");
        sink.present(&formed_layers()).unwrap();
        let output = String::from_utf8(std::mem::take(&mut sink.writer)).unwrap();
        assert!(output.contains("\x1b[38;2;"));
        assert!(output.ends_with("formed"));
        // 11 canvas rows plus the status line
        assert_eq!(output.matches('H').count(), 12);
    }

    #[test]
    fn status_is_truncated_to_the_width() {
        let mut sink = TerminalSink::new(Vec::new(), Camera::default(), 5, 3);
        sink.set_status("a very long status line");
        sink.present(&[]).unwrap();
        let output = String::from_utf8(std::mem::take(&mut sink.writer)).unwrap();
        assert!(output.ends_with("a ver"));
    }

    #[test]
    fn inactive_sink_does_not_touch_the_terminal() {
        let mut sink = TerminalSink::new(Vec::new(), Camera::default(), 10, 4);
        sink.leave().unwrap();
        assert!(sink.writer.is_empty());
    }
}
