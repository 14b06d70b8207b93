use crate::{
    config::Config,
    render::Camera,
    stage::{LayerFrame, LayerId, Stage},
    swarm::{AmbientField, AmbientParams, Animator, AnimatorSettings, ConstructionParams, SwarmError},
    viewport::{Variant, Viewport, ViewportAdapter, ViewportEvent},
    visibility::{ScrollFade, ScrollState},
};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

// Nominal terminal cell size in pixels, used to map the grid onto the page breakpoints.
const CELL_WIDTH_PX: f32 = 8.0;
const CELL_HEIGHT_PX: f32 = 16.0;

/// The viewport a terminal of `columns` by `rows` cells stands in for, and its height in pixels.
pub(crate) fn terminal_viewport(columns: u16, rows: u16, camera: &Camera) -> (Viewport, f32) {
    let viewport = Viewport {
        width: columns as f32 * CELL_WIDTH_PX,
        scene_width: camera.scene_width(columns, rows.saturating_sub(1)),
    };
    (viewport, rows as f32 * CELL_HEIGHT_PX)
}

/// What the user asked for.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Command {
    Quit,
    Scroll(f32),
    Remount,
    Resize(u16, u16),
}

impl Command {
    pub(crate) fn from_event(event: &Event, scroll_step: f32) -> Option<Self> {
        match event {
            Event::Key(KeyEvent { code, modifiers, kind: KeyEventKind::Press, .. }) => match code {
                KeyCode::Char('q') | KeyCode::Esc => Some(Self::Quit),
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Some(Self::Quit),
                KeyCode::Char('r') => Some(Self::Remount),
                KeyCode::Down => Some(Self::Scroll(scroll_step)),
                KeyCode::Up => Some(Self::Scroll(-scroll_step)),
                KeyCode::PageDown => Some(Self::Scroll(scroll_step * 10.0)),
                KeyCode::PageUp => Some(Self::Scroll(-scroll_step * 10.0)),
                _ => None,
            },
            Event::Resize(columns, rows) => Some(Self::Resize(*columns, *rows)),
            _ => None,
        }
    }
}

/// One variant's swarm, and its ambient blocks if it has any, on a stage rebuilt whenever the
/// viewport changes class.
#[derive(Debug)]
pub(crate) struct Session {
    variant: Variant,
    settings: AnimatorSettings,
    adapter: ViewportAdapter,
    fade: Option<ScrollFade>,
    stage: Stage,
    layers: Vec<LayerId>,
    params: Option<ConstructionParams>,
    ambient: Option<AmbientParams>,
    scroll: ScrollState,
}

impl Session {
    pub(crate) fn new(config: &Config, variant: Variant) -> Self {
        Self {
            variant,
            settings: config.settings_for(variant),
            adapter: ViewportAdapter::new(config.profiles_for(variant).clone(), variant),
            fade: config.fade_for(variant),
            stage: Stage::default(),
            layers: Vec::new(),
            params: None,
            ambient: None,
            scroll: ScrollState::default(),
        }
    }

    /// Feed the current viewport, rebuilding or hiding the swarm if its class changed.
    pub(crate) fn observe(&mut self, viewport: Viewport, viewport_height: f32) -> Result<(), SwarmError> {
        self.scroll.viewport_height = viewport_height;
        match self.adapter.observe(viewport) {
            Some(ViewportEvent::Rebuild(params)) => {
                self.params = Some(params);
                self.ambient = self.adapter.ambient();
                self.remount()
            }
            Some(ViewportEvent::Hide) => {
                log::info!("{} swarm hidden at {} px", self.variant, viewport.width);
                self.params = None;
                self.ambient = None;
                self.unmount();
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Tear the current layers down and build fresh ones in their place.
    pub(crate) fn remount(&mut self) -> Result<(), SwarmError> {
        self.unmount();
        let Some(params) = &self.params else {
            return Ok(());
        };
        let animator = Animator::new(&self.settings, params, self.settings.rng())?;
        self.layers.push(self.stage.mount(self.variant.to_string(), animator, self.fade));
        if let Some(ambient) = &self.ambient {
            let field = AmbientField::new(ambient, self.settings.rng())?;
            self.layers.push(self.stage.mount(format!("{} ambient", self.variant), field, self.fade));
        }
        Ok(())
    }

    fn unmount(&mut self) {
        for id in self.layers.drain(..) {
            if let Err(e) = self.stage.unmount(id) {
                log::warn!("{e}");
            }
        }
    }

    /// The swarm's layer, if one is mounted.
    pub(crate) fn layer(&self) -> Option<LayerId> {
        self.layers.first().copied()
    }

    pub(crate) fn layers(&self) -> &[LayerId] {
        &self.layers
    }

    pub(crate) fn scroll(&self) -> ScrollState {
        self.scroll
    }

    pub(crate) fn scroll_by(&mut self, delta: f32) {
        self.scroll.offset = (self.scroll.offset + delta).max(0.0);
    }

    pub(crate) fn tick(&mut self, now: f64) -> Vec<LayerFrame> {
        self.stage.tick(now, self.scroll)
    }

    /// A one line summary of the frame for the preview's status bar.
    pub(crate) fn status(&self, layers: &[LayerFrame]) -> String {
        let keys = "q quit, ↑/↓ scroll, r restart";
        let class = self.adapter.class().map(|class| class.to_string()).unwrap_or_default();
        let swarm = layers.iter().find(|layer| Some(layer.id) == self.layer());
        let Some((layer, phase)) = swarm.and_then(|layer| Some((layer, layer.frame.phase?))) else {
            return format!(" {} hidden at this width ({class}) | {keys}", self.variant);
        };
        let particles = layer.frame.particles.len();
        let ambient = match self.layers.get(1).and_then(|id| self.stage.layer(*id)) {
            Some(field) => format!(" + {} ambient", field.particle_count()),
            None => String::new(),
        };
        format!(
            " {} ({class}, {particles} particles{ambient}) | {phase} {:.2} | opacity {:.2} | scroll {:.0}px | {keys}",
            layer.name, layer.frame.progress, layer.opacity, self.scroll.offset
        )
    }
}
