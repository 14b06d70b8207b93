use crate::{
    swarm::{AmbientField, Animator, Frame},
    visibility::{ScrollFade, ScrollState},
};
use serde::Serialize;
use std::fmt;

/// Identifies a mounted layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub(crate) struct LayerId(u64);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Errors that can occur when managing layers
#[derive(thiserror::Error, Debug, PartialEq)]
pub(crate) enum StageError {
    #[error("layer {0} is not mounted")]
    UnknownLayer(LayerId),
}

/// Anything the stage drives once per display refresh.
pub(crate) trait Animate: fmt::Debug {
    /// Advance to `now` (seconds) and compute the layer's frame.
    fn animate(&mut self, now: f64) -> Frame;

    /// How many particles every frame of this layer carries.
    fn particle_count(&self) -> usize;
}

impl Animate for Animator {
    fn animate(&mut self, now: f64) -> Frame {
        self.tick(now)
    }

    fn particle_count(&self) -> usize {
        self.particles().len()
    }
}

impl Animate for AmbientField {
    fn animate(&mut self, now: f64) -> Frame {
        self.tick(now)
    }

    fn particle_count(&self) -> usize {
        self.len()
    }
}

#[derive(Debug)]
struct Layer {
    id: LayerId,
    name: String,
    animation: Box<dyn Animate>,
    fade: Option<ScrollFade>,
}

/// One layer's output for a frame.
#[derive(Debug)]
pub(crate) struct LayerFrame {
    pub(crate) id: LayerId,
    pub(crate) name: String,
    /// How opaque the layer is; 0 means the renderer can skip it.
    pub(crate) opacity: f32,
    pub(crate) frame: Frame,
}

impl LayerFrame {
    pub(crate) fn is_hidden(&self) -> bool {
        self.opacity <= 0.0
    }
}

/// The set of layers updated on every display refresh.
///
/// Mounting a layer registers it for frame updates and unmounting deregisters it. A layer that is
/// scrolled out of view keeps ticking so it reappears mid-cycle rather than from scratch.
#[derive(Debug, Default)]
pub(crate) struct Stage {
    layers: Vec<Layer>,
    next_id: u64,
}

impl Stage {
    pub(crate) fn mount<S, A>(&mut self, name: S, animation: A, fade: Option<ScrollFade>) -> LayerId
    where
        S: Into<String>,
        A: Animate + 'static,
    {
        let id = LayerId(self.next_id);
        self.next_id += 1;
        let name = name.into();
        log::debug!("mounting layer {id} ({name}) next to {} others", self.len());
        self.layers.push(Layer { id, name, animation: Box::new(animation), fade });
        id
    }

    /// Deregister a layer, handing back its animation.
    pub(crate) fn unmount(&mut self, id: LayerId) -> Result<Box<dyn Animate>, StageError> {
        let index = self.layers.iter().position(|layer| layer.id == id).ok_or(StageError::UnknownLayer(id))?;
        let layer = self.layers.remove(index);
        log::debug!("unmounted layer {id} ({})", layer.name);
        Ok(layer.animation)
    }

    pub(crate) fn layer(&self, id: LayerId) -> Option<&dyn Animate> {
        self.layers.iter().find(|layer| layer.id == id).map(|layer| layer.animation.as_ref())
    }

    pub(crate) fn len(&self) -> usize {
        self.layers.len()
    }

    /// Drive every mounted layer to `now`.
    pub(crate) fn tick(&mut self, now: f64, scroll: ScrollState) -> Vec<LayerFrame> {
        self.layers
            .iter_mut()
            .map(|layer| {
                let opacity = layer.fade.map(|fade| fade.opacity(scroll.offset, scroll.viewport_height)).unwrap_or(1.0);
                LayerFrame { id: layer.id, name: layer.name.clone(), opacity, frame: layer.animation.animate(now) }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swarm::{AmbientParams, AnimatorSettings, ConstructionParams, Phase};

    fn animator() -> Animator {
        let settings = AnimatorSettings { seed: Some(99), ..Default::default() };
        let params = ConstructionParams { particle_count: 25, ..Default::default() };
        Animator::new(&settings, &params, settings.rng()).unwrap()
    }

    fn scrolled(offset: f32) -> ScrollState {
        ScrollState { offset, viewport_height: 1000.0 }
    }

    #[test]
    fn mount_and_unmount() {
        let mut stage = Stage::default();
        let hero = stage.mount("hero", animator(), None);
        let overlay = stage.mount("overlay", animator(), Some(ScrollFade::default()));
        assert_ne!(hero, overlay);
        assert_eq!(stage.len(), 2);

        let removed = stage.unmount(hero).expect("unmount failed");
        assert_eq!(removed.particle_count(), 25);
        assert!(stage.layer(hero).is_none());
        assert!(stage.layer(overlay).is_some());
        assert_eq!(stage.unmount(hero).unwrap_err(), StageError::UnknownLayer(hero));
    }

    #[test]
    fn unmounted_layers_stop_ticking() {
        let mut stage = Stage::default();
        let id = stage.mount("hero", animator(), None);
        stage.tick(0.0, scrolled(0.0));
        stage.unmount(id).unwrap();
        assert!(stage.tick(5.0, scrolled(0.0)).is_empty());
        assert!(stage.layer(id).is_none());
        assert_eq!(stage.len(), 0);
    }

    #[test]
    fn hidden_layers_keep_their_clock_running() {
        let mut stage = Stage::default();
        let id = stage.mount("overlay", animator(), Some(ScrollFade::default()));
        let frames = stage.tick(0.0, scrolled(0.0));
        assert_eq!(frames[0].opacity, 1.0);

        // scrolled far past the fade: hidden, but the swarm keeps cycling
        let mut now = 0.0;
        let mut last_hidden = None;
        while now < 2.0 {
            now += 1.0 / 60.0;
            let frames = stage.tick(now, scrolled(900.0));
            assert!(frames[0].is_hidden());
            assert_eq!(frames[0].id, id);
            last_hidden = frames[0].frame.phase;
        }
        assert_eq!(last_hidden, Some(Phase::Gathering));

        let frames = stage.tick(now + 0.01, scrolled(0.0));
        assert!(!frames[0].is_hidden());
        assert_eq!(frames[0].frame.phase, Some(Phase::Gathering));
    }

    #[test]
    fn swarms_and_ambient_fields_share_a_stage() {
        let mut stage = Stage::default();
        let params = AmbientParams { block_count: 12, ..Default::default() };
        let swarm = stage.mount("fullscreen", animator(), Some(ScrollFade::default()));
        let ambient = stage.mount("ambient", AmbientField::new(&params, fastrand::Rng::with_seed(4)).unwrap(), None);
        assert_eq!(stage.layer(ambient).map(|layer| layer.particle_count()), Some(12));

        let frames = stage.tick(0.0, scrolled(0.0));
        assert_eq!(frames.iter().map(|layer| layer.id).collect::<Vec<_>>(), vec![swarm, ambient]);
        assert_eq!(frames[0].frame.phase, Some(Phase::Scattered));
        assert_eq!(frames[1].frame.phase, None);
        assert_eq!(frames[1].frame.particles.len(), 12);
    }

    #[test]
    fn layers_without_fade_ignore_scroll() {
        let mut stage = Stage::default();
        stage.mount("hero", animator(), None);
        let frames = stage.tick(0.0, scrolled(10_000.0));
        assert_eq!(frames[0].opacity, 1.0);
        assert_eq!(frames[0].name, "hero");
    }
}
