use crate::swarm::{AmbientParams, ConstructionParams, GlyphLayout, SwarmError};
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Coarse screen size classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum ViewportClass {
    Narrow,
    Wide,
}

/// Which decorative visual a swarm belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub(crate) enum Variant {
    /// The hero section visual, shown at every width.
    #[default]
    Hero,

    /// The page-wide overlay, hidden on narrow screens and faded out by scrolling.
    Fullscreen,
}

/// A snapshot of the viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Viewport {
    /// Width in CSS pixels.
    pub(crate) width: f32,

    /// Width of the visible scene in scene units at the glyph's depth.
    pub(crate) scene_width: f32,
}

/// Pushes the glyph further right on scenes wide enough to fit it beside the page content.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LargeScene {
    pub(crate) min_scene_width: f32,
    pub(crate) offset_x: f32,
}

/// Ambient block parameters for each viewport class.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct AmbientProfiles {
    pub(crate) narrow: AmbientParams,
    pub(crate) wide: AmbientParams,
}

impl Default for AmbientProfiles {
    fn default() -> Self {
        Self { narrow: AmbientParams::narrow(), wide: AmbientParams::default() }
    }
}

/// Construction parameters for each viewport class.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ViewportProfiles {
    /// Widths strictly below this many pixels are narrow.
    pub(crate) breakpoint: f32,

    pub(crate) narrow: ConstructionParams,

    pub(crate) wide: ConstructionParams,

    /// Wide glyph offset override for large scenes.
    pub(crate) large_scene: Option<LargeScene>,

    /// Translucent blocks drifting behind the glyph.
    pub(crate) ambient: Option<AmbientProfiles>,
}

impl Default for ViewportProfiles {
    fn default() -> Self {
        Self {
            breakpoint: 768.0,
            narrow: ConstructionParams {
                particle_count: 1200,
                spread: 0.6,
                glyph_offset: Vec2::new(0.0, -0.5),
                height_units: 90,
                scale: 0.6,
                explosion_strength: 12.0,
                ..Default::default()
            },
            wide: ConstructionParams::default(),
            large_scene: None,
            ambient: None,
        }
    }
}

impl ViewportProfiles {
    pub(crate) fn classify(&self, width: f32) -> ViewportClass {
        if width < self.breakpoint { ViewportClass::Narrow } else { ViewportClass::Wide }
    }

    /// The construction parameters for a viewport of class `class`.
    pub(crate) fn params_for(&self, class: ViewportClass, scene_width: f32) -> ConstructionParams {
        match class {
            ViewportClass::Narrow => self.narrow.clone(),
            ViewportClass::Wide => {
                let mut params = self.wide.clone();
                if let Some(large) = &self.large_scene {
                    if scene_width > large.min_scene_width {
                        params.glyph_offset.x = large.offset_x;
                    }
                }
                params
            }
        }
    }

    pub(crate) fn validate(&self) -> Result<(), SwarmError> {
        if !self.breakpoint.is_finite() || self.breakpoint <= 0.0 {
            return Err(SwarmError::InvalidParameter("breakpoint", self.breakpoint as f64));
        }
        self.narrow.validate()?;
        self.wide.validate()?;
        if let Some(ambient) = &self.ambient {
            ambient.narrow.validate()?;
            ambient.wide.validate()?;
        }
        Ok(())
    }

    /// Profiles for the page-wide block overlay.
    pub(crate) fn fullscreen_blocks() -> Self {
        let blocks = ConstructionParams { layout: GlyphLayout::Blocks, block_gap: 0.03, ..Default::default() };
        Self {
            breakpoint: 768.0,
            narrow: ConstructionParams {
                particle_count: 160,
                block_size: 0.15,
                block_gap: 0.018,
                spread: 0.6,
                glyph_offset: Vec2::new(0.0, -0.5),
                height_units: 14,
                scale: 0.6,
                explosion_strength: 12.0,
                ..blocks.clone()
            },
            wide: ConstructionParams {
                particle_count: 260,
                block_size: 0.28,
                glyph_offset: Vec2::new(2.5, -1.2),
                height_units: 22,
                explosion_strength: 20.0,
                ..blocks
            },
            large_scene: Some(LargeScene { min_scene_width: 10.0, offset_x: 3.5 }),
            ambient: Some(AmbientProfiles::default()),
        }
    }
}

/// What the owner of a swarm should do after a viewport change.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ViewportEvent {
    /// Tear the swarm down and build a new one with these parameters.
    Rebuild(ConstructionParams),

    /// Tear the swarm down and render nothing.
    Hide,
}

/// Watches the viewport and reports when a swarm needs rebuilding.
#[derive(Debug)]
pub(crate) struct ViewportAdapter {
    profiles: ViewportProfiles,
    variant: Variant,
    current: Option<ViewportClass>,
}

impl ViewportAdapter {
    pub(crate) fn new(profiles: ViewportProfiles, variant: Variant) -> Self {
        Self { profiles, variant, current: None }
    }

    pub(crate) fn class(&self) -> Option<ViewportClass> {
        self.current
    }

    /// Ambient block parameters for the current class, if the profiles have any.
    pub(crate) fn ambient(&self) -> Option<AmbientParams> {
        let ambient = self.profiles.ambient.as_ref()?;
        match self.current? {
            ViewportClass::Narrow => Some(ambient.narrow.clone()),
            ViewportClass::Wide => Some(ambient.wide.clone()),
        }
    }

    /// Feed a viewport observation; returns an event only when the class changes.
    pub(crate) fn observe(&mut self, viewport: Viewport) -> Option<ViewportEvent> {
        let class = self.profiles.classify(viewport.width);
        if self.current == Some(class) {
            return None;
        }
        log::debug!("viewport is now {class} ({} px wide)", viewport.width);
        self.current = Some(class);
        match (self.variant, class) {
            (Variant::Fullscreen, ViewportClass::Narrow) => Some(ViewportEvent::Hide),
            _ => Some(ViewportEvent::Rebuild(self.profiles.params_for(class, viewport.scene_width))),
        }
    }
}
