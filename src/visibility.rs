use serde::{Deserialize, Serialize};

/// Fades a layer out as the page scrolls away from it.
///
/// Both thresholds are fractions of the viewport height.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ScrollFade {
    /// Scroll offset at which the fade begins.
    pub(crate) start: f32,

    /// Scroll offset at which the layer is fully transparent.
    pub(crate) end: f32,
}

impl Default for ScrollFade {
    fn default() -> Self {
        Self { start: 0.2, end: 0.8 }
    }
}

impl ScrollFade {
    /// The layer's opacity for a scroll offset and viewport height, both in pixels.
    pub(crate) fn opacity(&self, scroll: f32, viewport_height: f32) -> f32 {
        let fade_start = viewport_height * self.start;
        let fade_end = viewport_height * self.end;
        if scroll <= fade_start {
            1.0
        } else if scroll >= fade_end {
            0.0
        } else {
            (1.0 - (scroll - fade_start) / (fade_end - fade_start)).clamp(0.0, 1.0)
        }
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && 0.0 <= self.start && self.start < self.end
    }
}

/// Where the page is scrolled to.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct ScrollState {
    pub(crate) offset: f32,
    pub(crate) viewport_height: f32,
}
