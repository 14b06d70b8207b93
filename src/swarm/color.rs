use serde::{Deserialize, Serialize};

/// An RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub(crate) struct Color {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
}

impl Color {
    pub(crate) const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from a `0xrrggbb` literal.
    pub(crate) const fn from_hex(hex: u32) -> Self {
        Self::new((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    /// Scale the color's brightness by `factor` in `[0, 1]`.
    pub(crate) fn dimmed(self, factor: f32) -> Self {
        let factor = factor.clamp(0.0, 1.0);
        let scale = |c: u8| (c as f32 * factor).round() as u8;
        Self::new(scale(self.r), scale(self.g), scale(self.b))
    }
}

/// Convert HSL to RGB color
/// H: hue (0-360), S: saturation (0-100), L: lightness (0-100)
pub(crate) fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Color {
    let h = h.rem_euclid(360.0);
    let s = s.clamp(0.0, 100.0) / 100.0;
    let l = l.clamp(0.0, 100.0) / 100.0;

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = match h {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    Color::new(((r + m) * 255.0).round() as u8, ((g + m) * 255.0).round() as u8, ((b + m) * 255.0).round() as u8)
}

const MULTICOLOR: [Color; 10] = [
    Color::from_hex(0x00d4ff),
    Color::from_hex(0x00aaff),
    Color::from_hex(0x0066ff),
    Color::from_hex(0x6366f1),
    Color::from_hex(0x8b5cf6),
    Color::from_hex(0xa855f7),
    Color::from_hex(0xd946ef),
    Color::from_hex(0xec4899),
    Color::from_hex(0xf472b6),
    Color::from_hex(0x22d3ee),
];

const FROST_WHITE: Color = Color::new(242, 242, 255);
const FROST_PURPLE: Color = Color::new(178, 153, 255);
const FROST_CYAN: Color = Color::new(153, 230, 255);

/// The palette particle colors are drawn from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub(crate) enum Palette {
    /// Blue, cyan, purple and pink tones picked uniformly.
    #[default]
    Multicolor,

    /// Mostly white with purple and cyan tints.
    Frost,

    /// Purple at the bottom of the glyph fading into cyan at the top.
    Gradient,
}

impl Palette {
    /// Pick a color for a particle whose target sits at `height` within a glyph spanning
    /// `[-half_height, half_height]`.
    pub(crate) fn pick(&self, rng: &mut fastrand::Rng, height: f32, half_height: f32) -> Color {
        match self {
            Self::Multicolor => MULTICOLOR[rng.usize(..MULTICOLOR.len())],
            Self::Frost => match rng.f32() {
                choice if choice < 0.5 => FROST_WHITE,
                choice if choice < 0.75 => FROST_PURPLE,
                _ => FROST_CYAN,
            },
            Self::Gradient => {
                let t = if half_height > 0.0 {
                    ((height + half_height) / (2.0 * half_height)).clamp(0.0, 1.0)
                } else {
                    0.5
                };
                // 260 is violet, 190 is cyan
                hsl_to_rgb(260.0 - t * 70.0, 85.0, 62.0)
            }
        }
    }
}
