use super::SwarmError;
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Upper bound on the points a single primitive may emit, so a tiny step can't exhaust memory.
const MAX_POINTS_PER_PRIMITIVE: usize = 250_000;

/// Stroke width relative to the glyph's half height.
const STROKE_RATIO: f32 = 0.4 / 2.4;

/// Horizontal reach of each arm relative to the glyph's half height.
const ARM_REACH_RATIO: f32 = 1.3 / 2.4;

/// A geometric building block of a glyph silhouette.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Primitive {
    /// A filled axis-aligned rectangle.
    Rect { min: Vec2, max: Vec2 },

    /// A line segment thickened perpendicular to its direction.
    Stroke { from: Vec2, to: Vec2, width: f32 },
}

impl Primitive {
    fn sample(&self, step: f32, points: &mut Vec<Vec2>) {
        match self {
            Self::Rect { min, max } => {
                let columns = steps_across(max.x - min.x, step);
                let rows = steps_across(max.y - min.y, step);
                for row in 0..rows {
                    for column in 0..columns {
                        points.push(Vec2::new(min.x + column as f32 * step, min.y + row as f32 * step));
                    }
                }
            }
            Self::Stroke { from, to, width } => {
                let along = *to - *from;
                let length = along.length();
                let direction = along.normalize_or_zero();
                let normal = direction.perp();
                let lengthwise = steps_across(length, step);
                let crosswise = steps_across(*width, step);
                for i in 0..lengthwise {
                    let center = *from + direction * (i as f32 * step);
                    for j in 0..crosswise {
                        let offset = -width / 2.0 + j as f32 * step;
                        points.push(center + normal * offset);
                    }
                }
            }
        }
    }

    fn center(&self) -> Vec2 {
        match self {
            Self::Rect { min, max } => (*min + *max) / 2.0,
            Self::Stroke { from, to, .. } => (*from + *to) / 2.0,
        }
    }
}

/// How many samples fit across `extent` at `step`, endpoints included and capped.
fn steps_across(extent: f32, step: f32) -> usize {
    if !extent.is_finite() || extent <= 0.0 {
        return 1;
    }
    let count = (extent / step + 1e-4).floor();
    (count as usize).saturating_add(1).min(MAX_POINTS_PER_PRIMITIVE)
}

/// A glyph described as a union of primitives.
#[derive(Clone, Debug)]
pub(crate) struct GlyphOutline {
    primitives: Vec<Primitive>,
}

impl GlyphOutline {
    pub(crate) fn new(primitives: Vec<Primitive>) -> Self {
        Self { primitives }
    }

    /// The letter K: a stem, two arms leaving the stem's middle at the same angle, and a solid
    /// junction where they meet. The outline is horizontally centered on the origin.
    pub(crate) fn letter_k(half_height: f32) -> Self {
        let width = half_height * STROKE_RATIO;
        let reach = half_height * ARM_REACH_RATIO;
        let left = -(width + reach) / 2.0;
        let arm_root = Vec2::new(left + width, 0.0);
        let primitives = vec![
            Primitive::Rect { min: Vec2::new(left, -half_height), max: Vec2::new(left + width, half_height) },
            Primitive::Stroke { from: arm_root, to: arm_root + Vec2::new(reach, half_height), width },
            Primitive::Stroke { from: arm_root, to: arm_root + Vec2::new(reach, -half_height), width },
            Primitive::Rect { min: Vec2::new(left, -width), max: Vec2::new(left + width * 1.5, width) },
        ];
        Self::new(primitives)
    }

    pub(crate) fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }
}

/// Which glyph a swarm forms.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub(crate) enum Glyph {
    #[default]
    K,
}

impl Glyph {
    pub(crate) fn outline(&self, half_height: f32) -> GlyphOutline {
        match self {
            Self::K => GlyphOutline::letter_k(half_height),
        }
    }
}

/// How sample points become particle targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub(crate) enum GlyphLayout {
    /// Continuous strokes; every particle lands on a random sample point.
    #[default]
    Strokes,

    /// A grid of cubes; sample points snap to cells and particles fill cells in order.
    Blocks,
}

/// Sample an outline into 2D points spaced `step` apart.
///
/// Every point is nudged by up to `jitter / 2` on each axis. Every primitive contributes at least
/// its center, so a coarse step never yields an empty shape.
pub(crate) fn sample(
    outline: &GlyphOutline,
    step: f32,
    jitter: f32,
    rng: &mut fastrand::Rng,
) -> Result<Vec<Vec2>, SwarmError> {
    if !step.is_finite() || step <= 0.0 {
        return Err(SwarmError::InvalidParameter("sample step", step as f64));
    }
    let mut points = Vec::new();
    for primitive in &outline.primitives {
        let before = points.len();
        primitive.sample(step, &mut points);
        if points.len() == before {
            points.push(primitive.center());
        }
    }
    if points.is_empty() {
        return Err(SwarmError::EmptyShape);
    }
    if jitter > 0.0 {
        for point in &mut points {
            point.x += (rng.f32() - 0.5) * jitter;
            point.y += (rng.f32() - 0.5) * jitter;
        }
    }
    Ok(points)
}

/// Snap points to a grid of `unit` sized cells, keeping the first point seen in each cell.
pub(crate) fn snap_to_grid(points: &[Vec2], unit: f32) -> Vec<Vec2> {
    let mut seen = std::collections::HashSet::new();
    points
        .iter()
        .filter_map(|point| {
            let cell = ((point.x / unit).round() as i64, (point.y / unit).round() as i64);
            seen.insert(cell).then(|| Vec2::new(cell.0 as f32 * unit, cell.1 as f32 * unit))
        })
        .collect()
}

/// Turn sample points into `count` 3D targets.
///
/// For strokes, `depth` is the glyph's thickness along z and `spread` the extra per-target scatter
/// in the plane; both are applied as uniform noise centered on the sample point. Blocks sit exactly
/// on their grid cell at z = 0.
pub(crate) fn place_targets(
    points: &[Vec2],
    count: usize,
    layout: GlyphLayout,
    spread: f32,
    depth: f32,
    offset: Vec2,
    rng: &mut fastrand::Rng,
) -> Result<Vec<Vec3>, SwarmError> {
    if points.is_empty() {
        return Err(SwarmError::EmptyShape);
    }
    let targets = (0..count)
        .map(|index| {
            let (point, noise) = match layout {
                GlyphLayout::Strokes => {
                    let point = points[rng.usize(..points.len())];
                    let noise = Vec3::new(rng.f32() - 0.5, rng.f32() - 0.5, 0.0) * spread;
                    (point, noise + Vec3::Z * (rng.f32() - 0.5) * depth)
                }
                GlyphLayout::Blocks => (points[index % points.len()], Vec3::ZERO),
            };
            (point + offset).extend(0.0) + noise
        })
        .collect();
    Ok(targets)
}
