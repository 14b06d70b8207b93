/// Clamp a phase-local progress value into `[0, 1]`.
///
/// Late frames can push `elapsed / duration` past 1 and a NaN must never reach the interpolator,
/// so anything that isn't a finite number maps to 0.
pub(crate) fn clamp_progress(progress: f64) -> f32 {
    if progress.is_nan() {
        return 0.0;
    }
    progress.clamp(0.0, 1.0) as f32
}

/// Quartic ease-out: fast start, gentle landing.
pub(crate) fn ease_out_quart(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(4)
}

/// Cubic ease-in-out.
pub(crate) fn ease_in_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 { 4.0 * t * t * t } else { 1.0 - (-2.0 * t + 2.0).powi(3) / 2.0 }
}
