use std::f32::consts::TAU;

/// Oscillation period of the elastic curve, in normalized progress units.
pub const ELASTIC_PERIOD: f32 = 0.3;

/// Elastic curve used for the resize bounce.
///
/// `elastic(0) == 0` and `elastic(1) == 1`; in between the value oscillates
/// with exponentially growing amplitude toward `t = 1`.
pub fn elastic(t: f32) -> f32 {
    if t == 0.0 || t == 1.0 {
        return t;
    }
    let shift = ELASTIC_PERIOD / TAU * 1.0_f32.asin();
    -(2.0_f32.powf(10.0 * (t - 1.0)) * ((t - 1.0 - shift) * TAU / ELASTIC_PERIOD).sin())
}

/// Maps linear progress to the eased interpolation factor.
///
/// Returns `1 + elastic(t)` while `t < 1` and exactly `1.0` once the
/// animation is complete. Values outside `[0, 1]` are expected before
/// completion; that overshoot is the bounce.
pub fn eased_progress(progress: f32) -> f32 {
    let t = if progress.is_nan() {
        1.0
    } else {
        progress.clamp(0.0, 1.0)
    };
    if t >= 1.0 {
        1.0
    } else {
        1.0 + elastic(t)
    }
}
