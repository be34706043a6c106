//! Maps the elapsed fraction of an alarm's ramp onto a light intensity.
//!
//! Every curve starts at exactly `start` for `t = 0` and ends at exactly
//! `end` for `t = 1`. The one exception is a custom curve with fewer than two
//! control points, which is flat. Results are not clamped to `0..=100`, a
//! custom spline may overshoot its points and it is up to the caller to clamp.

use crate::alarm::{ControlPoint, CurveShape, IntensityCurve};

fn lerp(start: f64, end: f64, t: f64) -> f64 {
    (end - start).mul_add(t, start)
}

/// `1 - e^(-decay t)` scaled so that `t = 1` lands on one.
/// `exp_m1` keeps both ends exact for a tiny `decay`
fn asymptotic(decay: f64, t: f64) -> f64 {
    (-decay * t).exp_m1() / (-decay).exp_m1()
}

/// the logistic curve around `t = 0.5`, rescaled so it passes through 0 and 1.
/// written with `tanh`, the plain logistic difference cancels out to 0/0
/// for a tiny `sharpness`
fn s_curve(sharpness: f64, t: f64) -> f64 {
    let half = (sharpness / 4.0).tanh();
    0.5f64.mul_add((sharpness * (t - 0.5) / 2.0).tanh() / half, 0.5)
}

/// Catmull-Rom through the y values of `points`.
///
/// The points are spread evenly over `0..=1` by their position in the list,
/// their x values play no part. Missing neighbours at either end repeat the
/// end point. Two points give the straight line between them.
fn catmull_rom(points: &[ControlPoint], t: f64) -> f64 {
    let n = points.len();
    match n {
        0 => return 0.0,
        1 => return points[0].y,
        2 => return lerp(points[0].y, points[1].y, t),
        _ => {}
    }
    let last = n - 1;
    let scaled = t * last as f64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let seg = (scaled.max(0.0) as usize).min(n - 2);
    let u = scaled - seg as f64;

    let p0 = points[seg.saturating_sub(1)].y;
    let p1 = points[seg].y;
    let p2 = points[seg + 1].y;
    let p3 = points[(seg + 2).min(last)].y;

    let u2 = u * u;
    let u3 = u2 * u;
    0.5 * (2.0 * p1
        + (p2 - p0) * u
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * u2
        + (3.0 * p1 - p0 - 3.0 * p2 + p3) * u3)
}

impl IntensityCurve {
    /// intensity at `t`, the elapsed fraction of the ramp.
    /// callers keep `t` within `0..=1`
    #[must_use]
    pub fn evaluate(&self, t: f64) -> f64 {
        match &self.shape {
            CurveShape::Linear => lerp(self.start, self.end, t),
            CurveShape::Asymptotic { decay } => lerp(self.start, self.end, asymptotic(*decay, t)),
            CurveShape::SCurve { sharpness } => {
                lerp(self.start, self.end, s_curve(*sharpness, t))
            }
            CurveShape::Custom { points } => catmull_rom(points, t),
        }
    }

    /// `steps + 1` evenly spaced samples from `t = 0` to `t = 1`
    #[must_use]
    pub fn sample(&self, steps: usize) -> Vec<(f64, f64)> {
        let steps = steps.max(1);
        (0..=steps)
            .map(|i| {
                let t = i as f64 / steps as f64;
                (t, self.evaluate(t))
            })
            .collect()
    }
}
