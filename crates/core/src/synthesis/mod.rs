//! Interpolation and synthesis of time-series-like fixture data.
//!
//! Everything here is a pure function of its arguments plus an injected
//! random source. Production code passes an entropy-seeded RNG; tests pass a
//! seeded [`rand::rngs::StdRng`] to get reproducible output.
//!
//! Interpolation parameters outside `[0, 1]` are clamped.

pub mod drift;

use rand::Rng;
use std::f64::consts::PI;

/// Attempts at drawing a non-zero uniform before falling back to the
/// smallest positive value.
const MAX_NONZERO_DRAWS: usize = 8;

/// Linear interpolation from `a` (at `t = 0`) to `b` (at `t = 1`).
///
/// `t` is clamped to `[0, 1]`. Both endpoints are returned exactly, and the
/// result never leaves the interval spanned by `a` and `b`, so it is
/// monotonic in `t` despite floating point rounding.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    let t = clamp_unit(t);
    if t >= 1.0 {
        return b;
    }
    let value = a + (b - a) * t;
    if a.is_nan() || b.is_nan() {
        return value;
    }
    value.clamp(a.min(b), a.max(b))
}

/// Clamp an interpolation parameter into `[0, 1]`. NaN maps to 0.
pub fn clamp_unit(t: f64) -> f64 {
    if t.is_nan() {
        0.0
    } else {
        t.clamp(0.0, 1.0)
    }
}

/// Round to three decimals, the precision drift scores and PSI are shown at.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Uniform draw in `(0, 1)`, never exactly zero.
fn nonzero_unit<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    for _ in 0..MAX_NONZERO_DRAWS {
        let u: f64 = rng.gen();
        if u > 0.0 {
            return u;
        }
    }
    f64::MIN_POSITIVE
}

/// One normal sample via the Box-Muller transform.
///
/// `z = sqrt(-2 ln u1) * cos(2 pi u2)`, returned as `mean + z * spread`.
/// `u1` is redrawn when it comes out as exactly zero.
pub fn gaussian_sample<R: Rng + ?Sized>(mean: f64, spread: f64, rng: &mut R) -> f64 {
    let u1 = nonzero_unit(rng);
    let u2: f64 = rng.gen();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
    mean + z * spread
}

/// Samples for one histogram: clamped at zero and rounded to whole counts.
fn count_samples<R: Rng + ?Sized>(mean: f64, spread: f64, n: usize, rng: &mut R) -> Vec<u32> {
    (0..n)
        .map(|_| gaussian_sample(mean, spread, rng).max(0.0).round() as u32)
        .collect()
}

/// Paired "original" and "current" samples of a feature.
///
/// `original` is drawn from `N(base_mean, base_spread)`, `current` from
/// `N(base_mean + shift, base_spread + spread_delta)`.
pub fn build_distribution_pair<R: Rng + ?Sized>(
    base_mean: f64,
    base_spread: f64,
    shift: f64,
    spread_delta: f64,
    n: usize,
    rng: &mut R,
) -> (Vec<u32>, Vec<u32>) {
    let original = count_samples(base_mean, base_spread, n, rng);
    let current = count_samples(base_mean + shift, base_spread + spread_delta, n, rng);
    (original, current)
}
