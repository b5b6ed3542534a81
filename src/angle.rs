// angle.rs - heading arithmetic shared by the projector and the camera state

use std::f32::consts::{PI, TAU};

/// Wraps any angle into `(-PI, PI]`.
///
/// Input that is already in range is returned untouched, so
/// `norm(norm(a)) == norm(a)` holds bit-for-bit.
pub fn norm(a: f32) -> f32 {
    if a > -PI && a <= PI {
        return a;
    }
    let r = (a + PI).rem_euclid(TAU) - PI;
    // rem_euclid lands on 0 for odd multiples of PI, which maps to -PI
    if r <= -PI {
        PI
    } else {
        r
    }
}

/// Signed shortest difference `a - b`, normalized.
pub fn ang_delta(a: f32, b: f32) -> f32 {
    norm(a - b)
}

/// Interpolates from `a` towards `b` along the shorter arc.
pub fn lerp_angle(a: f32, b: f32, t: f32) -> f32 {
    norm(a + ang_delta(b, a) * t)
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Cubic Hermite step between `e0` and `e1`, clamped to `[0, 1]`.
pub fn smoothstep(e0: f32, e1: f32, x: f32) -> f32 {
    let t = ((x - e0) / (e1 - e0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

pub fn ease_out_cubic(t: f32) -> f32 {
    let omt = 1.0 - t.clamp(0.0, 1.0);
    1.0 - omt * omt * omt
}

/// `+1.0` or `-1.0`; zero counts as positive.
pub fn direction_of(v: f32) -> f32 {
    if v < 0.0 {
        -1.0
    } else {
        1.0
    }
}
