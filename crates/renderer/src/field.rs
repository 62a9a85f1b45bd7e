//! CPU mirror of the fragment program.
//!
//! Every function here reproduces the GLSL field math bit-for-bit in intent:
//! same constants, same evaluation order, single precision throughout. The
//! shader sources in [`crate::compile`] are the GPU renderings of this module;
//! tests exercise the math here because the GPU path cannot be sampled
//! headlessly.

use crate::types::ContextVariant;

/// Octave count of the fractal sum.
pub const FBM_OCTAVES: usize = 5;
/// Per-octave amplitude decay of the fractal sum.
pub const FBM_GAIN: f32 = 0.55;
/// Final output opacity per dialect, multiplied by the strength uniform.
pub const ALPHA_MODERN: f32 = 0.40;
pub const ALPHA_LEGACY: f32 = 0.55;

/// GLSL-style fract: always in `[0, 1)`, unlike `f32::fract` which keeps sign.
#[inline]
fn fract(x: f32) -> f32 {
    x - x.floor()
}

#[inline]
fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Deterministic pseudo-random scalar in `[0, 1)` from a 2D coordinate.
///
/// Fractional multiplicative scrambling; no state, no external randomness.
pub fn hash21(x: f32, y: f32) -> f32 {
    let mut px = fract(x * 123.34);
    let mut py = fract(y * 456.21);
    let d = px * (px + 45.32) + py * (py + 45.32);
    px += d;
    py += d;
    fract(px * py)
}

/// Two independent scalars chained from [`hash21`].
pub fn hash22(x: f32, y: f32) -> (f32, f32) {
    let n = hash21(x, y);
    (n, hash21(x + n, y + n))
}

/// Smoothly interpolated value noise over the integer lattice.
///
/// Bilinear interpolation of [`hash21`] at the four surrounding corners, each
/// axis eased with the cubic Hermite curve `3f^2 - 2f^3`.
pub fn value_noise(x: f32, y: f32) -> f32 {
    let ix = x.floor();
    let iy = y.floor();
    let fx = x - ix;
    let fy = y - iy;
    let ux = fx * fx * (3.0 - 2.0 * fx);
    let uy = fy * fy * (3.0 - 2.0 * fy);

    let a = hash21(ix, iy);
    let b = hash21(ix + 1.0, iy);
    let c = hash21(ix, iy + 1.0);
    let d = hash21(ix + 1.0, iy + 1.0);

    mix(mix(a, b, ux), mix(c, d, ux), uy)
}

/// Fractal sum of [`value_noise`] octaves.
///
/// Each octave's domain is transformed by the fixed shear/rotation matrix
/// `[[1.6, 1.2], [-1.2, 1.6]]` (column-major, as the GLSL `mat2` reads) and
/// the amplitude decays by [`FBM_GAIN`] from a starting 0.5.
pub fn fbm(mut x: f32, mut y: f32) -> f32 {
    let mut sum = 0.0;
    let mut amplitude = 0.5;
    for _ in 0..FBM_OCTAVES {
        sum += amplitude * value_noise(x, y);
        let nx = 1.6 * x - 1.2 * y;
        let ny = 1.2 * x + 1.6 * y;
        x = nx;
        y = ny;
        amplitude *= FBM_GAIN;
    }
    sum
}

/// Cellular (Worley) distance field with orbiting feature points.
///
/// One animated feature point per integer cell in the 3x3 neighbourhood:
/// the cell's [`hash22`] offset is remapped through
/// `0.5 + 0.45 * sin(2 * pi * (offset + t * 0.07))` per axis so the points
/// circle continuously instead of sitting static. Returns the minimum
/// Euclidean distance from `p` to any feature point; always non-negative.
pub fn worley(x: f32, y: f32, t: f32) -> f32 {
    let ix = x.floor();
    let iy = y.floor();
    let fx = x - ix;
    let fy = y - iy;
    let mut dmin = 1e9_f32;

    for cy in -1..=1 {
        for cx in -1..=1 {
            let gx = cx as f32;
            let gy = cy as f32;
            let (ox, oy) = hash22(ix + gx, iy + gy);
            let ox = 0.5 + 0.45 * (6.2831 * (ox + t * 0.07)).sin();
            let oy = 0.5 + 0.45 * (6.2831 * (oy + t * 0.07)).sin();
            let rx = gx + ox - fx;
            let ry = gy + oy - fy;
            let d = rx * rx + ry * ry;
            dmin = dmin.min(d);
        }
    }
    dmin.sqrt()
}

/// Full per-pixel evaluation: domain warp, cellular field, bands, ripple,
/// palette. Returns straight-alpha RGBA.
///
/// The two dialects intentionally diverge in the colour step: the modern
/// rendering maps a hue through the cosine palette and mixes it with a
/// near-black base at weight 0.55, closing at alpha `0.40 * strength`; the
/// legacy rendering keeps a tinted grayscale at alpha `0.55 * strength`.
pub fn shade(
    frag_x: f32,
    frag_y: f32,
    width: f32,
    height: f32,
    t: f32,
    strength: f32,
    variant: ContextVariant,
) -> [f32; 4] {
    let u = frag_x / width;
    let v = frag_y / height;
    let mut px = u * 2.0 - 1.0;
    let py = v * 2.0 - 1.0;
    px *= width / height;

    let qx = px;
    let qy = py;

    // Two time-shifted, axis-shifted fbm samples build the warp vector.
    let n1 = fbm(qx * 1.1, qy * 1.1 + t * 0.05);
    let n2 = fbm(qx * 1.2 + t * 0.04, qy * 1.2);
    let warp_x = n1 * 0.9;
    let warp_y = n2 * 0.9;

    let c = worley(qx * 2.0 + warp_x * 1.1, qy * 2.0 + warp_y * 1.1, t);

    let bands = 0.5 + 0.5 * ((c * 12.0 - t * 0.7) * 3.14159).cos();
    let edge = (smoothstep(0.15, 0.55, bands) - smoothstep(0.55, 0.95, bands)).abs();

    let rx = qx + warp_x * 0.4;
    let ry = qy + warp_y * 0.4;
    let ripple = ((rx * rx + ry * ry).sqrt() * 8.0 - t).sin() * 0.5 + 0.5;

    let mut value = bands * 0.8 + ripple * 0.2;
    value = mix(value, 1.0 - c, 0.35);
    // pow has an undefined result for a negative base; the cellular mix can
    // dip the field slightly below zero.
    value = value.max(0.0).powf(1.35);
    value *= 0.65 + 0.35 * (1.0 - edge);

    match variant {
        ContextVariant::Modern => {
            let tcol = (1.0 - edge).clamp(0.0, 1.0);
            let hue = 0.55 + 0.08 * (t * 0.1).sin() + 0.18 * tcol;

            let bias = [0.40, 0.40, 0.42];
            let amplitude = [0.28, 0.26, 0.24];
            let frequency = [1.00, 1.00, 1.00];
            let phase = [0.00, 0.10, 0.20];
            let base = [0.06, 0.06, 0.0];

            let mut col = [0.0_f32; 3];
            for i in 0..3 {
                let pal = bias[i] + amplitude[i] * (6.28318 * (frequency[i] * hue + phase[i])).cos();
                col[i] = mix(base[i], pal, 0.55) * (0.55 + 0.80 * tcol);
            }
            [col[0], col[1], col[2], ALPHA_MODERN * strength]
        }
        ContextVariant::Legacy => {
            let tint = [0.95, 0.98, 1.05];
            [
                value * tint[0],
                value * tint[1],
                value * tint[2],
                ALPHA_LEGACY * strength,
            ]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash21_is_deterministic_and_unit_ranged() {
        let samples = [
            (0.0, 0.0),
            (1.5, -3.25),
            (123.456, 789.012),
            (-42.0, 17.5),
            (0.001, 0.999),
        ];
        for &(x, y) in &samples {
            let first = hash21(x, y);
            let second = hash21(x, y);
            assert_eq!(first, second, "hash21({x}, {y}) is not deterministic");
            assert!((0.0..1.0).contains(&first), "hash21({x}, {y}) = {first}");
        }
    }

    #[test]
    fn hash22_components_differ() {
        let (a, b) = hash22(3.7, -1.2);
        assert!((0.0..1.0).contains(&a));
        assert!((0.0..1.0).contains(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn value_noise_is_continuous_across_lattice_boundaries() {
        let eps = 1e-3_f32;
        for &(x, y) in &[(2.0_f32, 0.4_f32), (5.0, 7.0), (-3.0, 1.6)] {
            let below = value_noise(x - eps, y);
            let above = value_noise(x + eps, y);
            assert!(
                (below - above).abs() < 1e-2,
                "x-discontinuity at ({x}, {y}): {below} vs {above}"
            );
            let below = value_noise(y, x - eps);
            let above = value_noise(y, x + eps);
            assert!(
                (below - above).abs() < 1e-2,
                "y-discontinuity at ({y}, {x}): {below} vs {above}"
            );
        }
    }

    #[test]
    fn fbm_bounded_by_octave_gain_series() {
        let mut bound = 0.0_f32;
        let mut amplitude = 0.5_f32;
        for _ in 0..FBM_OCTAVES {
            bound += amplitude;
            amplitude *= FBM_GAIN;
        }

        for i in 0..64 {
            for j in 0..64 {
                let x = i as f32 * 0.37 - 11.0;
                let y = j as f32 * 0.53 - 17.0;
                let f = fbm(x, y);
                assert!(f >= 0.0, "fbm({x}, {y}) = {f} below zero");
                assert!(f <= bound, "fbm({x}, {y}) = {f} exceeds bound {bound}");
            }
        }
    }

    #[test]
    fn worley_is_non_negative() {
        for i in 0..32 {
            for j in 0..32 {
                let x = i as f32 * 0.71 - 9.0;
                let y = j as f32 * 0.43 - 5.0;
                assert!(worley(x, y, 0.8) >= 0.0);
            }
        }
    }

    #[test]
    fn worley_vanishes_at_a_feature_point() {
        let t = 0.3_f32;
        let (cell_x, cell_y) = (3.0_f32, 5.0_f32);
        let (ox, oy) = hash22(cell_x, cell_y);
        let fx = 0.5 + 0.45 * (6.2831 * (ox + t * 0.07)).sin();
        let fy = 0.5 + 0.45 * (6.2831 * (oy + t * 0.07)).sin();
        let d = worley(cell_x + fx, cell_y + fy, t);
        assert!(d.abs() < 1e-4, "distance at feature point was {d}");
    }

    #[test]
    fn shade_centre_pixel_is_finite_with_dialect_alpha() {
        let modern = shade(400.0, 300.0, 800.0, 600.0, 0.0, 1.0, ContextVariant::Modern);
        for channel in modern {
            assert!(channel.is_finite());
        }
        assert_eq!(modern[3], ALPHA_MODERN);

        let legacy = shade(400.0, 300.0, 800.0, 600.0, 0.0, 1.0, ContextVariant::Legacy);
        for channel in legacy {
            assert!(channel.is_finite());
        }
        assert_eq!(legacy[3], ALPHA_LEGACY);
    }

    #[test]
    fn shade_scales_alpha_by_strength() {
        let out = shade(10.0, 10.0, 800.0, 600.0, 2.5, 0.5, ContextVariant::Modern);
        assert!((out[3] - ALPHA_MODERN * 0.5).abs() < f32::EPSILON);
    }
}
