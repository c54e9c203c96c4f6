use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::color::clamp_channel;

/// prefix that normalizes a non-black source to black before the
/// discovered filter chain applies.
pub const FORCE_BLACK_PREFIX: &str = "brightness(0) saturate(100%) ";

/// the six CSS filter functions the pipeline composes, in application
/// order. the order also fixes the slot layout of [`FilterValues`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterKind {
    Invert,
    Sepia,
    Saturate,
    HueRotate,
    Brightness,
    Contrast,
}

impl FilterKind {
    pub const ALL: [FilterKind; 6] = [
        FilterKind::Invert,
        FilterKind::Sepia,
        FilterKind::Saturate,
        FilterKind::HueRotate,
        FilterKind::Brightness,
        FilterKind::Contrast,
    ];

    /// upper bound of the slot's valid range (the lower bound is always 0).
    #[inline]
    pub fn max(self) -> f64 {
        match self {
            FilterKind::Saturate => 7500.0,
            FilterKind::Brightness | FilterKind::Contrast => 200.0,
            _ => 100.0,
        }
    }

    /// hue-rotate is periodic: out-of-range values wrap instead of clamping.
    #[inline]
    pub fn wraps(self) -> bool {
        matches!(self, FilterKind::HueRotate)
    }
}

/// the six-dimensional tunable controlling the pipeline, indexed by
/// [`FilterKind`]. slot units: invert/sepia/brightness/contrast/saturate
/// in percent, hue-rotate in 0-100 units (x3.6 to degrees).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterValues(pub [f64; 6]);

impl Index<FilterKind> for FilterValues {
    type Output = f64;

    #[inline]
    fn index(&self, kind: FilterKind) -> &f64 {
        &self.0[kind as usize]
    }
}

impl IndexMut<FilterKind> for FilterValues {
    #[inline]
    fn index_mut(&mut self, kind: FilterKind) -> &mut f64 {
        &mut self.0[kind as usize]
    }
}

impl FilterValues {
    /// range-fix one slot value: hue-rotate wraps modulo its period, every
    /// other slot clamps to [0, max].
    #[inline]
    pub fn fix_slot(value: f64, kind: FilterKind) -> f64 {
        let max = kind.max();
        if kind.wraps() {
            if value > max {
                return value % max;
            }
            if value < 0.0 {
                return max + value % max;
            }
        }
        value.clamp(0.0, max)
    }

    /// range-fix every slot. the optimizer applies this after each update
    /// step so an unfixed value never feeds the next gradient estimate.
    #[inline]
    pub fn fix(&mut self) {
        for kind in FilterKind::ALL {
            self[kind] = Self::fix_slot(self[kind], kind);
        }
    }
}

#[inline]
fn multiply_matrix(rgb: [f64; 3], m: &[f64; 9]) -> [f64; 3] {
    [
        clamp_channel(rgb[0] * m[0] + rgb[1] * m[1] + rgb[2] * m[2]),
        clamp_channel(rgb[0] * m[3] + rgb[1] * m[4] + rgb[2] * m[5]),
        clamp_channel(rgb[0] * m[6] + rgb[1] * m[7] + rgb[2] * m[8]),
    ]
}

/// per-channel blend between the original and inverted value, `amount` in
/// [0, 1].
#[inline]
fn invert(rgb: [f64; 3], amount: f64) -> [f64; 3] {
    rgb.map(|c| clamp_channel((amount + c / 255.0 * (1.0 - 2.0 * amount)) * 255.0))
}

/// 3x3 matrix interpolated between identity and the fixed sepia matrix.
fn sepia(rgb: [f64; 3], amount: f64) -> [f64; 3] {
    let inv = 1.0 - amount;
    multiply_matrix(
        rgb,
        &[
            0.393 + 0.607 * inv,
            0.769 - 0.769 * inv,
            0.189 - 0.189 * inv,
            0.349 - 0.349 * inv,
            0.686 + 0.314 * inv,
            0.168 - 0.168 * inv,
            0.272 - 0.272 * inv,
            0.534 - 0.534 * inv,
            0.131 + 0.869 * inv,
        ],
    )
}

/// luminance-preserving saturation matrix, `amount` in [0, inf).
fn saturate(rgb: [f64; 3], amount: f64) -> [f64; 3] {
    multiply_matrix(
        rgb,
        &[
            0.213 + 0.787 * amount,
            0.715 - 0.715 * amount,
            0.072 - 0.072 * amount,
            0.213 - 0.213 * amount,
            0.715 + 0.285 * amount,
            0.072 - 0.072 * amount,
            0.213 - 0.213 * amount,
            0.715 - 0.715 * amount,
            0.072 + 0.928 * amount,
        ],
    )
}

/// color-space rotation by `angle` degrees.
fn hue_rotate(rgb: [f64; 3], angle: f64) -> [f64; 3] {
    let rad = angle / 180.0 * std::f64::consts::PI;
    let sin = rad.sin();
    let cos = rad.cos();
    multiply_matrix(
        rgb,
        &[
            0.213 + cos * 0.787 - sin * 0.213,
            0.715 - cos * 0.715 - sin * 0.715,
            0.072 - cos * 0.072 + sin * 0.928,
            0.213 - cos * 0.213 + sin * 0.143,
            0.715 + cos * 0.285 + sin * 0.140,
            0.072 - cos * 0.072 - sin * 0.283,
            0.213 - cos * 0.213 - sin * 0.787,
            0.715 - cos * 0.715 + sin * 0.715,
            0.072 + cos * 0.928 + sin * 0.072,
        ],
    )
}

/// per-channel affine transform in normalized units, scaled by 255.
#[inline]
fn linear(rgb: [f64; 3], slope: f64, intercept: f64) -> [f64; 3] {
    rgb.map(|c| clamp_channel(c * slope + intercept * 255.0))
}

/// run the full pipeline from pure black. channels are f64 on the 0-255
/// scale; every stage clamps before the next one runs. the clamp order is
/// part of the semantics: it changes which colors are reachable, and loss
/// values are only reproducible against this exact staging.
pub fn apply_filters(values: &FilterValues) -> [f64; 3] {
    let mut rgb = [0.0, 0.0, 0.0];
    rgb = invert(rgb, values[FilterKind::Invert] / 100.0);
    rgb = sepia(rgb, values[FilterKind::Sepia] / 100.0);
    rgb = saturate(rgb, values[FilterKind::Saturate] / 100.0);
    rgb = hue_rotate(rgb, values[FilterKind::HueRotate] * 3.6);
    rgb = linear(rgb, values[FilterKind::Brightness] / 100.0, 0.0);
    let contrast_slope = values[FilterKind::Contrast] / 100.0;
    linear(rgb, contrast_slope, -0.5 * contrast_slope + 0.5)
}

/// render the vector as a CSS filter declaration, each component rounded
/// to the nearest integer and hue-rotate expressed in degrees.
/// deterministic: a fixed vector always formats identically.
pub fn format_filter(values: &FilterValues) -> String {
    let fmt = |kind: FilterKind, scale: f64| (values[kind] * scale).round() as i64;
    format!(
        "invert({}%) sepia({}%) saturate({}%) hue-rotate({}deg) brightness({}%) contrast({}%)",
        fmt(FilterKind::Invert, 1.0),
        fmt(FilterKind::Sepia, 1.0),
        fmt(FilterKind::Saturate, 1.0),
        fmt(FilterKind::HueRotate, 3.6),
        fmt(FilterKind::Brightness, 1.0),
        fmt(FilterKind::Contrast, 1.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identityish_vector_keeps_black() {
        // invert 0, sepia 0, saturate 100%, hue 0, brightness/contrast 100%
        let values = FilterValues([0.0, 0.0, 100.0, 0.0, 100.0, 100.0]);
        assert_eq!(apply_filters(&values), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_full_invert_yields_white() {
        let values = FilterValues([100.0, 0.0, 0.0, 0.0, 100.0, 100.0]);
        let out = apply_filters(&values);
        for c in out {
            assert!((c - 255.0).abs() < 1e-9, "channel = {c}");
        }
    }

    #[test]
    fn test_zero_brightness_yields_black() {
        let values = FilterValues([50.0, 50.0, 100.0, 25.0, 0.0, 100.0]);
        assert_eq!(apply_filters(&values), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_stage_outputs_stay_in_channel_range() {
        // extreme but in-range vectors must never escape [0, 255]
        let extremes = [
            FilterValues([100.0, 100.0, 7500.0, 50.0, 200.0, 200.0]),
            FilterValues([0.0, 100.0, 7500.0, 99.0, 200.0, 0.0]),
            FilterValues([73.0, 12.0, 4200.0, 81.0, 150.0, 30.0]),
        ];
        for values in extremes {
            let out = apply_filters(&values);
            for c in out {
                assert!((0.0..=255.0).contains(&c), "channel escaped: {c}");
            }
        }
    }

    #[test]
    fn test_fix_slot_clamps_bounded_slots() {
        assert_eq!(FilterValues::fix_slot(-5.0, FilterKind::Invert), 0.0);
        assert_eq!(FilterValues::fix_slot(130.0, FilterKind::Sepia), 100.0);
        assert_eq!(FilterValues::fix_slot(8000.0, FilterKind::Saturate), 7500.0);
        assert_eq!(FilterValues::fix_slot(250.0, FilterKind::Brightness), 200.0);
        assert_eq!(FilterValues::fix_slot(-1.0, FilterKind::Contrast), 0.0);
        assert_eq!(FilterValues::fix_slot(42.5, FilterKind::Invert), 42.5);
    }

    #[test]
    fn test_fix_slot_wraps_hue() {
        assert_eq!(FilterValues::fix_slot(150.0, FilterKind::HueRotate), 50.0);
        assert_eq!(FilterValues::fix_slot(-30.0, FilterKind::HueRotate), 70.0);
        assert_eq!(FilterValues::fix_slot(-230.0, FilterKind::HueRotate), 70.0);
        assert_eq!(FilterValues::fix_slot(200.0, FilterKind::HueRotate), 0.0);
        // the period boundary itself does not wrap
        assert_eq!(FilterValues::fix_slot(100.0, FilterKind::HueRotate), 100.0);
    }

    #[test]
    fn test_fix_applies_every_slot() {
        let mut values = FilterValues([-5.0, 130.0, 8000.0, 150.0, 250.0, -1.0]);
        values.fix();
        assert_eq!(values, FilterValues([0.0, 100.0, 7500.0, 50.0, 200.0, 0.0]));
    }

    #[test]
    fn test_format_shape_and_rounding() {
        let values = FilterValues([12.4, 66.6, 3000.0, 50.0, 110.0, 95.0]);
        assert_eq!(
            format_filter(&values),
            "invert(12%) sepia(67%) saturate(3000%) hue-rotate(180deg) brightness(110%) contrast(95%)"
        );
    }

    #[test]
    fn test_format_is_deterministic() {
        let values = FilterValues([50.0, 20.0, 3750.0, 50.0, 100.0, 100.0]);
        assert_eq!(format_filter(&values), format_filter(&values));
    }
}
