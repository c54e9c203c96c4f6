use crate::color::{hsl_from_channels, Hsl, Rgb};
use crate::filter::{apply_filters, FilterValues};

/// a solve target with its HSL precomputed once, so the hot loss path
/// only converts the candidate side.
#[derive(Clone, Copy, Debug)]
pub struct Target {
    pub rgb: Rgb,
    pub hsl: Hsl,
}

impl Target {
    pub fn new(rgb: Rgb) -> Self {
        Self {
            rgb,
            hsl: rgb.to_hsl(),
        }
    }

    /// mixed RGB+HSL distance between the pipeline output for `values`
    /// and this target: RGB deltas on the 0-255 axes plus HSL deltas on
    /// the 0-100 axes, summed unweighted. acceptance thresholds elsewhere
    /// are calibrated against exactly this metric, so the units stay as
    /// they are.
    pub fn loss(&self, values: &FilterValues) -> f64 {
        profiling::scope!("loss");

        let out = apply_filters(values);
        let out_hsl = hsl_from_channels(out);

        (out[0] - self.rgb.r as f64).abs()
            + (out[1] - self.rgb.g as f64).abs()
            + (out[2] - self.rgb.b as f64).abs()
            + (out_hsl.h - self.hsl.h).abs()
            + (out_hsl.s - self.hsl.s).abs()
            + (out_hsl.l - self.hsl.l).abs()
    }
}
