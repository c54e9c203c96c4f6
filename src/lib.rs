//! Discovers CSS filter chains that recolor pure black into a target
//! color.
//!
//! The forward transform (invert -> sepia -> saturate -> hue-rotate ->
//! brightness -> contrast, each stage clamped) has no analytic inverse, so
//! the crate inverts it by search: a two-phase SPSA run minimizes a mixed
//! RGB+HSL distance to the target, and a retry driver reruns the whole
//! solve until the loss is acceptable or the attempt budget runs out.
//!
//! ```no_run
//! use css_filter_gen::{generate_filter_with_retry, FilterOptions};
//!
//! let result = generate_filter_with_retry("#61dafb", &FilterOptions::default())?;
//! println!("{} (loss {:.2}, {} attempts)", result.result.filter, result.result.loss, result.attempts);
//! # Ok::<(), css_filter_gen::ParseColorError>(())
//! ```

pub mod color;
pub mod filter;
pub mod loss;
pub mod parse;
pub mod solver;

use rand::Rng;
use serde::{Deserialize, Serialize};

pub use color::{Hsl, Rgb};
pub use filter::{apply_filters, format_filter, FilterKind, FilterValues, FORCE_BLACK_PREFIX};
pub use parse::{hex_to_rgb, parse_color, parse_rgb, ParseColorError};
pub use solver::{solve, SolverResult, SpsaSchedule};

use loss::Target;

/// a color argument for the entry points: either an already-resolved RGB
/// value or a string in any accepted form.
#[derive(Clone, Debug)]
pub enum ColorInput {
    Rgb(Rgb),
    Text(String),
}

impl From<Rgb> for ColorInput {
    fn from(rgb: Rgb) -> Self {
        ColorInput::Rgb(rgb)
    }
}

impl From<(u8, u8, u8)> for ColorInput {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        ColorInput::Rgb(Rgb::new(r, g, b))
    }
}

impl From<&str> for ColorInput {
    fn from(text: &str) -> Self {
        ColorInput::Text(text.to_owned())
    }
}

impl From<String> for ColorInput {
    fn from(text: String) -> Self {
        ColorInput::Text(text)
    }
}

impl ColorInput {
    /// resolve to a concrete RGB. only string inputs can fail; RGB inputs
    /// were saturated on construction.
    fn resolve(&self) -> Result<Rgb, ParseColorError> {
        match self {
            ColorInput::Rgb(rgb) => Ok(*rgb),
            ColorInput::Text(text) => parse_color(text),
        }
    }
}

/// tunables for filter generation.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct FilterOptions {
    /// prepend [`FORCE_BLACK_PREFIX`] so non-black sources are normalized
    /// to black before the discovered filter applies.
    pub force_black: bool,
    /// loss the retry driver accepts without further attempts.
    pub max_loss: f64,
    /// retry ceiling for the retry driver (floored to 1).
    pub max_attempts: u32,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            force_black: false,
            max_loss: 5.0,
            max_attempts: 10,
        }
    }
}

impl FilterOptions {
    /// stricter preset for interactive frontends: near-exact color at the
    /// cost of a larger retry budget.
    pub fn high_quality() -> Self {
        Self {
            max_loss: 1.0,
            max_attempts: 100,
            ..Self::default()
        }
    }
}

/// the outcome of one full solve.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FilterResult {
    /// full declaration, e.g. `filter: invert(12%) ...;`
    pub filter: String,
    /// the bare filter value without the `filter:` wrapper.
    pub filter_raw: String,
    /// loss achieved by the returned vector (lower is better).
    pub loss: f64,
    /// the resolved target color.
    pub rgb: Rgb,
}

/// a [`FilterResult`] annotated with how many attempts the retry driver
/// actually made.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FilterResultWithRetry {
    pub result: FilterResult,
    /// attempts performed (at least 1, at most the configured maximum).
    pub attempts: u32,
}

/// generate a CSS filter that recolors pure black into `color`.
///
/// string inputs fail with [`ParseColorError`] when they match neither
/// hex nor rgb forms; RGB inputs never fail.
pub fn generate_filter(
    color: impl Into<ColorInput>,
    options: &FilterOptions,
) -> Result<FilterResult, ParseColorError> {
    let rgb = color.into().resolve()?;
    Ok(generate_once(rgb, options, &mut rand::rng()))
}

/// generate a filter, rerunning the whole solve while the loss exceeds
/// `options.max_loss` and attempts remain, keeping the best attempt seen.
///
/// attempts are independent samples of the stochastic search (same start,
/// fresh perturbations), not a continuation.
pub fn generate_filter_with_retry(
    color: impl Into<ColorInput>,
    options: &FilterOptions,
) -> Result<FilterResultWithRetry, ParseColorError> {
    let rgb = color.into().resolve()?;
    Ok(generate_with_retry_rng(rgb, options, &mut rand::rng()))
}

/// single solve + formatting with an explicit randomness source.
fn generate_once<R: Rng>(rgb: Rgb, options: &FilterOptions, rng: &mut R) -> FilterResult {
    let target = Target::new(rgb);
    let solved = solver::solve(&target, rng);

    let raw = if options.force_black {
        format!("{}{}", FORCE_BLACK_PREFIX, format_filter(&solved.values))
    } else {
        format_filter(&solved.values)
    };

    FilterResult {
        filter: format!("filter: {raw};"),
        filter_raw: raw,
        loss: solved.loss,
        rgb,
    }
}

/// retry loop with an explicit randomness source. the tracked best loss
/// is non-increasing across attempts.
fn generate_with_retry_rng<R: Rng>(
    rgb: Rgb,
    options: &FilterOptions,
    rng: &mut R,
) -> FilterResultWithRetry {
    let max_attempts = options.max_attempts.max(1);

    let mut best = generate_once(rgb, options, rng);
    let mut attempts = 1;

    while best.loss > options.max_loss && attempts < max_attempts {
        let candidate = generate_once(rgb, options, rng);
        attempts += 1;
        tracing::debug!(
            attempts,
            candidate_loss = candidate.loss,
            best_loss = best.loss,
            "retry attempt finished"
        );
        if candidate.loss < best.loss {
            best = candidate;
        }
    }

    FilterResultWithRetry {
        result: best,
        attempts,
    }
}
