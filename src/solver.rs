use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::filter::{FilterKind, FilterValues};
use crate::loss::Target;

/// decay exponent of the step-size schedule (alpha).
const STEP_DECAY: f64 = 1.0;
/// decay exponent of the perturbation schedule (gamma).
const PERTURBATION_DECAY: f64 = 1.0 / 6.0;

/// neutral wide-phase start: roughly the midpoint of each slot's typical
/// range.
const WIDE_START: FilterValues = FilterValues([50.0, 20.0, 3750.0, 50.0, 100.0, 100.0]);

/// wide-phase rerun budget and the loss under which a wide run is
/// considered a good enough basin for refinement.
const WIDE_RERUNS: u32 = 3;
const WIDE_GOOD_ENOUGH: f64 = 25.0;

/// hand-tuned SPSA schedule for one search phase. keeping the constants
/// in a struct keeps them auditable and testable in isolation.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SpsaSchedule {
    /// stability constant added to the iteration index in the step-size
    /// denominator (larger values damp early steps).
    pub stability: f64,
    /// per-slot step-size numerators, slots following [`FilterKind::ALL`].
    pub gains: [f64; 6],
    /// perturbation magnitude numerator.
    pub perturbation: f64,
    /// iteration budget for the phase.
    pub iterations: u32,
}

impl SpsaSchedule {
    /// wide-phase schedule: large steps from the neutral start, trading
    /// precision for basin coverage.
    pub fn wide() -> Self {
        Self {
            stability: 5.0,
            gains: [60.0, 180.0, 18_000.0, 600.0, 1.2, 1.2],
            perturbation: 15.0,
            iterations: 1000,
        }
    }

    /// narrow-phase schedule: local refinement around the wide-phase
    /// basin, step sizes scaled to how good the wide result already was.
    pub fn narrow(wide_loss: f64) -> Self {
        let a1 = wide_loss + 1.0;
        Self {
            stability: wide_loss,
            gains: [0.25 * a1, 0.25 * a1, a1, 0.25 * a1, 0.2 * a1, 0.2 * a1],
            perturbation: 2.0,
            iterations: 500,
        }
    }
}

/// a parameter vector paired with the loss it achieved. lower is better;
/// a result is only ever replaced by a strictly lower one.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SolverResult {
    pub values: FilterValues,
    pub loss: f64,
}

/// one SPSA run: each iteration estimates a descent direction from two
/// loss probes at a random simultaneous perturbation of all six slots,
/// then commits a range-fixed update. returns the best vector seen, never
/// the final iterate (which may have drifted worse under stochastic
/// noise).
pub fn spsa<R: Rng>(
    schedule: &SpsaSchedule,
    start: FilterValues,
    target: &Target,
    rng: &mut R,
) -> SolverResult {
    profiling::scope!("spsa");

    let mut current = start;
    let mut best = start;
    let mut best_loss = f64::INFINITY;

    for k in 0..schedule.iterations {
        let ck = schedule.perturbation / ((k + 1) as f64).powf(PERTURBATION_DECAY);

        // Rademacher direction: an independent fair coin per slot
        let mut direction = [0.0f64; 6];
        for d in &mut direction {
            *d = if rng.random::<bool>() { 1.0 } else { -1.0 };
        }

        // probe points are evaluated unfixed; only the committed update
        // below passes through the range rules
        let mut high = current;
        let mut low = current;
        for (slot, kind) in FilterKind::ALL.into_iter().enumerate() {
            high[kind] = current[kind] + ck * direction[slot];
            low[kind] = current[kind] - ck * direction[slot];
        }
        let loss_diff = target.loss(&high) - target.loss(&low);

        for (slot, kind) in FilterKind::ALL.into_iter().enumerate() {
            let gradient = loss_diff / (2.0 * ck) * direction[slot];
            let ak =
                schedule.gains[slot] / (schedule.stability + (k + 1) as f64).powf(STEP_DECAY);
            current[kind] = FilterValues::fix_slot(current[kind] - ak * gradient, kind);
        }

        let loss = target.loss(&current);
        if loss < best_loss {
            best = current;
            best_loss = loss;
        }
    }

    SolverResult {
        values: best,
        loss: best_loss,
    }
}

/// wide search phase: rerun from the same neutral start with a fresh
/// perturbation sequence until the loss is good enough or the rerun
/// budget is spent, keeping the best run.
pub fn solve_wide<R: Rng>(target: &Target, rng: &mut R) -> SolverResult {
    profiling::scope!("solve_wide");

    let schedule = SpsaSchedule::wide();
    let mut best = SolverResult {
        values: WIDE_START,
        loss: f64::INFINITY,
    };

    for run in 0..WIDE_RERUNS {
        if best.loss <= WIDE_GOOD_ENOUGH {
            break;
        }
        let result = spsa(&schedule, WIDE_START, target, rng);
        tracing::debug!(run, loss = result.loss, "wide phase run finished");
        if result.loss < best.loss {
            best = result;
        }
    }

    best
}

/// narrow refinement phase: a single local descent seeded from the wide
/// result.
pub fn solve_narrow<R: Rng>(wide: &SolverResult, target: &Target, rng: &mut R) -> SolverResult {
    profiling::scope!("solve_narrow");

    let schedule = SpsaSchedule::narrow(wide.loss);
    spsa(&schedule, wide.values, target, rng)
}

/// full solve: wide search, then narrow refinement of its best basin.
/// returns the narrow result.
pub fn solve<R: Rng>(target: &Target, rng: &mut R) -> SolverResult {
    profiling::scope!("solve");

    let wide = solve_wide(target, rng);
    let narrow = solve_narrow(&wide, target, rng);
    tracing::debug!(
        wide_loss = wide.loss,
        narrow_loss = narrow.loss,
        "solve finished"
    );
    narrow
}
