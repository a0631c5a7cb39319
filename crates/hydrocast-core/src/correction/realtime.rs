//! Blending of forecast discharge with late-arriving observed inflow.
//!
//! Once a run of [`MIN_RUN`] consecutive observations ends at step `i`, the
//! steps `i - 3 ..= i` are corrected with cascading error weights and every
//! following step is corrected with a steady 5-term weight set until the next
//! missing observation. Corrections are applied in place, so later steps see
//! the errors of already corrected values.

use tracing::debug;

/// Consecutive valid observations needed to anchor a correction.
pub const MIN_RUN: usize = 4;

/// Shortest series on which correction is attempted.
pub const MIN_POINTS: usize = 5;

/// Weights on the errors of the preceding steps, nearest first, for the four
/// anchor steps `i - 3 ..= i`.
pub const ANCHOR_WEIGHTS: [&[f64]; MIN_RUN] = [
    &[1.0],
    &[0.6, 0.4],
    &[0.5, 0.3, 0.2],
    &[0.4, 0.3, 0.2, 0.1],
];

/// Weights on the errors of the five preceding steps after the anchor.
pub const STEADY_WEIGHTS: [f64; 5] = [0.2, 0.3, 0.3, 0.1, 0.1];

/// Result of [`blend`].
#[derive(Debug, Clone, PartialEq)]
pub struct Blend {
    pub discharge: Vec<f64>,
    /// Steps at which a correction chain was anchored.
    pub anchors: Vec<usize>,
}

impl Blend {
    pub fn is_anchored(&self) -> bool {
        !self.anchors.is_empty()
    }
}

/// Observation error at step `k`. A missing observation contributes zero.
fn error(discharge: &[f64], observed: &[Option<f64>], k: usize) -> f64 {
    observed[k].map_or(0.0, |o| o - discharge[k])
}

/// Weighted error of the steps preceding `j`, nearest first.
fn weighted_error(discharge: &[f64], observed: &[Option<f64>], j: usize, weights: &[f64]) -> f64 {
    weights
        .iter()
        .enumerate()
        .map(|(m, w)| w * error(discharge, observed, j - 1 - m))
        .sum()
}

/// Blend `simulated` with `observed`.
///
/// Series shorter than [`MIN_POINTS`] are returned unchanged.
pub fn blend(simulated: &[f64], observed: &[Option<f64>]) -> Blend {
    let mut q = simulated.to_vec();
    let mut anchors = Vec::new();
    let n = q.len().min(observed.len());
    if n < MIN_POINTS {
        return Blend { discharge: q, anchors };
    }

    let mut run = 0;
    let mut i = 0;
    while i < n {
        if observed[i].is_some() {
            run += 1;
        } else {
            run = 0;
        }

        if run < MIN_RUN || i < MIN_RUN {
            i += 1;
            continue;
        }

        debug!(anchor = i, "real-time correction anchored");
        anchors.push(i);

        for (k, weights) in ANCHOR_WEIGHTS.iter().enumerate() {
            let j = i + 1 - MIN_RUN + k;
            q[j] += weighted_error(&q, observed, j, weights);
        }

        let mut j = i + 1;
        while j < n && observed[j].is_some() {
            q[j] += weighted_error(&q, observed, j, &STEADY_WEIGHTS);
            j += 1;
        }

        // Resume scanning at the observation gap that ended the chain.
        run = 0;
        i = j;
    }

    Blend { discharge: q, anchors }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() < tol,
            "expected {expected} ± {tol}, got {actual}"
        );
    }

    #[test]
    fn short_series_unchanged() {
        let out = blend(&[1.0, 2.0, 3.0, 4.0], &[Some(9.0); 4]);
        assert_eq!(out.discharge, vec![1.0, 2.0, 3.0, 4.0]);
        assert!(!out.is_anchored());
    }

    #[test]
    fn no_observations_unchanged() {
        let sim = vec![3.0; 12];
        let out = blend(&sim, &[None; 12]);
        assert_eq!(out.discharge, sim);
        assert!(out.anchors.is_empty());
    }

    #[test]
    fn perfect_observations_are_a_fixed_point() {
        let sim: Vec<f64> = (0..30).map(|t| 10.0 + (t as f64 * 0.7).sin() * 4.0).collect();
        let mut obs: Vec<Option<f64>> = sim.iter().copied().map(Some).collect();
        obs[12] = None;
        obs[20] = None;
        let out = blend(&sim, &obs);
        assert!(out.is_anchored());
        assert_eq!(out.discharge, sim);
    }

    #[test]
    fn anchor_weights_cascade() {
        // Constant bias of +2 on five observed steps.
        let sim = vec![10.0; 5];
        let obs = vec![Some(12.0); 5];
        let out = blend(&sim, &obs);
        assert_eq!(out.anchors, vec![4]);
        let q = &out.discharge;
        assert_approx(q[0], 10.0, 1e-12);
        // q1 = 10 + 1.0 * e0, e0 = 2
        assert_approx(q[1], 12.0, 1e-12);
        // q2 = 10 + 0.6 * e1 + 0.4 * e0, e1 = 0
        assert_approx(q[2], 10.8, 1e-12);
        // q3 = 10 + 0.5 * e2 + 0.3 * e1 + 0.2 * e0
        assert_approx(q[3], 10.0 + 0.5 * 1.2 + 0.4, 1e-12);
        // q4 = 10 + 0.4 * e3 + 0.3 * e2 + 0.2 * e1 + 0.1 * e0
        let e3 = 12.0 - q[3];
        assert_approx(q[4], 10.0 + 0.4 * e3 + 0.3 * 1.2 + 0.2, 1e-12);
    }

    #[test]
    fn steady_weights_after_anchor() {
        // Constant bias of +2 on seven observed steps; the chain continues past 4.
        let sim = vec![10.0; 7];
        let obs = vec![Some(12.0); 7];
        let out = blend(&sim, &obs);
        assert_eq!(out.anchors, vec![4]);
        let q = &out.discharge;
        // Errors after the anchor cascade: e0 = 2, e1 = 0, e2 = 1.2, e3 = 1.0, e4 = 1.04.
        assert_approx(q[3], 11.0, 1e-12);
        assert_approx(q[4], 10.96, 1e-12);
        // q5 = 10 + 0.2 * e4 + 0.3 * e3 + 0.3 * e2 + 0.1 * e1 + 0.1 * e0
        assert_approx(q[5], 11.068, 1e-12);
        // q6 = 10 + 0.2 * e5 + 0.3 * e4 + 0.3 * e3 + 0.1 * e2 + 0.1 * e1, e5 = 0.932
        assert_approx(q[6], 10.9184, 1e-12);
    }

    #[test]
    fn steady_state_runs_until_gap() {
        let sim = vec![10.0; 12];
        let mut obs = vec![Some(12.0); 12];
        obs[8] = None;
        let out = blend(&sim, &obs);
        // Chain anchored at 4, steady for 5..=7, broken at 8; 9..=11 is too short.
        assert_eq!(out.anchors, vec![4]);
        assert!(out.discharge[5] > 10.0);
        assert!(out.discharge[7] > 10.0);
        assert_eq!(&out.discharge[8..], &[10.0; 4]);
    }

    #[test]
    fn chain_resumes_after_gap() {
        let sim = vec![10.0; 20];
        let mut obs = vec![Some(11.0); 20];
        obs[6] = None;
        let out = blend(&sim, &obs);
        assert_eq!(out.anchors, vec![4, 10]);
    }

    #[test]
    fn run_at_series_start_waits_for_fifth_step() {
        let sim = vec![10.0; 8];
        let mut obs = vec![None; 8];
        for o in obs.iter_mut().take(4) {
            *o = Some(11.0);
        }
        // Run of four ends at step 3, which has no step i - 4.
        let out = blend(&sim, &obs);
        assert!(out.anchors.is_empty());
    }
}
