//! Forecast skill scores.
//!
//! Every score takes observed and simulated discharge of equal length.
//! [`paired_skill`] scores a forecast against sparse observations.
use serde::{Deserialize, Serialize};

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64], mean: f64) -> f64 {
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

/// Nash-Sutcliffe efficiency, (-inf, 1]. Constant observations give -inf.
pub fn nse(observed: &[f64], simulated: &[f64]) -> f64 {
    let mean_obs = mean(observed);
    let residual: f64 = observed
        .iter()
        .zip(simulated)
        .map(|(o, s)| (o - s).powi(2))
        .sum();
    let spread: f64 = observed.iter().map(|o| (o - mean_obs).powi(2)).sum();
    if spread == 0.0 {
        return f64::NEG_INFINITY;
    }
    1.0 - residual / spread
}

/// NSE of `ln(q + 0.01)`, weighting low flows.
pub fn log_nse(observed: &[f64], simulated: &[f64]) -> f64 {
    let ln = |q: &f64| (q + 0.01).ln();
    let log_obs: Vec<f64> = observed.iter().map(ln).collect();
    let log_sim: Vec<f64> = simulated.iter().map(ln).collect();
    nse(&log_obs, &log_sim)
}

/// Kling-Gupta efficiency, (-inf, 1].
pub fn kge(observed: &[f64], simulated: &[f64]) -> f64 {
    let n = observed.len() as f64;
    let mean_o = mean(observed);
    let mean_s = mean(simulated);
    let std_o = std_dev(observed, mean_o);
    let std_s = std_dev(simulated, mean_s);

    let r = if std_o == 0.0 || std_s == 0.0 {
        0.0
    } else {
        observed
            .iter()
            .zip(simulated)
            .map(|(o, s)| (o - mean_o) * (s - mean_s))
            .sum::<f64>()
            / (n * std_o * std_s)
    };
    let alpha = if std_o == 0.0 { 0.0 } else { std_s / std_o };
    let beta = if mean_o == 0.0 { 0.0 } else { mean_s / mean_o };

    1.0 - ((r - 1.0).powi(2) + (alpha - 1.0).powi(2) + (beta - 1.0).powi(2)).sqrt()
}

/// Percent bias; positive when the forecast overestimates.
pub fn pbias(observed: &[f64], simulated: &[f64]) -> f64 {
    let total: f64 = observed.iter().sum();
    if total == 0.0 {
        return f64::INFINITY;
    }
    let excess: f64 = simulated.iter().zip(observed).map(|(s, o)| s - o).sum();
    100.0 * excess / total
}

pub fn rmse(observed: &[f64], simulated: &[f64]) -> f64 {
    let squared: Vec<f64> = observed
        .iter()
        .zip(simulated)
        .map(|(o, s)| (o - s).powi(2))
        .collect();
    mean(&squared).sqrt()
}

pub fn mae(observed: &[f64], simulated: &[f64]) -> f64 {
    let absolute: Vec<f64> = observed
        .iter()
        .zip(simulated)
        .map(|(o, s)| (o - s).abs())
        .collect();
    mean(&absolute)
}

/// Scores of a forecast over the steps that have an observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub pairs: usize,
    pub nse: f64,
    pub kge: f64,
    pub pbias: f64,
    pub rmse: f64,
    pub mae: f64,
}

/// Score `simulated` against the available observations.
///
/// Returns `None` with fewer than two observed steps.
pub fn paired_skill(simulated: &[f64], observed: &[Option<f64>]) -> Option<Skill> {
    let (obs, sim): (Vec<f64>, Vec<f64>) = observed
        .iter()
        .zip(simulated)
        .filter_map(|(o, &s)| o.map(|o| (o, s)))
        .unzip();
    if obs.len() < 2 {
        return None;
    }
    Some(Skill {
        pairs: obs.len(),
        nse: nse(&obs, &sim),
        kge: kge(&obs, &sim),
        pbias: pbias(&obs, &sim),
        rmse: rmse(&obs, &sim),
        mae: mae(&obs, &sim),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const OBS: [f64; 5] = [1.0, 2.0, 3.0, 4.0, 5.0];

    #[test]
    fn perfect_forecast_scores() {
        assert_relative_eq!(nse(&OBS, &OBS), 1.0);
        assert_relative_eq!(log_nse(&OBS, &OBS), 1.0, epsilon = 1e-10);
        assert_relative_eq!(kge(&OBS, &OBS), 1.0, epsilon = 1e-10);
        assert_relative_eq!(pbias(&OBS, &OBS), 0.0, epsilon = 1e-10);
        assert_relative_eq!(rmse(&OBS, &OBS), 0.0, epsilon = 1e-10);
        assert_relative_eq!(mae(&OBS, &OBS), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn nse_of_mean_forecast_is_zero() {
        assert_relative_eq!(nse(&OBS, &[3.0; 5]), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn nse_known_value() {
        // residual 0.11, spread 10
        let sim = [1.1, 2.2, 2.8, 4.1, 4.9];
        assert_relative_eq!(nse(&OBS, &sim), 0.989, epsilon = 1e-10);
    }

    #[test]
    fn nse_constant_observed_is_neg_inf() {
        assert_eq!(nse(&[5.0; 5], &OBS), f64::NEG_INFINITY);
    }

    #[test]
    fn log_nse_tolerates_zero_flow() {
        let q = [0.0, 1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(log_nse(&q, &q), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn kge_penalises_bias_and_variability() {
        assert!(kge(&OBS, &[2.0, 3.0, 4.0, 5.0, 6.0]) < 1.0);
        assert!(kge(&OBS, &[2.0, 2.5, 3.0, 3.5, 4.0]) < 1.0);
        assert!(kge(&[3.0; 5], &OBS).is_finite());
    }

    #[test]
    fn pbias_sign_and_value() {
        assert!(pbias(&OBS, &[2.0, 3.0, 4.0, 5.0, 6.0]) > 0.0);
        assert_relative_eq!(
            pbias(&[10.0, 20.0, 30.0], &[12.0, 22.0, 28.0]),
            100.0 * 2.0 / 60.0,
            epsilon = 1e-10
        );
        assert_eq!(pbias(&[0.0; 3], &[1.0; 3]), f64::INFINITY);
    }

    #[test]
    fn error_magnitudes() {
        assert_relative_eq!(rmse(&[1.0, 2.0, 3.0], &[1.0, 2.0, 4.0]), (1.0_f64 / 3.0).sqrt(), epsilon = 1e-10);
        assert_relative_eq!(mae(&[2.0, 2.0], &[1.0, 3.0]), 1.0, epsilon = 1e-10);
    }

    // -- paired_skill --

    #[test]
    fn paired_skill_ignores_missing_steps() {
        let sim = [1.0, 99.0, 3.0, 4.0];
        let obs = [Some(1.0), None, Some(3.0), Some(4.0)];
        let skill = paired_skill(&sim, &obs).unwrap();
        assert_eq!(skill.pairs, 3);
        assert_relative_eq!(skill.nse, 1.0);
        assert_relative_eq!(skill.rmse, 0.0);
    }

    #[test]
    fn paired_skill_needs_two_observations() {
        assert!(paired_skill(&[1.0, 2.0], &[Some(1.0), None]).is_none());
        assert!(paired_skill(&[], &[]).is_none());
    }
}
