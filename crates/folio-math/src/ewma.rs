//! Exponentially weighted moving statistics.
//!
//! All functions weight observations by `(1-d)·d^k` where `k = 0` at the
//! most recent observation (the last element of the slice) and `d` is the
//! decay constant in `(0, 1)`. Weights are renormalized over the finite
//! sample, so the statistics are exact for any history length.

use crate::error::{MathError, MathResult};

fn validate_decay(decay: f64) -> MathResult<()> {
    if !(0.0 < decay && decay < 1.0) {
        return Err(MathError::invalid_input(format!(
            "decay constant must be in (0, 1), got {decay}"
        )));
    }
    Ok(())
}

/// Exponentially weighted mean of a series.
///
/// # Errors
///
/// Returns an error if the series is empty or the decay constant is
/// outside `(0, 1)`.
pub fn mean(xs: &[f64], decay: f64) -> MathResult<f64> {
    validate_decay(decay)?;
    if xs.is_empty() {
        return Err(MathError::insufficient_data(1, 0));
    }

    let mut sum = 0.0;
    let mut weight_sum = 0.0;
    let mut weight = 1.0 - decay;
    for &x in xs.iter().rev() {
        sum += weight * x;
        weight_sum += weight;
        weight *= decay;
    }
    Ok(sum / weight_sum)
}

/// Exponentially weighted population variance of a series.
///
/// # Errors
///
/// Returns an error if the series is empty or the decay constant is
/// outside `(0, 1)`.
pub fn variance(xs: &[f64], decay: f64) -> MathResult<f64> {
    let m = mean(xs, decay)?;

    let mut sum = 0.0;
    let mut weight_sum = 0.0;
    let mut weight = 1.0 - decay;
    for &x in xs.iter().rev() {
        sum += weight * (x - m) * (x - m);
        weight_sum += weight;
        weight *= decay;
    }
    Ok(sum / weight_sum)
}

/// Exponentially weighted population standard deviation of a series.
///
/// # Errors
///
/// Returns an error if the series is empty or the decay constant is
/// outside `(0, 1)`.
pub fn std(xs: &[f64], decay: f64) -> MathResult<f64> {
    Ok(variance(xs, decay)?.sqrt())
}

/// Exponentially weighted covariance between two aligned series.
///
/// # Errors
///
/// Returns an error if the series are empty, have different lengths, or
/// the decay constant is outside `(0, 1)`.
pub fn covariance(xs: &[f64], ys: &[f64], decay: f64) -> MathResult<f64> {
    if xs.len() != ys.len() {
        return Err(MathError::LengthMismatch {
            left: xs.len(),
            right: ys.len(),
        });
    }
    let mx = mean(xs, decay)?;
    let my = mean(ys, decay)?;

    let mut sum = 0.0;
    let mut weight_sum = 0.0;
    let mut weight = 1.0 - decay;
    for (&x, &y) in xs.iter().rev().zip(ys.iter().rev()) {
        sum += weight * (x - mx) * (y - my);
        weight_sum += weight;
        weight *= decay;
    }
    Ok(sum / weight_sum)
}

/// Recursive one-step-ahead EWMA mean/variance tracker.
///
/// Feeds observations in chronological order and exposes the smoothed mean
/// and variance *before* each new observation is absorbed, which is exactly
/// the conditional forecast a one-step-ahead likelihood needs. Seeded from
/// the first observation (zero initial variance).
#[derive(Debug, Clone, Copy)]
pub struct Smoother {
    decay: f64,
    mean: f64,
    variance: f64,
    seeded: bool,
}

impl Smoother {
    /// Creates a smoother with the given decay constant.
    ///
    /// # Errors
    ///
    /// Returns an error if the decay constant is outside `(0, 1)`.
    pub fn new(decay: f64) -> MathResult<Self> {
        validate_decay(decay)?;
        Ok(Self {
            decay,
            mean: 0.0,
            variance: 0.0,
            seeded: false,
        })
    }

    /// Absorbs one observation.
    pub fn update(&mut self, x: f64) {
        if !self.seeded {
            self.mean = x;
            self.variance = 0.0;
            self.seeded = true;
            return;
        }
        let alpha = 1.0 - self.decay;
        let prev_mean = self.mean;
        self.mean = alpha * x + self.decay * self.mean;
        self.variance = alpha * (x - prev_mean) * (x - prev_mean) + self.decay * self.variance;
    }

    /// Current smoothed mean.
    #[must_use]
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Current smoothed variance.
    #[must_use]
    pub fn variance(&self) -> f64 {
        self.variance
    }

    /// Current smoothed standard deviation.
    #[must_use]
    pub fn std(&self) -> f64 {
        self.variance.sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_constant_series() {
        let xs = vec![0.02; 24];
        assert_relative_eq!(mean(&xs, 0.9).unwrap(), 0.02, epsilon = 1e-12);
    }

    #[test]
    fn test_mean_weights_recent() {
        // Last observation carries weight (1-d); an old spike should matter less
        let mut early_spike = vec![0.0; 20];
        early_spike[0] = 1.0;
        let mut late_spike = vec![0.0; 20];
        late_spike[19] = 1.0;

        let d = 0.9;
        assert!(mean(&late_spike, d).unwrap() > mean(&early_spike, d).unwrap());
    }

    #[test]
    fn test_variance_zero_for_constant() {
        let xs = vec![1.5; 30];
        assert_relative_eq!(variance(&xs, 0.85).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_covariance_of_series_with_itself() {
        let xs: Vec<f64> = (0..36).map(|i| ((i * 7) % 13) as f64 / 13.0).collect();
        let d = 0.88;

        assert_relative_eq!(
            covariance(&xs, &xs, d).unwrap(),
            variance(&xs, d).unwrap(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_covariance_linearity() {
        // cov(x, a·x + b·y) = a·var(x) + b·cov(x, y)
        let xs: Vec<f64> = (0..24).map(|i| ((i * 5) % 11) as f64).collect();
        let ys: Vec<f64> = (0..24).map(|i| ((i * 3) % 7) as f64).collect();
        let combined: Vec<f64> = xs.iter().zip(&ys).map(|(x, y)| 0.4 * x + 0.6 * y).collect();
        let d = 0.9;

        let lhs = covariance(&xs, &combined, d).unwrap();
        let rhs = 0.4 * variance(&xs, d).unwrap() + 0.6 * covariance(&xs, &ys, d).unwrap();
        assert_relative_eq!(lhs, rhs, epsilon = 1e-10);
    }

    #[test]
    fn test_length_mismatch() {
        let result = covariance(&[1.0, 2.0], &[1.0], 0.9);
        assert!(matches!(result, Err(MathError::LengthMismatch { .. })));
    }

    #[test]
    fn test_invalid_decay() {
        assert!(mean(&[1.0], 1.0).is_err());
        assert!(mean(&[1.0], 0.0).is_err());
        assert!(mean(&[1.0], -0.5).is_err());
    }

    #[test]
    fn test_smoother_tracks_constant() {
        let mut s = Smoother::new(0.9).unwrap();
        for _ in 0..50 {
            s.update(0.01);
        }
        assert_relative_eq!(s.mean(), 0.01, epsilon = 1e-12);
        assert_relative_eq!(s.variance(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_smoother_seeds_from_first() {
        let mut s = Smoother::new(0.9).unwrap();
        s.update(0.05);
        assert_relative_eq!(s.mean(), 0.05, epsilon = 1e-12);
        assert_relative_eq!(s.variance(), 0.0, epsilon = 1e-12);
    }
}
