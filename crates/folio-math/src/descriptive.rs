//! Plain sample statistics.

use crate::error::{MathError, MathResult};

/// Arithmetic mean of a series.
///
/// # Errors
///
/// Returns an error if the series is empty.
pub fn mean(xs: &[f64]) -> MathResult<f64> {
    if xs.is_empty() {
        return Err(MathError::insufficient_data(1, 0));
    }
    Ok(xs.iter().sum::<f64>() / xs.len() as f64)
}

/// Sample standard deviation (ddof = 1).
///
/// # Errors
///
/// Returns an error if the series has fewer than two points.
pub fn sample_std(xs: &[f64]) -> MathResult<f64> {
    if xs.len() < 2 {
        return Err(MathError::insufficient_data(2, xs.len()));
    }
    let m = mean(xs)?;
    let ss: f64 = xs.iter().map(|x| (x - m) * (x - m)).sum();
    Ok((ss / (xs.len() - 1) as f64).sqrt())
}
