//! Golden-section search for scalar maximization.

use crate::error::{MathError, MathResult};

/// Default interval tolerance for the golden-section search.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Default maximum iterations for the golden-section search.
pub const DEFAULT_MAX_ITERATIONS: u32 = 200;

/// Inverse golden ratio, the interval reduction factor per iteration.
const INV_PHI: f64 = 0.618_033_988_749_894_9;

/// Configuration for the bracketed search.
#[derive(Debug, Clone, Copy)]
pub struct SolverConfig {
    /// Width of the search interval at which to stop.
    pub tolerance: f64,
    /// Maximum number of interval reductions.
    pub max_iterations: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl SolverConfig {
    /// Creates a new solver configuration.
    #[must_use]
    pub fn new(tolerance: f64, max_iterations: u32) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }

    /// Sets the tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the maximum iterations.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// Result of a scalar maximization.
#[derive(Debug, Clone, Copy)]
pub struct MaximizeResult {
    /// The location of the maximum.
    pub argmax: f64,
    /// The objective value at the maximum.
    pub value: f64,
    /// Number of iterations used.
    pub iterations: u32,
}

/// Golden-section search for the maximum of a unimodal function.
///
/// Shrinks the bracket `[lo, hi]` by the inverse golden ratio each
/// iteration, keeping the half that contains the larger interior value.
/// Convergence is guaranteed for a unimodal objective; for a multimodal
/// objective the result is a local maximum inside the bracket.
///
/// # Errors
///
/// - [`MathError::InvalidBracket`] if `lo >= hi` or either bound is not finite
/// - [`MathError::NonFiniteValue`] if the objective returns NaN or infinity
/// - [`MathError::ConvergenceFailed`] if the interval does not shrink below
///   the configured tolerance within the iteration budget
///
/// # Example
///
/// ```rust
/// use folio_math::golden::{golden_section_max, SolverConfig};
///
/// // Maximize -(x - 0.3)^2
/// let f = |x: f64| -(x - 0.3) * (x - 0.3);
///
/// let result = golden_section_max(f, 0.0, 1.0, &SolverConfig::default()).unwrap();
/// assert!((result.argmax - 0.3).abs() < 1e-5);
/// ```
pub fn golden_section_max<F>(f: F, lo: f64, hi: f64, config: &SolverConfig) -> MathResult<MaximizeResult>
where
    F: Fn(f64) -> f64,
{
    if !(lo < hi) || !lo.is_finite() || !hi.is_finite() {
        return Err(MathError::InvalidBracket { lo, hi });
    }

    let mut a = lo;
    let mut b = hi;
    let mut x1 = b - INV_PHI * (b - a);
    let mut x2 = a + INV_PHI * (b - a);
    let mut f1 = eval_finite(&f, x1)?;
    let mut f2 = eval_finite(&f, x2)?;

    for iteration in 0..config.max_iterations {
        if (b - a).abs() < config.tolerance {
            let mid = (a + b) / 2.0;
            return Ok(MaximizeResult {
                argmax: mid,
                value: eval_finite(&f, mid)?,
                iterations: iteration,
            });
        }

        if f1 > f2 {
            // Maximum lies in [a, x2]
            b = x2;
            x2 = x1;
            f2 = f1;
            x1 = b - INV_PHI * (b - a);
            f1 = eval_finite(&f, x1)?;
        } else {
            // Maximum lies in [x1, b]
            a = x1;
            x1 = x2;
            f1 = f2;
            x2 = a + INV_PHI * (b - a);
            f2 = eval_finite(&f, x2)?;
        }
    }

    Err(MathError::convergence_failed(
        config.max_iterations,
        (b - a).abs(),
    ))
}

fn eval_finite<F>(f: &F, x: f64) -> MathResult<f64>
where
    F: Fn(f64) -> f64,
{
    let value = f(x);
    if value.is_finite() {
        Ok(value)
    } else {
        Err(MathError::NonFiniteValue { x })
    }
}
