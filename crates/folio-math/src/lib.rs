//! # Folio Math
//!
//! Numerical utilities for the Folio rebalancing advisor.
//!
//! This crate provides the small set of numerical building blocks the
//! analytics engine needs:
//!
//! - [`ewma`] - Exponentially weighted moving statistics with `(1-d)·d^k`
//!   weighting, plus a recursive one-step-ahead smoother
//! - [`descriptive`] - Plain sample statistics (mean, sample std)
//! - [`golden`] - Bracketed golden-section search for scalar maximization
//!
//! All functions operate on `f64` slices, take explicit inputs, and report
//! failures through [`MathError`]. Nothing here performs I/O or holds state.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod descriptive;
pub mod error;
pub mod ewma;
pub mod golden;

pub use error::{MathError, MathResult};
pub use golden::{golden_section_max, MaximizeResult, SolverConfig};
