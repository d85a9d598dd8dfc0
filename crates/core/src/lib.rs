//! Core traits and types for kinetrack.
//!
//! This crate defines the shared abstractions that the solver adapter and the
//! controllers build on:
//!
//! - [`NlpProblem`], a cost and constraint functional over a differentiable
//!   scalar, the narrow interface consumed by nonlinear programming solvers
//! - [`Scalar`], the numeric type a problem is evaluated with (`f64` or a dual
//!   number carrying derivatives)
//! - [`Bounds`], parallel lower/upper limits for variables or constraints
//! - [`Sparsity`], recording which variables each constraint row reads

mod bounds;
mod problems;
mod scalar;
mod sparsity;

pub use bounds::{Bounds, BoundsError};
pub use problems::NlpProblem;
pub use scalar::Scalar;
pub use sparsity::Sparsity;
