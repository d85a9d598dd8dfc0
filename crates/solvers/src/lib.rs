//! Solvers for kinetrack problems.
//!
//! - [`optimization::alm`] for constrained minimization of an
//!   [`NlpProblem`](kinetrack_core::NlpProblem) with an augmented Lagrangian
//!   engine, using forward-mode dual numbers for derivatives
//! - [`optimization::evaluate`] for plain evaluation of cost, residuals and
//!   constraint violation at a given point

pub mod optimization;
