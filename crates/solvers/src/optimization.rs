//! Solvers for constrained optimization problems.
//!
//! An [`NlpProblem`] maps a decision vector to a scalar cost and a vector of
//! constraint residuals. Solvers in this module search for the decision vector
//! that minimizes the cost while keeping the variables inside their box and the
//! residuals inside their bounds.
//!
//! # Solvers
//!
//! - [`alm`], an augmented Lagrangian method with a PANOC inner solver
//!
//! [`NlpProblem`]: kinetrack_core::NlpProblem

mod evaluate;

pub use evaluate::{Evaluation, evaluate};

pub mod alm;
