//! Arithmetic over the proving field.
//!
//! Univariate and multivariate polynomials, evaluation domains and the FRI
//! folding engine built on top of them.

pub mod domain;
pub mod fri;
pub mod multivariate;
pub mod polynomial;
