//! The register machine being proven.
//!
//! Provides the execution trace matrix and the algebraic constraint system
//! describing valid transitions of the machine.

pub mod constraints;
pub mod trace;
