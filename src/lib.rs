//! STARK prover for a small register machine.
//!
//! A claimed execution trace is interpolated over a power-of-two domain,
//! checked against the machine's algebraic constraints by exact polynomial
//! division and the combined quotient is low-degree tested with FRI. The
//! verifier is simulated by a Fiat-Shamir [`transcript::Transcript`].

use sha2::{Digest, Sha256};

pub mod channel;
pub mod config;
pub mod error;
pub mod field;
pub mod math;
pub mod merkle;
pub mod prover;
pub mod transcript;
pub mod vm;

pub use config::StarkConfig;
pub use error::{ErrorCategory, Result, StarkError};
pub use field::FieldElement;
pub use prover::{StarkProver, Verdict, WitnessReport, witness};
pub use vm::trace::ExecutionTrace;

pub fn digest_sha2(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}
