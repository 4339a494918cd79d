//! The prover's view of the verifier.
//!
//! The prover and the FRI engine never derive randomness themselves: every
//! commitment goes out through a [`ProofChannel`] and every challenge comes
//! back from it. [`crate::transcript::Transcript`] is the Fiat-Shamir
//! implementation; tests substitute their own.

use crate::error::Result;
use crate::field::FieldElement;

/// A message the prover commits to.
#[derive(Debug, Clone, Copy)]
pub enum Commitment<'a> {
    /// One codeword per boundary quotient, all over the FRI domain.
    BoundaryQuotients(&'a [Vec<FieldElement>]),
    /// A codeword entering or leaving a FRI fold.
    FriCodeword(&'a [FieldElement]),
}

/// Three points sampled from one FRI round that must lie on a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColinearityOpening {
    pub round: usize,
    /// Index into the first half of the pre-fold codeword.
    pub index: usize,
    /// Half the pre-fold codeword length; `index + half` is the paired point.
    pub half: usize,
    /// `(x_a, cur[i])`, `(x_b, cur[i + half])`, `(alpha, folded[i])`.
    pub points: [(FieldElement, FieldElement); 3],
}

pub trait ProofChannel {
    fn commit(&mut self, commitment: Commitment<'_>) -> Result<()>;

    /// `n` field elements used as combination weights.
    fn challenges(&mut self, n: usize) -> Vec<FieldElement>;

    fn fold_challenge(&mut self) -> FieldElement;

    /// An index in `[1, codeword_len / 2)`.
    fn colinearity_index(&mut self, codeword_len: usize) -> usize;

    /// Checks one opening, returning whether it was accepted.
    fn open(&mut self, opening: &ColinearityOpening) -> Result<bool>;
}
