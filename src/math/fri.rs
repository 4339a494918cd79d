//! FRI folding engine.
//!
//! Each round commits to the current codeword, draws a folding challenge,
//! halves the codeword and spot-checks the fold with colinearity openings.
//! All randomness comes from the [`ProofChannel`].

use std::time::Instant;

use tracing::{debug, info, instrument};

use crate::channel::{ColinearityOpening, Commitment, ProofChannel};
use crate::error::{Result, StarkError};
use crate::field::FieldElement;
use crate::math::domain::Domain;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fri {
    pub expansion_factor: usize,
    pub num_colinearity_checks: usize,
    deadline: Option<Instant>,
}

/// What the prover learned from running all folding rounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriOutcome {
    pub rounds: usize,
    pub challenges: Vec<FieldElement>,
    pub final_codeword: Vec<FieldElement>,
    /// False if any opening was rejected by the channel.
    pub all_colinear: bool,
}

impl Fri {
    pub fn new(expansion_factor: usize, num_colinearity_checks: usize) -> Self {
        Self {
            expansion_factor,
            num_colinearity_checks,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Number of halvings before the codeword is no longer than the expansion
    /// factor or too short to host the colinearity checks.
    pub fn num_rounds(&self, codeword_len: usize) -> usize {
        let mut length = codeword_len;
        let mut rounds = 0;
        while length > self.expansion_factor && 2 * self.num_colinearity_checks < length {
            length /= 2;
            rounds += 1;
        }
        rounds
    }

    /// Runs every folding round on `codeword`, the evaluations over `domain`.
    #[instrument(skip_all, fields(length = codeword.len(), rounds = self.num_rounds(codeword.len())))]
    pub fn prove<C: ProofChannel>(
        &self,
        codeword: Vec<FieldElement>,
        domain: Domain,
        channel: &mut C,
    ) -> Result<FriOutcome> {
        if codeword.len() != domain.length {
            return Err(StarkError::SizeMismatch {
                expected: domain.length,
                actual: codeword.len(),
            });
        }

        let rounds = self.num_rounds(codeword.len());
        let mut omega = domain.generator;
        let mut offset = domain.offset;
        let mut current = codeword;
        let mut challenges = Vec::with_capacity(rounds);
        let mut all_colinear = true;

        for round in 0..rounds {
            if self.deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(StarkError::DeadlineExceeded {
                    stage: format!("FRI round {}", round),
                });
            }
            debug!(round, length = current.len(), "folding codeword");

            channel.commit(Commitment::FriCodeword(&current))?;
            let alpha = channel.fold_challenge();
            let folded = fri_fold(&current, alpha, omega, offset)?;
            channel.commit(Commitment::FriCodeword(&folded))?;

            let half = current.len() / 2;
            for _ in 0..self.num_colinearity_checks {
                let index = channel.colinearity_index(current.len());
                if index >= half {
                    return Err(StarkError::SizeMismatch {
                        expected: half,
                        actual: index,
                    });
                }
                let opening = ColinearityOpening {
                    round,
                    index,
                    half,
                    points: [
                        (offset * omega.pow(index as u128), current[index]),
                        (offset * omega.pow((index + half) as u128), current[index + half]),
                        (alpha, folded[index]),
                    ],
                };
                all_colinear &= channel.open(&opening)?;
            }

            challenges.push(alpha);
            omega = omega * omega;
            offset = offset * offset;
            current = folded;
        }

        info!(rounds, final_length = current.len(), all_colinear, "FRI finished");
        Ok(FriOutcome {
            rounds,
            challenges,
            final_codeword: current,
            all_colinear,
        })
    }
}

/// Folds a codeword over `offset·ω^i` into one of half the length over the squared domain:
/// `folded[j] = ½·[(1 + α/x_j)·cur[j] + (1 − α/x_j)·cur[j + L/2]]` with `x_j = offset·ω^j`.
pub fn fri_fold(
    codeword: &[FieldElement],
    alpha: FieldElement,
    omega: FieldElement,
    offset: FieldElement,
) -> Result<Vec<FieldElement>> {
    if codeword.len() % 2 != 0 {
        return Err(StarkError::OddCodewordLength(codeword.len()));
    }
    let half = codeword.len() / 2;
    let two_inv = FieldElement::from(2u64).inverse()?;
    let omega_inv = omega.inverse()?;

    let mut x_inv = offset.inverse()?;
    let mut folded = Vec::with_capacity(half);
    for j in 0..half {
        let t = alpha * x_inv;
        let value = two_inv
            * ((FieldElement::ONE + t) * codeword[j] + (FieldElement::ONE - t) * codeword[j + half]);
        folded.push(value);
        x_inv *= omega_inv;
    }
    Ok(folded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::polynomial::Polynomial;

    fn fe(v: u64) -> FieldElement {
        FieldElement::from(v)
    }

    #[test]
    fn test_num_rounds() {
        let fri = Fri::new(4, 1);
        assert_eq!(fri.num_rounds(512), 7);
        assert_eq!(fri.num_rounds(4), 0);
        assert_eq!(fri.num_rounds(8), 1);

        // colinearity checks bound the depth before the expansion factor does
        let fri = Fri::new(2, 8);
        assert_eq!(fri.num_rounds(64), 2);
    }

    #[test]
    fn test_fold_matches_even_odd_split() {
        // f(x) = 3 + 5x + 7x^2 + 11x^3 = f_e(x^2) + x·f_o(x^2)
        let f = Polynomial::new(vec![fe(3), fe(5), fe(7), fe(11)]);
        let f_even = Polynomial::new(vec![fe(3), fe(7)]);
        let f_odd = Polynomial::new(vec![fe(5), fe(11)]);

        let domain = Domain::coset(16).unwrap();
        let codeword = f.evaluate_domain(&domain.elements());
        let alpha = fe(1234567);
        let folded = fri_fold(&codeword, alpha, domain.generator, domain.offset).unwrap();

        let expected_poly = &f_even + &f_odd.mul_scalar(alpha);
        let expected = expected_poly.evaluate_domain(&domain.fold().unwrap().elements());
        assert_eq!(folded, expected);
    }

    #[test]
    fn test_fold_rejects_odd_length() {
        let result = fri_fold(&[fe(1), fe(2), fe(3)], fe(1), fe(1), fe(1));
        assert_eq!(result, Err(StarkError::OddCodewordLength(3)));
    }
}
