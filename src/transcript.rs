//! Fiat-Shamir transcript for deriving verifier challenges deterministically.
//!
//! Every value the prover sends is appended to a growing text log; every
//! challenge is the SHA-256 digest of that log at the moment it is requested.
//! Replaying the same trace reproduces the same text byte for byte.

use std::fmt;
use std::fmt::Write as _;

use tracing::{debug, warn};

use crate::channel::{ColinearityOpening, Commitment, ProofChannel};
use crate::digest_sha2;
use crate::error::{Result, StarkError};
use crate::field::FieldElement;
use crate::math::polynomial::test_colinearity;
use crate::merkle::{self, Digest, MerkleTree};

/// Structured record of one transcript event, mirroring a line group of the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEntry {
    Started,
    BoundaryCommit { roots: Vec<Digest> },
    Challenges(Vec<FieldElement>),
    FriCommit { round: usize, length: usize, root: Digest },
    FoldChallenge(FieldElement),
    ColinearityIndex(usize),
    Opening {
        opening: ColinearityOpening,
        authenticated: bool,
        colinear: bool,
    },
    Aborted(StarkError),
    Finished { passed: bool },
}

pub struct Transcript {
    text: String,
    entries: Vec<TranscriptEntry>,
    fri_trees: Vec<MerkleTree>,
    fri_commit_round: usize,
    fri_pass: bool,
    finished: bool,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            text: String::from("STARK witness started\n"),
            entries: vec![TranscriptEntry::Started],
            fri_trees: Vec::new(),
            fri_commit_round: 0,
            fri_pass: true,
            finished: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    /// False once any opening was rejected or the run was aborted.
    pub fn fri_pass(&self) -> bool {
        self.fri_pass
    }

    pub fn fri_roots(&mut self) -> Vec<Digest> {
        self.fri_trees.iter_mut().filter_map(MerkleTree::root).collect()
    }

    fn digest(&self) -> [u8; 32] {
        digest_sha2(self.text.as_bytes())
    }

    fn sample_element(&self) -> FieldElement {
        FieldElement::sample(&self.digest())
    }

    /// Records an error that ended the proof attempt and marks the run failed.
    pub fn abort(&mut self, error: &StarkError) {
        let _ = writeln!(self.text, "Proof aborted: {}", error);
        self.entries.push(TranscriptEntry::Aborted(error.clone()));
        self.fri_pass = false;
    }

    /// Appends the verdict line. Calling it twice leaves the transcript unchanged.
    pub fn finish(&mut self) -> bool {
        if !self.finished {
            let verdict = if self.fri_pass { "passed" } else { "failed" };
            let _ = writeln!(self.text, "STARK witness {}", verdict);
            self.entries.push(TranscriptEntry::Finished {
                passed: self.fri_pass,
            });
            self.finished = true;
        }
        self.fri_pass
    }

    pub fn into_text(self) -> String {
        self.text
    }

    fn append_codeword(&mut self, codeword: &[FieldElement]) {
        for value in codeword {
            let _ = write!(self.text, "{} ", value);
        }
    }

    /// Authenticates the three opened values against the last two FRI commitments.
    fn authenticate(&mut self, opening: &ColinearityOpening) -> bool {
        let count = self.fri_trees.len();
        if count < 2 {
            return false;
        }
        let [a, b, c] = opening.points;
        let checks = [
            (count - 2, opening.index, a.1),
            (count - 2, opening.index + opening.half, b.1),
            (count - 1, opening.index, c.1),
        ];

        let mut ok = true;
        for (tree_index, leaf_index, value) in checks {
            let tree = &mut self.fri_trees[tree_index];
            let accepted = match (tree.root(), tree.open(leaf_index)) {
                (Some(root), Some(proof)) => {
                    proof.leaf == merkle::leaf_hash(&value) && merkle::verify(&root, &proof)
                }
                _ => false,
            };
            let _ = writeln!(
                self.text,
                "Merkle path for leaf {} of commit {}: {}",
                leaf_index,
                tree_index,
                if accepted { "accept" } else { "reject" }
            );
            ok &= accepted;
        }
        ok
    }
}

impl ProofChannel for Transcript {
    fn commit(&mut self, commitment: Commitment<'_>) -> Result<()> {
        match commitment {
            Commitment::BoundaryQuotients(codewords) => {
                self.text.push_str("commit boundary quotient codewords: ");
                let mut roots = Vec::with_capacity(codewords.len());
                for codeword in codewords {
                    self.text.push_str("[ ");
                    self.append_codeword(codeword);
                    self.text.push_str("] ");
                    if let Some(root) = MerkleTree::from_elements(codeword).root() {
                        roots.push(root);
                    }
                }
                self.text.push('\n');
                let hex: Vec<String> = roots.iter().map(merkle::to_hex).collect();
                let _ = writeln!(self.text, "boundary quotient roots: {}", hex.join(" "));
                debug!(codewords = codewords.len(), "committed boundary quotients");
                self.entries.push(TranscriptEntry::BoundaryCommit { roots });
            }
            Commitment::FriCodeword(codeword) => {
                let round = self.fri_commit_round;
                let _ = write!(self.text, "FRI commit round {}: ", round);
                self.append_codeword(codeword);
                self.text.push('\n');

                let mut tree = MerkleTree::from_elements(codeword);
                let root = tree.root().ok_or(StarkError::EmptyDomain)?;
                let _ = writeln!(self.text, "FRI commit root: {}", merkle::to_hex(&root));
                debug!(round, length = codeword.len(), "committed FRI codeword");

                self.fri_trees.push(tree);
                self.entries.push(TranscriptEntry::FriCommit {
                    round,
                    length: codeword.len(),
                    root,
                });
                self.fri_commit_round += 1;
            }
        }
        Ok(())
    }

    fn challenges(&mut self, n: usize) -> Vec<FieldElement> {
        let _ = writeln!(self.text, "Stark ask for {} field elements", n);
        let mut values = Vec::with_capacity(n);
        for i in 0..n {
            let value = self.sample_element();
            let _ = writeln!(self.text, "Challenge {}: {}", i, value);
            values.push(value);
        }
        self.entries.push(TranscriptEntry::Challenges(values.clone()));
        values
    }

    fn fold_challenge(&mut self) -> FieldElement {
        let alpha = self.sample_element();
        let _ = writeln!(self.text, "FRI get challenge, response: {}", alpha);
        self.entries.push(TranscriptEntry::FoldChallenge(alpha));
        alpha
    }

    fn colinearity_index(&mut self, codeword_len: usize) -> usize {
        let digest = self.digest();
        let mut word = [0u8; 8];
        word.copy_from_slice(&digest[..8]);
        let half = (codeword_len / 2).max(1) as u64;

        let mut index = (u64::from_le_bytes(word) % half) as usize;
        if index == 0 {
            index = 1;
        }
        let _ = writeln!(self.text, "FRI get colinearity challenge, response: {}", index);
        self.entries.push(TranscriptEntry::ColinearityIndex(index));
        index
    }

    fn open(&mut self, opening: &ColinearityOpening) -> Result<bool> {
        self.text.push_str("FRI open merkle: open points: ");
        for (x, y) in &opening.points {
            let _ = write!(self.text, "({}, {}) ", x, y);
        }
        self.text.push('\n');

        let authenticated = self.authenticate(opening);

        let xs: Vec<FieldElement> = opening.points.iter().map(|p| p.0).collect();
        let ys: Vec<FieldElement> = opening.points.iter().map(|p| p.1).collect();
        let colinear = test_colinearity(&xs, &ys)?;

        let accepted = authenticated && colinear;
        let _ = writeln!(
            self.text,
            "Doing colinearity test: {}",
            if colinear { "accept" } else { "reject" }
        );
        if !accepted {
            warn!(
                round = opening.round,
                index = opening.index,
                authenticated,
                colinear,
                "FRI opening rejected"
            );
            self.fri_pass = false;
        }

        self.entries.push(TranscriptEntry::Opening {
            opening: opening.clone(),
            authenticated,
            colinear,
        });
        Ok(accepted)
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fe(v: u64) -> FieldElement {
        FieldElement::from(v)
    }

    #[test]
    fn test_transcript_determinism() {
        let run = || {
            let mut t = Transcript::new();
            t.commit(Commitment::FriCodeword(&[fe(1), fe(2), fe(3), fe(4)]))
                .unwrap();
            let weights = t.challenges(3);
            let alpha = t.fold_challenge();
            let index = t.colinearity_index(8);
            (t.into_text(), weights, alpha, index)
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_challenges_depend_on_history() {
        let mut a = Transcript::new();
        let mut b = Transcript::new();
        a.commit(Commitment::FriCodeword(&[fe(1), fe(2)])).unwrap();
        b.commit(Commitment::FriCodeword(&[fe(1), fe(3)])).unwrap();
        assert_ne!(a.fold_challenge(), b.fold_challenge());

        // successive challenges differ because each one is appended
        let w = a.challenges(2);
        assert_ne!(w[0], w[1]);
    }

    #[test]
    fn test_colinearity_index_range() {
        let mut t = Transcript::new();
        for len in [4usize, 8, 16, 512] {
            for _ in 0..20 {
                let i = t.colinearity_index(len);
                assert!(i >= 1 && i < len / 2, "index {} out of range for {}", i, len);
            }
        }
    }

    #[test]
    fn test_open_honest_fold() {
        // f(x) = x over {1, 2, 3, 4} paired as (1, 3), (2, 4); fold stand-in on the line y = x
        let cur = [fe(1), fe(2), fe(3), fe(4)];
        let folded = [fe(5), fe(6)];
        let mut t = Transcript::new();
        t.commit(Commitment::FriCodeword(&cur)).unwrap();
        t.commit(Commitment::FriCodeword(&folded)).unwrap();

        let opening = ColinearityOpening {
            round: 0,
            index: 1,
            half: 2,
            points: [(fe(2), cur[1]), (fe(4), cur[3]), (fe(6), folded[1])],
        };
        assert!(t.open(&opening).unwrap());
        assert!(t.finish());
        assert!(t.text().ends_with("STARK witness passed\n"));
        assert_eq!(t.fri_roots().len(), 2);
    }

    #[test]
    fn test_open_rejects_unauthenticated_value() {
        let cur = [fe(1), fe(2), fe(3), fe(4)];
        let folded = [fe(5), fe(6)];
        let mut t = Transcript::new();
        t.commit(Commitment::FriCodeword(&cur)).unwrap();
        t.commit(Commitment::FriCodeword(&folded)).unwrap();

        // colinear, but not the committed value at index 1
        let opening = ColinearityOpening {
            round: 0,
            index: 1,
            half: 2,
            points: [(fe(2), fe(2)), (fe(4), fe(4)), (fe(7), fe(7))],
        };
        assert!(!t.open(&opening).unwrap());
        assert!(!t.fri_pass());
    }

    #[test]
    fn test_open_rejects_non_colinear() {
        let mut t = Transcript::new();
        let opening = ColinearityOpening {
            round: 0,
            index: 1,
            half: 1,
            points: [(fe(0), fe(0)), (fe(1), fe(1)), (fe(2), fe(4))],
        };
        assert!(!t.open(&opening).unwrap());
        assert!(!t.finish());
        assert!(t.text().ends_with("STARK witness failed\n"));
    }

    #[test]
    fn test_abort_marks_failure() {
        let mut t = Transcript::new();
        t.abort(&StarkError::UnsatisfiedTransition {
            constraint: "ld-imm".into(),
        });
        assert!(!t.finish());
        assert!(t.text().contains("Proof aborted"));
        assert!(matches!(t.entries().last(), Some(TranscriptEntry::Finished { passed: false })));
    }
}
