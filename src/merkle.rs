//! SHA-256 Merkle tree used to commit to codewords.
//!
//! Leaves are hashes. Odd levels duplicate their last node.

use crate::digest_sha2;
use crate::field::FieldElement;

pub type Digest = [u8; 32];

/// Authentication path for one leaf. The proof carries the leaf it opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleProof {
    pub index: usize,
    pub leaf: Digest,
    pub path: Vec<Digest>,
    /// `true` where the sibling sits to the left of the running hash.
    pub position: Vec<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct MerkleTree {
    leaves: Vec<Digest>,
    levels: Vec<Vec<Digest>>,
}

impl MerkleTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tree with one leaf per element hash.
    pub fn from_elements(elements: &[FieldElement]) -> Self {
        let mut tree = Self::new();
        for element in elements {
            tree.insert(leaf_hash(element));
        }
        tree
    }

    pub fn insert(&mut self, leaf: Digest) {
        self.leaves.push(leaf);
        self.levels.clear();
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    fn build_levels(&self) -> Vec<Vec<Digest>> {
        let mut levels = vec![self.leaves.clone()];
        let mut current = self.leaves.clone();
        while current.len() > 1 {
            let next: Vec<Digest> = current
                .chunks(2)
                .map(|pair| {
                    let right = pair.get(1).unwrap_or(&pair[0]);
                    hash_pair(&pair[0], right)
                })
                .collect();
            levels.push(next.clone());
            current = next;
        }
        levels
    }

    fn levels(&mut self) -> &[Vec<Digest>] {
        if self.levels.is_empty() && !self.leaves.is_empty() {
            self.levels = self.build_levels();
        }
        &self.levels
    }

    /// Root digest, `None` for an empty tree.
    pub fn root(&mut self) -> Option<Digest> {
        self.levels().last().and_then(|level| level.first().copied())
    }

    pub fn open(&mut self, index: usize) -> Option<MerkleProof> {
        let leaf = *self.leaves.get(index)?;
        let levels = self.levels();

        let mut path = Vec::new();
        let mut position = Vec::new();
        let mut current = index;
        for level in &levels[..levels.len() - 1] {
            let sibling = current ^ 1;
            // last node of an odd level is paired with itself
            path.push(*level.get(sibling).unwrap_or(&level[current]));
            position.push(current % 2 == 1);
            current /= 2;
        }

        Some(MerkleProof {
            index,
            leaf,
            path,
            position,
        })
    }
}

pub fn verify(root: &Digest, proof: &MerkleProof) -> bool {
    let mut current = proof.leaf;
    for (sibling, &sibling_on_left) in proof.path.iter().zip(&proof.position) {
        current = if sibling_on_left {
            hash_pair(sibling, &current)
        } else {
            hash_pair(&current, sibling)
        };
    }
    current == *root
}

pub fn leaf_hash(element: &FieldElement) -> Digest {
    digest_sha2(&element.to_be_bytes())
}

fn hash_pair(left: &Digest, right: &Digest) -> Digest {
    let mut combined = [0u8; 64];
    combined[..32].copy_from_slice(left);
    combined[32..].copy_from_slice(right);
    digest_sha2(&combined)
}

pub fn to_hex(digest: &Digest) -> String {
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
