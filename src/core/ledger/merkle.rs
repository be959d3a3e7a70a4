// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Merkle commitment over the ledger's transactions, in append order.
//!
//! leaf = H( "BlueCarbon-Ledger-Leaf-v1" || H(tx_id) || H(payload) )
//! node = H( "BlueCarbon-Ledger-Node-v1" || left || right )
//!
//! A node without a partner at the end of a level is carried up unchanged,
//! so its proof has no step for that level. The empty tree's root is zero.

use ring::digest;

/// Hash32 type.
pub type Hash32 = [u8; 32];

/// Root of a tree with no leaves.
pub const EMPTY_ROOT: Hash32 = [0u8; 32];

const LEAF_DOMAIN: &[u8] = b"BlueCarbon-Ledger-Leaf-v1";
const NODE_DOMAIN: &[u8] = b"BlueCarbon-Ledger-Node-v1";

pub(crate) fn sha256(data: &[u8]) -> Hash32 {
    let d = digest::digest(&digest::SHA256, data);
    let mut out = [0u8; 32];
    out.copy_from_slice(d.as_ref());
    out
}

/// Leaf hash for one transaction.
pub fn leaf_hash(tx_id: &[u8], payload: &[u8]) -> Hash32 {
    let mut buf = Vec::with_capacity(LEAF_DOMAIN.len() + 64);
    buf.extend_from_slice(LEAF_DOMAIN);
    buf.extend_from_slice(&sha256(tx_id));
    buf.extend_from_slice(&sha256(payload));
    sha256(&buf)
}

fn node_hash(left: &Hash32, right: &Hash32) -> Hash32 {
    let mut buf = Vec::with_capacity(NODE_DOMAIN.len() + 64);
    buf.extend_from_slice(NODE_DOMAIN);
    buf.extend_from_slice(left);
    buf.extend_from_slice(right);
    sha256(&buf)
}

/// One step from a node towards the root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProofStep {
    /// Hash of the partner node.
    pub sibling: Hash32,
    /// The partner sits to the left of the running hash.
    pub sibling_on_left: bool,
}

/// Path from one leaf to the root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InclusionProof {
    /// Leaf position.
    pub index: usize,
    /// Leaf hash.
    pub leaf: Hash32,
    /// Steps bottom-up. Levels where the node had no partner are skipped.
    pub steps: Vec<ProofStep>,
}

impl InclusionProof {
    /// Root implied by the proof.
    pub fn implied_root(&self) -> Hash32 {
        self.steps.iter().fold(self.leaf, |acc, step| {
            if step.sibling_on_left {
                node_hash(&step.sibling, &acc)
            } else {
                node_hash(&acc, &step.sibling)
            }
        })
    }

    /// True when the proof leads to `root`.
    pub fn verify(&self, root: &Hash32) -> bool {
        &self.implied_root() == root
    }
}

/// Every level of the tree, leaves first.
#[derive(Clone, Debug, Default)]
pub struct MerkleTree {
    levels: Vec<Vec<Hash32>>,
}

impl MerkleTree {
    /// Build from leaf hashes.
    pub fn build(leaves: Vec<Hash32>) -> Self {
        if leaves.is_empty() {
            return Self::default();
        }
        let mut top = leaves;
        let mut levels = Vec::new();
        while top.len() > 1 {
            let parent: Vec<Hash32> = top
                .chunks(2)
                .map(|pair| match pair {
                    [l, r] => node_hash(l, r),
                    _ => pair[0],
                })
                .collect();
            levels.push(std::mem::replace(&mut top, parent));
        }
        levels.push(top);
        Self { levels }
    }

    /// Build from `(tx_id, payload)` pairs.
    pub fn from_transactions<'a>(txs: impl IntoIterator<Item = (&'a [u8], &'a [u8])>) -> Self {
        Self::build(txs.into_iter().map(|(id, payload)| leaf_hash(id, payload)).collect())
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        self.levels.first().map_or(0, Vec::len)
    }

    /// No leaves.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Root hash, or [`EMPTY_ROOT`].
    pub fn root(&self) -> Hash32 {
        self.levels
            .last()
            .and_then(|top| top.first())
            .copied()
            .unwrap_or(EMPTY_ROOT)
    }

    /// Proof for the leaf at `index`.
    pub fn proof(&self, index: usize) -> Option<InclusionProof> {
        let leaf = *self.levels.first()?.get(index)?;
        let mut steps = Vec::new();
        let mut pos = index;
        for level in &self.levels[..self.levels.len() - 1] {
            let partner = pos ^ 1;
            if let Some(sibling) = level.get(partner) {
                steps.push(ProofStep { sibling: *sibling, sibling_on_left: partner < pos });
            }
            pos /= 2;
        }
        Some(InclusionProof { index, leaf, steps })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(n: u8) -> Vec<Hash32> {
        (0..n).map(|i| leaf_hash(&[i], b"payload")).collect()
    }

    #[test]
    fn single_leaf_is_its_own_root() {
        let t = MerkleTree::build(leaves(1));
        assert_eq!(t.root(), leaves(1)[0]);
        let p = t.proof(0).unwrap();
        assert!(p.steps.is_empty());
        assert!(p.verify(&t.root()));
    }

    #[test]
    fn lone_node_is_carried_up() {
        let l = leaves(3);
        let t = MerkleTree::build(l.clone());
        assert_eq!(t.root(), node_hash(&node_hash(&l[0], &l[1]), &l[2]));

        let p = t.proof(2).unwrap();
        assert_eq!(p.steps.len(), 1);
        assert!(p.steps[0].sibling_on_left);
        assert!(p.verify(&t.root()));
    }

    #[test]
    fn tampered_step_fails() {
        let t = MerkleTree::build(leaves(5));
        let mut p = t.proof(1).unwrap();
        p.steps[0].sibling[0] ^= 1;
        assert!(!p.verify(&t.root()));
        assert!(t.proof(5).is_none());
        assert_eq!(MerkleTree::build(Vec::new()).root(), EMPTY_ROOT);
    }
}
