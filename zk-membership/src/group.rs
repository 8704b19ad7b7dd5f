//! Off-chain group bookkeeping: an incremental Merkle tree over identity
//! commitments.
//!
//! The group is ordered and append-only. Members are only ever added, and a
//! member's index is its submission order. Only the occupied prefix of each
//! level is stored; empty subtrees are represented by precomputed zero hashes.

use crate::hash::hash_two;
use ark_bn254::Fr;
use ark_ff::Zero;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GroupError {
    #[error("tree depth must be within [1, 32], got {0}")]
    InvalidDepth(usize),

    #[error("group is full: capacity {0}")]
    GroupFull(u64),

    #[error("member index {index} out of range, group has {count} members")]
    IndexOutOfRange { index: u32, count: u64 },
}

/// Merkle inclusion witness for one member.
///
/// `path_indices[i]` is true when the node at level `i` is a right child, i.e.
/// the sibling in `path_elements[i]` sits on the left.
#[derive(Clone, Debug)]
pub struct MerkleWitness {
    pub leaf: Fr,
    pub path_elements: Vec<Fr>,
    pub path_indices: Vec<bool>,
}

impl MerkleWitness {
    pub fn depth(&self) -> usize {
        self.path_elements.len()
    }

    /// Fold the path back up to a root. Host-side twin of the circuit's
    /// Merkle gadget.
    pub fn compute_root(&self) -> Fr {
        let mut current = self.leaf;
        for (sibling, is_right) in self.path_elements.iter().zip(&self.path_indices) {
            current = if *is_right {
                hash_two(*sibling, current)
            } else {
                hash_two(current, *sibling)
            };
        }
        current
    }
}

/// Incremental Merkle tree of membership commitments.
pub struct Group {
    depth: usize,
    /// Occupied nodes per level; level 0 holds the member commitments.
    nodes: Vec<Vec<Fr>>,
    /// Hash of an all-empty subtree, per level.
    zeroes: Vec<Fr>,
}

impl Group {
    /// Create an empty group with the given tree depth (capacity 2^depth).
    pub fn new(depth: usize) -> Result<Self, GroupError> {
        if depth == 0 || depth > 32 {
            return Err(GroupError::InvalidDepth(depth));
        }

        let mut zeroes = Vec::with_capacity(depth + 1);
        let mut zero = Fr::zero();
        zeroes.push(zero);
        for _ in 0..depth {
            zero = hash_two(zero, zero);
            zeroes.push(zero);
        }

        Ok(Self {
            depth,
            nodes: vec![Vec::new(); depth + 1],
            zeroes,
        })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn capacity(&self) -> u64 {
        1u64 << self.depth
    }

    pub fn member_count(&self) -> u64 {
        self.nodes[0].len() as u64
    }

    /// Ordered member commitments, index = submission order.
    pub fn members(&self) -> &[Fr] {
        &self.nodes[0]
    }

    /// Current Merkle root over all members.
    pub fn root(&self) -> Fr {
        self.nodes[self.depth]
            .first()
            .copied()
            .unwrap_or(self.zeroes[self.depth])
    }

    /// Append a member commitment and return its index.
    pub fn add_member(&mut self, commitment: Fr) -> Result<u32, GroupError> {
        let index = self.nodes[0].len();
        if index as u64 >= self.capacity() {
            return Err(GroupError::GroupFull(self.capacity()));
        }

        self.nodes[0].push(commitment);

        // Rehash the path from the new leaf to the root.
        let mut current_index = index;
        let mut current_hash = commitment;
        for level in 0..self.depth {
            let sibling_index = current_index ^ 1;
            let sibling = self.node(level, sibling_index);

            current_hash = if current_index & 1 == 1 {
                hash_two(sibling, current_hash)
            } else {
                hash_two(current_hash, sibling)
            };

            current_index >>= 1;
            self.set_node(level + 1, current_index, current_hash);
        }

        Ok(index as u32)
    }

    /// Merkle inclusion witness for the member at `index`.
    pub fn merkle_witness(&self, index: u32) -> Result<MerkleWitness, GroupError> {
        let count = self.member_count();
        if index as u64 >= count {
            return Err(GroupError::IndexOutOfRange { index, count });
        }

        let leaf = self.nodes[0][index as usize];
        let mut path_elements = Vec::with_capacity(self.depth);
        let mut path_indices = Vec::with_capacity(self.depth);

        let mut current_index = index as usize;
        for level in 0..self.depth {
            path_elements.push(self.node(level, current_index ^ 1));
            path_indices.push(current_index & 1 == 1);
            current_index >>= 1;
        }

        Ok(MerkleWitness {
            leaf,
            path_elements,
            path_indices,
        })
    }

    fn node(&self, level: usize, index: usize) -> Fr {
        self.nodes[level]
            .get(index)
            .copied()
            .unwrap_or(self.zeroes[level])
    }

    fn set_node(&mut self, level: usize, index: usize, value: Fr) {
        let nodes = &mut self.nodes[level];
        if index < nodes.len() {
            nodes[index] = value;
        } else {
            // Insertion is sequential, so a new node is always the next slot.
            debug_assert_eq!(index, nodes.len());
            nodes.push(value);
        }
    }
}
