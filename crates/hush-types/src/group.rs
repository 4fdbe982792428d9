extern crate alloc;

use alloc::vec::Vec;
use ark_bls12_381::Fr;

/// Depth of a group's membership tree (2^20 members).
pub const GROUP_DEPTH: usize = 20;

/// Authentication path for one identity commitment.
/// `indices[i] == true` means the node at level `i` is a right child.
#[derive(Clone, Debug)]
pub struct GroupPath {
    pub siblings: Vec<Fr>,
    pub indices: Vec<bool>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GroupRoot(pub Fr);
