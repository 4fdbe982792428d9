use ark_bls12_381::Fr;
use ark_ff::AdditiveGroup;
use hush_hash::hash2;
use hush_types::{GroupPath, GroupRoot, GROUP_DEPTH};

/// Append-only membership tree over identity commitments, zero-padded to
/// [`GROUP_DEPTH`].
pub struct GroupTree {
    members: Vec<Fr>,
    zeros: Vec<Fr>,
}

impl Default for GroupTree {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupTree {
    pub fn new() -> Self {
        let mut zeros = vec![Fr::ZERO; GROUP_DEPTH + 1];
        for i in 1..=GROUP_DEPTH {
            zeros[i] = hash2(zeros[i - 1], zeros[i - 1]);
        }
        Self {
            members: Vec::new(),
            zeros,
        }
    }

    pub fn from_members(members: &[Fr]) -> Self {
        let mut tree = Self::new();
        for m in members {
            tree.insert(*m);
        }
        tree
    }

    pub fn insert(&mut self, commitment: Fr) -> usize {
        let idx = self.members.len();
        self.members.push(commitment);
        idx
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn index_of(&self, commitment: &Fr) -> Option<usize> {
        self.members.iter().position(|m| m == commitment)
    }

    fn next_layer(&self, layer: &[Fr], level: usize) -> Vec<Fr> {
        let zero = self.zeros[level];
        layer
            .chunks(2)
            .map(|pair| hash2(pair[0], pair.get(1).copied().unwrap_or(zero)))
            .collect()
    }

    pub fn root(&self) -> GroupRoot {
        if self.members.is_empty() {
            return GroupRoot(self.zeros[GROUP_DEPTH]);
        }
        let mut layer = self.members.clone();
        for level in 0..GROUP_DEPTH {
            layer = self.next_layer(&layer, level);
        }
        GroupRoot(layer[0])
    }

    /// Authentication path for the member at `index`, `None` if out of range.
    pub fn path(&self, index: usize) -> Option<GroupPath> {
        if index >= self.members.len() {
            return None;
        }
        let mut siblings = Vec::with_capacity(GROUP_DEPTH);
        let mut indices = Vec::with_capacity(GROUP_DEPTH);
        let mut layer = self.members.clone();
        let mut idx = index;

        for level in 0..GROUP_DEPTH {
            let is_right = idx & 1 == 1;
            let sibling_idx = if is_right { idx - 1 } else { idx + 1 };
            siblings.push(layer.get(sibling_idx).copied().unwrap_or(self.zeros[level]));
            indices.push(is_right);

            layer = self.next_layer(&layer, level);
            idx /= 2;
        }

        Some(GroupPath { siblings, indices })
    }
}

/// Fold a leaf up its path.
pub fn root_from_path(leaf: Fr, path: &GroupPath) -> Fr {
    path.siblings
        .iter()
        .zip(&path.indices)
        .fold(leaf, |current, (sibling, is_right)| {
            if *is_right {
                hash2(*sibling, current)
            } else {
                hash2(current, *sibling)
            }
        })
}

pub fn verify_path(leaf: Fr, path: &GroupPath, root: &GroupRoot) -> bool {
    root_from_path(leaf, path) == root.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::UniformRand;

    #[test]
    fn empty_root_deterministic() {
        assert_eq!(GroupTree::new().root(), GroupTree::new().root());
    }

    #[test]
    fn insert_changes_root() {
        let mut tree = GroupTree::new();
        let empty = tree.root();
        let mut rng = ark_std::test_rng();
        tree.insert(Fr::rand(&mut rng));
        assert_ne!(tree.root(), empty);
    }

    #[test]
    fn all_paths_verify() {
        let mut rng = ark_std::test_rng();
        let members: Vec<Fr> = (0..7).map(|_| Fr::rand(&mut rng)).collect();
        let tree = GroupTree::from_members(&members);
        let root = tree.root();
        for (i, m) in members.iter().enumerate() {
            let path = tree.path(i).unwrap();
            assert_eq!(path.siblings.len(), GROUP_DEPTH);
            assert!(verify_path(*m, &path, &root), "path failed for index {i}");
        }
    }

    #[test]
    fn path_out_of_range() {
        let tree = GroupTree::from_members(&[Fr::from(1u64)]);
        assert!(tree.path(1).is_none());
    }

    #[test]
    fn index_of_finds_member() {
        let tree = GroupTree::from_members(&[Fr::from(5u64), Fr::from(6u64)]);
        assert_eq!(tree.index_of(&Fr::from(6u64)), Some(1));
        assert_eq!(tree.index_of(&Fr::from(7u64)), None);
    }
}
