use crate::{
    crypto::{Digest as _, Hasher},
    Hash,
};

/// Computes a binary Merkle root over an ordered list of byte strings.
///
/// Implementations must be deterministic and order sensitive; every validator
/// has to derive the same root for the same leaves.
pub trait MerkleRootBuilder {
    fn root<L: AsRef<[u8]>>(&self, leaves: &[L]) -> Hash;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Blake2bMerkle;

impl MerkleRootBuilder for Blake2bMerkle {
    fn root<L: AsRef<[u8]>>(&self, leaves: &[L]) -> Hash {
        calculate_merkle_root(leaves)
    }
}

/// Sibling hash on the way from a leaf to the root, tagged with the side the
/// sibling sits on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MerkleNode<T> {
    Left(T),
    Right(T),
}

impl<T> MerkleNode<T> {
    pub const fn item(&self) -> &T {
        match self {
            Self::Left(v) | Self::Right(v) => v,
        }
    }
}

pub type MerklePath<T> = Vec<MerkleNode<T>>;

#[must_use]
pub fn leaf(data: &[u8]) -> Hash {
    let mut hasher = Hasher::new();
    hasher.update(b"HALITE_MERKLE_LEAF");
    hasher.update(data);
    hasher.finalize().into()
}

pub fn node(left: impl AsRef<[u8]>, right: impl AsRef<[u8]>) -> Hash {
    let mut hasher = Hasher::new();
    hasher.update(b"HALITE_MERKLE_NODE");
    hasher.update(left.as_ref());
    hasher.update(right.as_ref());
    hasher.finalize().into()
}

fn padded_leaves<L: AsRef<[u8]>>(elements: &[L]) -> Vec<Hash> {
    let mut leaves: Vec<Hash> = elements
        .iter()
        .map(|element| leaf(element.as_ref()))
        .collect();

    let target_size = leaves.len().max(1).next_power_of_two();
    if leaves.len() < target_size {
        leaves.resize(target_size, leaf(&[]));
    }
    leaves
}

/// Root over `elements`, padded with empty leaves up to the next power of
/// two. Power-of-two inputs are never padded, so the root of an aligned run of
/// leaves equals the matching inner node of the larger tree.
pub fn calculate_merkle_root<L: AsRef<[u8]>>(elements: &[L]) -> Hash {
    let mut layer = padded_leaves(elements);
    while layer.len() > 1 {
        layer = layer
            .chunks(2)
            .map(|pair| node(pair[0], pair[1]))
            .collect();
    }
    layer[0]
}

/// Inclusion path for the element at `index`, or `None` if out of range.
pub fn inclusion_path<L: AsRef<[u8]>>(elements: &[L], index: usize) -> Option<MerklePath<Hash>> {
    if index >= elements.len() {
        return None;
    }
    let mut layer = padded_leaves(elements);
    let mut position = index;
    let mut path = MerklePath::new();
    while layer.len() > 1 {
        let sibling = position ^ 1;
        path.push(if sibling < position {
            MerkleNode::Left(layer[sibling])
        } else {
            MerkleNode::Right(layer[sibling])
        });
        layer = layer
            .chunks(2)
            .map(|pair| node(pair[0], pair[1]))
            .collect();
        position /= 2;
    }
    Some(path)
}

#[must_use]
pub fn verify_inclusion(root: &Hash, element: &[u8], path: &[MerkleNode<Hash>]) -> bool {
    let computed = path.iter().fold(leaf(element), |acc, sibling| match sibling {
        MerkleNode::Left(left) => node(left, acc),
        MerkleNode::Right(right) => node(acc, right),
    });
    &computed == root
}
