//! # Hashlock: commitment over one or many secrets
//!
//! A hashlock gates the release of escrowed funds until a preimage is
//! revealed. Two shapes exist:
//!
//! - **Single**: one SHA-256 digest. Used when the order cannot be partially
//!   filled; the only valid segment index is 0.
//! - **Merkle**: a root over `leaf_count` secret hashes. Each leaf is bound to
//!   its index, so a secret only unlocks the segment it was issued for, and
//!   the other secrets stay hidden until their segments are filled.
//!
//! ```text
//!                root
//!              /      \
//!          n(0,1)    n(2,3)
//!          /   \     /   \
//!        L0    L1  L2    L2'      Li = leaf(i, sha256(secret_i))
//! ```
//!
//! Odd levels duplicate their last node. Verification is a pure function of
//! the stored commitment and the caller-supplied secret and proof.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::{Result, SegmentIndex, SwapError};

/// A 32-byte SHA-256 digest.
pub type HashDigest = [u8; 32];

/// SHA-256 of a secret preimage.
#[must_use]
pub fn hash_secret(secret: &[u8]) -> HashDigest {
    Sha256::digest(secret).into()
}

fn leaf_node(index: SegmentIndex, secret_hash: &HashDigest) -> HashDigest {
    let mut hasher = Sha256::new();
    hasher.update(b"crosslock:leaf:v1:");
    hasher.update(u64::from(index).to_le_bytes());
    hasher.update(secret_hash);
    hasher.finalize().into()
}

fn branch_node(left: &HashDigest, right: &HashDigest) -> HashDigest {
    let mut hasher = Sha256::new();
    hasher.update(b"crosslock:node:v1:");
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

fn ct_eq(a: &HashDigest, b: &HashDigest) -> bool {
    bool::from(a.as_slice().ct_eq(b.as_slice()))
}

/// Number of sibling hashes in a proof for a tree of `leaf_count` leaves.
fn tree_depth(leaf_count: u32) -> usize {
    if leaf_count <= 1 {
        0
    } else {
        (u32::BITS - (leaf_count - 1).leading_zeros()) as usize
    }
}

// ---------------------------------------------------------------------------
// Secret
// ---------------------------------------------------------------------------

/// A secret preimage. `Debug` never prints the bytes.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret(Vec<u8>);

impl Secret {
    #[must_use]
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// SHA-256 of the preimage, as stored in a hash set.
    #[must_use]
    pub fn hash(&self) -> HashDigest {
        hash_secret(&self.0)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret(<{} bytes>)", self.0.len())
    }
}

impl AsRef<[u8]> for Secret {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Random secrets for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Secret {
    /// A fresh random 32-byte secret.
    pub fn random() -> Self {
        Self(rand::random::<[u8; 32]>().to_vec())
    }

    /// `count` fresh random secrets.
    pub fn random_set(count: usize) -> Vec<Self> {
        (0..count).map(|_| Self::random()).collect()
    }
}

// ---------------------------------------------------------------------------
// MerkleProof / MerkleTree
// ---------------------------------------------------------------------------

/// Sibling hashes from leaf level up to (excluding) the root.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MerkleProof(pub Vec<HashDigest>);

impl MerkleProof {
    #[must_use]
    pub fn siblings(&self) -> &[HashDigest] {
        &self.0
    }
}

/// A fully materialized tree, held by makers (to publish the root) and
/// resolvers (to produce proofs when revealing a secret).
#[derive(Debug, Clone)]
pub struct MerkleTree {
    /// `levels[0]` are the leaf nodes; the last level holds only the root.
    levels: Vec<Vec<HashDigest>>,
}

impl MerkleTree {
    /// Build a tree from per-segment secret hashes, in segment order.
    ///
    /// # Errors
    /// Returns `InvalidHashes` if `secret_hashes` is empty or longer than
    /// `u32::MAX`.
    pub fn from_leaf_hashes(secret_hashes: &[HashDigest]) -> Result<Self> {
        if secret_hashes.is_empty() {
            return Err(SwapError::InvalidHashes {
                reason: "cannot build a Merkle tree over zero leaves".into(),
            });
        }
        let count = u32::try_from(secret_hashes.len()).map_err(|_| SwapError::InvalidHashes {
            reason: format!("too many leaves: {}", secret_hashes.len()),
        })?;

        let leaves: Vec<HashDigest> = (0..count)
            .zip(secret_hashes)
            .map(|(i, h)| leaf_node(i, h))
            .collect();

        let mut levels = vec![leaves];
        while let Some(level) = levels.last().filter(|l| l.len() > 1) {
            let next: Vec<HashDigest> = level
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] => branch_node(left, right),
                    [single] => branch_node(single, single),
                    _ => unreachable!("chunks(2) yields one or two items"),
                })
                .collect();
            levels.push(next);
        }
        Ok(Self { levels })
    }

    /// Build a tree straight from secrets.
    ///
    /// # Errors
    /// Same as [`from_leaf_hashes`](Self::from_leaf_hashes).
    pub fn from_secrets<S: AsRef<[u8]>>(secrets: &[S]) -> Result<Self> {
        let hashes: Vec<HashDigest> = secrets.iter().map(|s| hash_secret(s.as_ref())).collect();
        Self::from_leaf_hashes(&hashes)
    }

    #[must_use]
    pub fn root(&self) -> HashDigest {
        // Construction guarantees at least one level with at least one node.
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn leaf_count(&self) -> u32 {
        u32::try_from(self.levels[0].len()).unwrap_or(u32::MAX)
    }

    /// Inclusion proof for leaf `index`, or `None` if out of range.
    #[must_use]
    pub fn proof(&self, index: SegmentIndex) -> Option<MerkleProof> {
        let mut idx = usize::try_from(index).ok()?;
        if idx >= self.levels[0].len() {
            return None;
        }
        let mut siblings = Vec::with_capacity(self.levels.len().saturating_sub(1));
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling = level.get(idx ^ 1).unwrap_or(&level[idx]);
            siblings.push(*sibling);
            idx /= 2;
        }
        Some(MerkleProof(siblings))
    }
}

// ---------------------------------------------------------------------------
// Hashlock
// ---------------------------------------------------------------------------

/// The commitment stored on auctions, fusion orders and escrows.
///
/// Immutable once created. An order with `leaf_count` hashes is split into
/// `leaf_count - 1` fill segments; the extra leaf is the completion secret
/// revealed for the fill that takes the last segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hashlock {
    /// One secret, no partial fills.
    Single { digest: HashDigest },
    /// Merkle root over per-segment secret hashes.
    Merkle { root: HashDigest, leaf_count: u32 },
}

impl Hashlock {
    #[must_use]
    pub fn new_single(digest: HashDigest) -> Self {
        Self::Single { digest }
    }

    /// # Errors
    /// Returns `InvalidHashes` if `leaf_count < 2`: a one-leaf tree has no
    /// fillable segment.
    pub fn new_merkle(root: HashDigest, leaf_count: u32) -> Result<Self> {
        if leaf_count < 2 {
            return Err(SwapError::InvalidHashes {
                reason: format!("a Merkle hashlock needs at least 2 leaves, got {leaf_count}"),
            });
        }
        Ok(Self::Merkle { root, leaf_count })
    }

    /// Commit to a maker-supplied hash set: one hash gives a single
    /// hashlock, two or more a Merkle root over all of them.
    ///
    /// # Errors
    /// Returns `InvalidHashes` if `hashes` is empty.
    pub fn from_hashes(hashes: &[HashDigest]) -> Result<Self> {
        match hashes {
            [] => Err(SwapError::InvalidHashes {
                reason: "hash set is empty".into(),
            }),
            [digest] => Ok(Self::new_single(*digest)),
            _ => {
                let tree = MerkleTree::from_leaf_hashes(hashes)?;
                Self::new_merkle(tree.root(), tree.leaf_count())
            }
        }
    }

    /// Whether this commitment supports partial fills.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::Merkle { .. })
    }

    /// Number of committed secrets.
    #[must_use]
    pub fn leaf_count(&self) -> u32 {
        match self {
            Self::Single { .. } => 1,
            Self::Merkle { leaf_count, .. } => *leaf_count,
        }
    }

    /// Number of fill segments `N`.
    #[must_use]
    pub fn segment_count(&self) -> u32 {
        match self {
            Self::Single { .. } => 1,
            Self::Merkle { leaf_count, .. } => leaf_count.saturating_sub(1),
        }
    }

    /// Verify `secret` for `segment_index`.
    ///
    /// Returns `false` on digest mismatch, out-of-range index, or a proof
    /// that does not reconstruct the root. The proof is ignored for a
    /// single hashlock.
    #[must_use]
    pub fn verify(
        &self,
        secret: &[u8],
        segment_index: SegmentIndex,
        proof: Option<&MerkleProof>,
    ) -> bool {
        match self {
            Self::Single { digest } => segment_index == 0 && ct_eq(&hash_secret(secret), digest),
            Self::Merkle { root, leaf_count } => {
                if segment_index >= *leaf_count {
                    return false;
                }
                let Some(proof) = proof else {
                    return false;
                };
                if proof.0.len() != tree_depth(*leaf_count) {
                    return false;
                }
                let mut node = leaf_node(segment_index, &hash_secret(secret));
                let mut idx = segment_index;
                for sibling in &proof.0 {
                    node = if idx % 2 == 0 {
                        branch_node(&node, sibling)
                    } else {
                        branch_node(sibling, &node)
                    };
                    idx /= 2;
                }
                ct_eq(&node, root)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secrets(n: usize) -> Vec<Secret> {
        (0..n)
            .map(|i| Secret::new(format!("secret-{i}").into_bytes()))
            .collect()
    }

    #[test]
    fn single_verifies_matching_secret() {
        let secret = Secret::new(b"open sesame".to_vec());
        let lock = Hashlock::new_single(secret.hash());
        assert!(lock.verify(secret.as_bytes(), 0, None));
        assert!(!lock.verify(b"wrong", 0, None));
    }

    #[test]
    fn single_rejects_nonzero_segment() {
        let secret = Secret::new(b"s".to_vec());
        let lock = Hashlock::new_single(secret.hash());
        assert!(!lock.verify(secret.as_bytes(), 1, None));
    }

    #[test]
    fn merkle_verifies_every_leaf() {
        for n in [2usize, 3, 4, 5, 7, 8, 11, 16] {
            let set = secrets(n);
            let tree = MerkleTree::from_secrets(&set).unwrap();
            let lock = Hashlock::from_hashes(
                &set.iter().map(Secret::hash).collect::<Vec<_>>(),
            )
            .unwrap();
            assert_eq!(lock.leaf_count() as usize, n);
            for (i, s) in set.iter().enumerate() {
                let idx = u32::try_from(i).unwrap();
                let proof = tree.proof(idx).unwrap();
                assert!(lock.verify(s.as_bytes(), idx, Some(&proof)), "n={n} i={i}");
            }
        }
    }

    #[test]
    fn merkle_secret_bound_to_its_index() {
        let set = secrets(4);
        let tree = MerkleTree::from_secrets(&set).unwrap();
        let lock = Hashlock::new_merkle(tree.root(), 4).unwrap();
        let proof = tree.proof(1).unwrap();
        // Secret 2 with segment 1's proof must not verify.
        assert!(!lock.verify(set[2].as_bytes(), 1, Some(&proof)));
        // Secret 1 presented for index 0 must not verify either.
        assert!(!lock.verify(set[1].as_bytes(), 0, Some(&proof)));
    }

    #[test]
    fn merkle_rejects_missing_or_wrong_length_proof() {
        let set = secrets(5);
        let tree = MerkleTree::from_secrets(&set).unwrap();
        let lock = Hashlock::new_merkle(tree.root(), 5).unwrap();
        assert!(!lock.verify(set[0].as_bytes(), 0, None));
        let mut short = tree.proof(0).unwrap();
        short.0.pop();
        assert!(!lock.verify(set[0].as_bytes(), 0, Some(&short)));
    }

    #[test]
    fn merkle_rejects_out_of_range_index() {
        let set = secrets(3);
        let tree = MerkleTree::from_secrets(&set).unwrap();
        let lock = Hashlock::new_merkle(tree.root(), 3).unwrap();
        // Index 3 would hit the duplicated padding node; it must be refused.
        let proof = tree.proof(2).unwrap();
        assert!(!lock.verify(set[2].as_bytes(), 3, Some(&proof)));
        assert!(tree.proof(3).is_none());
    }

    #[test]
    fn tampered_sibling_fails() {
        let set = secrets(8);
        let tree = MerkleTree::from_secrets(&set).unwrap();
        let lock = Hashlock::new_merkle(tree.root(), 8).unwrap();
        let mut proof = tree.proof(6).unwrap();
        proof.0[1][0] ^= 0x01;
        assert!(!lock.verify(set[6].as_bytes(), 6, Some(&proof)));
    }

    #[test]
    fn from_hashes_shapes() {
        assert!(matches!(
            Hashlock::from_hashes(&[]),
            Err(SwapError::InvalidHashes { .. })
        ));
        let one = Hashlock::from_hashes(&[[1u8; 32]]).unwrap();
        assert!(!one.is_partial());
        assert_eq!(one.segment_count(), 1);
        let eleven = Hashlock::from_hashes(&[[1u8; 32]; 11]).unwrap();
        assert!(eleven.is_partial());
        assert_eq!(eleven.leaf_count(), 11);
        assert_eq!(eleven.segment_count(), 10);
    }

    #[test]
    fn new_merkle_rejects_single_leaf() {
        assert!(Hashlock::new_merkle([0u8; 32], 1).is_err());
        assert!(Hashlock::new_merkle([0u8; 32], 2).is_ok());
    }

    #[test]
    fn tree_depth_matches_proof_length() {
        for n in 1u32..=33 {
            let hashes = vec![[7u8; 32]; n as usize];
            let tree = MerkleTree::from_leaf_hashes(&hashes).unwrap();
            assert_eq!(tree.proof(0).unwrap().0.len(), tree_depth(n), "n={n}");
        }
    }

    #[test]
    fn secret_debug_is_redacted() {
        let s = Secret::new(b"top secret".to_vec());
        let dbg = format!("{s:?}");
        assert!(!dbg.contains("top"));
        assert!(dbg.contains("10 bytes"));
    }

    #[test]
    fn random_secrets_differ() {
        let set = Secret::random_set(3);
        assert_ne!(set[0], set[1]);
        assert_eq!(set[0].as_bytes().len(), 32);
    }

    #[test]
    fn hashlock_serde_roundtrip() {
        let lock = Hashlock::new_merkle([9u8; 32], 4).unwrap();
        let json = serde_json::to_string(&lock).unwrap();
        let back: Hashlock = serde_json::from_str(&json).unwrap();
        assert_eq!(lock, back);
    }
}
