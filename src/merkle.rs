//! Sequencer inclusion-proof records and their witness form.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Field;

/// Tree depths mandated by the protocol deployments.
pub const MIN_TREE_DEPTH: usize = 16;
pub const MAX_TREE_DEPTH: usize = 32;

/// One element of the sequencer's `inclusionProof` response.
///
/// The wire format is a map with exactly one of the two keys set; both
/// options are modeled so a malformed record can be rejected with a precise
/// error instead of a serde failure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionProofEntry {
    #[serde(rename = "Left", default, skip_serializing_if = "Option::is_none")]
    pub left: Option<Field>,
    #[serde(rename = "Right", default, skip_serializing_if = "Option::is_none")]
    pub right: Option<Field>,
}

impl InclusionProofEntry {
    #[must_use]
    pub const fn left(value: Field) -> Self {
        Self {
            left: Some(value),
            right: None,
        }
    }

    #[must_use]
    pub const fn right(value: Field) -> Self {
        Self {
            left: None,
            right: Some(value),
        }
    }
}

/// Successful body of `POST {sequencer}/inclusionProof`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct InclusionProofResponse {
    pub root: Field,
    pub proof: Vec<InclusionProofEntry>,
}

/// Element of a Merkle proof.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Branch {
    /// The own node is the left child; value is the right sibling hash.
    Left(Field),

    /// The own node is the right child; value is the left sibling hash.
    Right(Field),
}

/// Merkle proof path in the order the sequencer reported it.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MerkleProof(pub Vec<Branch>);

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MalformedProofRecord {
    #[error("inclusion record has {0} entries, supported tree depths are {MIN_TREE_DEPTH}..={MAX_TREE_DEPTH}")]
    UnsupportedDepth(usize),
    #[error("inclusion record entry {0} has both Left and Right siblings set")]
    AmbiguousBranch(usize),
    #[error("inclusion record entry {0} has neither a Left nor a Right sibling")]
    MissingBranch(usize),
}

impl MerkleProof {
    /// Validate a raw sequencer record and adapt it into witness form.
    ///
    /// # Errors
    ///
    /// Returns a [`MalformedProofRecord`] if any entry does not carry exactly
    /// one sibling, or if the record length is not a supported tree depth.
    pub fn from_inclusion_record(
        record: &[InclusionProofEntry],
    ) -> Result<Self, MalformedProofRecord> {
        if !(MIN_TREE_DEPTH..=MAX_TREE_DEPTH).contains(&record.len()) {
            return Err(MalformedProofRecord::UnsupportedDepth(record.len()));
        }
        let branches = record
            .iter()
            .enumerate()
            .map(|(index, entry)| match (entry.left, entry.right) {
                (Some(value), None) => Ok(Branch::Left(value)),
                (None, Some(value)) => Ok(Branch::Right(value)),
                (Some(_), Some(_)) => Err(MalformedProofRecord::AmbiguousBranch(index)),
                (None, None) => Err(MalformedProofRecord::MissingBranch(index)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self(branches))
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Sibling hashes, record order preserved.
    #[must_use]
    pub fn siblings(&self) -> Vec<Field> {
        self.0
            .iter()
            .map(|branch| match branch {
                Branch::Left(value) | Branch::Right(value) => *value,
            })
            .collect()
    }

    /// Compute path index: 0 when the own node is the left child.
    #[must_use]
    pub fn path_index(&self) -> Vec<Field> {
        self.0
            .iter()
            .map(|branch| match branch {
                Branch::Left(_) => Field::from(0),
                Branch::Right(_) => Field::from(1),
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn record(depth: usize, rights: &[usize]) -> Vec<InclusionProofEntry> {
        (0..depth)
            .map(|level| {
                let sibling = Field::from(level as u64 + 1);
                if rights.contains(&level) {
                    InclusionProofEntry::right(sibling)
                } else {
                    InclusionProofEntry::left(sibling)
                }
            })
            .collect()
    }

    #[test]
    fn test_adapts_order_and_indices() {
        let rights = [2, 7, 13];
        let proof = MerkleProof::from_inclusion_record(&record(20, &rights)).unwrap();
        assert_eq!(proof.depth(), 20);

        let siblings = proof.siblings();
        assert_eq!(siblings.len(), 20);
        for (level, sibling) in siblings.iter().enumerate() {
            assert_eq!(*sibling, Field::from(level as u64 + 1));
        }

        let indices = proof.path_index();
        let ones = indices
            .iter()
            .enumerate()
            .filter(|(_, index)| **index == Field::from(1))
            .map(|(level, _)| level)
            .collect::<Vec<_>>();
        assert_eq!(ones, rights);
    }

    #[test]
    fn test_rejects_short_record() {
        assert_eq!(
            MerkleProof::from_inclusion_record(&record(10, &[])),
            Err(MalformedProofRecord::UnsupportedDepth(10))
        );
    }

    #[test]
    fn test_rejects_deep_record() {
        assert_eq!(
            MerkleProof::from_inclusion_record(&record(33, &[])),
            Err(MalformedProofRecord::UnsupportedDepth(33))
        );
    }

    #[test]
    fn test_rejects_ambiguous_entry() {
        let mut entries = record(20, &[]);
        entries[4] = InclusionProofEntry {
            left: Some(Field::from(0xaa)),
            right: Some(Field::from(0xbb)),
        };
        assert_eq!(
            MerkleProof::from_inclusion_record(&entries),
            Err(MalformedProofRecord::AmbiguousBranch(4))
        );
    }

    #[test]
    fn test_rejects_empty_entry() {
        let mut entries = record(16, &[]);
        entries[0] = InclusionProofEntry::default();
        assert_eq!(
            MerkleProof::from_inclusion_record(&entries),
            Err(MalformedProofRecord::MissingBranch(0))
        );
    }

    #[test]
    fn test_parses_sequencer_response() {
        let response: InclusionProofResponse = serde_json::from_str(
            r#"{
                "root": "0x0fbf3d63f42d2a7a4c68bd2653fcc9d75e94ba8ecdd8781d919ff7334c168ad6",
                "proof": [
                    {"Left": "0x1"},
                    {"Right": "0x2"},
                    {"Left": "0x3"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(response.proof.len(), 3);
        assert_eq!(response.proof[0], InclusionProofEntry::left(Field::from(1)));
        assert_eq!(response.proof[1], InclusionProofEntry::right(Field::from(2)));
    }
}
