//! The proof-shaping pipeline: witness assembly, proof packing and the
//! protocol-level hashes shared with every verifier.

use ark_bn254::Bn254;
use ark_groth16::Proof as ArkProof;
use ark_relations::r1cs::SynthesisError;
use ethers_core::types::U256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::field::{hash_to_field, FieldHash};
use crate::identity::Identity;
use crate::merkle::MerkleProof;
use crate::{poseidon, Field};

// Matches the private G1Tup type in ark-circom.
pub type G1 = (U256, U256);

// Matches the private G2Tup type in ark-circom.
pub type G2 = ([U256; 2], [U256; 2]);

/// A Groth16 proof in the proving backend's native shape, with serde support.
///
/// The G2 rows are stored in the prover's coefficient order; [`Proof::pack`]
/// owns the swap into the verifier order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof(pub G1, pub G2, pub G1);

impl Proof {
    /// Flatten into the 8-scalar order every verifier expects:
    /// `[a0, a1, b01, b00, b11, b10, c0, c1]`.
    ///
    /// The coordinates within each B row are deliberately swapped; the
    /// on-chain pairing check represents G2 points with the coefficient
    /// order reversed relative to the prover's output.
    #[must_use]
    pub const fn pack(&self) -> [U256; 8] {
        [
            self.0 .0,
            self.0 .1,
            self.1 .0[1],
            self.1 .0[0],
            self.1 .1[1],
            self.1 .1[0],
            self.2 .0,
            self.2 .1,
        ]
    }

    /// Exact inverse of [`Proof::pack`].
    #[must_use]
    pub const fn unpack(flat: [U256; 8]) -> Self {
        Self(
            (flat[0], flat[1]),
            ([flat[3], flat[2]], [flat[5], flat[4]]),
            (flat[6], flat[7]),
        )
    }
}

impl From<ArkProof<Bn254>> for Proof {
    fn from(proof: ArkProof<Bn254>) -> Self {
        let proof = ark_circom::ethereum::Proof::from(proof);
        let (a, b, c) = proof.as_tuple();
        // as_tuple emits the verifier's coefficient order; keep the
        // prover-native order internally so `pack` owns the swap.
        Self(a, ([b.0[1], b.0[0]], [b.1[1], b.1[0]]), c)
    }
}

impl From<Proof> for ArkProof<Bn254> {
    fn from(proof: Proof) -> Self {
        let eth_proof = ark_circom::ethereum::Proof {
            a: ark_circom::ethereum::G1 {
                x: proof.0 .0,
                y: proof.0 .1,
            },
            b: ark_circom::ethereum::G2 {
                x: proof.1 .0,
                y: proof.1 .1,
            },
            c: ark_circom::ethereum::G1 {
                x: proof.2 .0,
                y: proof.2 .1,
            },
        };
        eth_proof.into()
    }
}

/// Generates the nullifier hash
#[must_use]
pub fn generate_nullifier_hash(identity: &Identity, external_nullifier: Field) -> Field {
    poseidon::hash2(external_nullifier, identity.nullifier)
}

/// Derive the external nullifier scalar for an `(app_id, action)` pair.
///
/// The app id is hashed to the field first, then tightly packed as a 32-byte
/// word followed by the raw UTF-8 bytes of the action (no length prefix) and
/// hashed again. An empty action degenerates to hashing just the packed word,
/// which is what the remote verifiers compute for action-less requests.
#[must_use]
pub fn generate_external_nullifier(app_id: &str, action: &str) -> FieldHash {
    let app_hash = hash_to_field(app_id.as_bytes()).hash();
    let mut packed = app_hash.to_be_bytes::<32>().to_vec();
    packed.extend_from_slice(action.as_bytes());
    hash_to_field(&packed)
}

/// Proving input for one membership proof.
///
/// Assembled fresh for every proof request and consumed exactly once; the
/// Merkle inclusion may change between calls, so witnesses are never reused.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Witness {
    pub identity_trapdoor: Field,
    pub identity_nullifier: Field,
    pub tree_path_indices: Vec<Field>,
    pub tree_siblings: Vec<Field>,
    pub external_nullifier: Field,
    pub signal_hash: Field,
}

impl Witness {
    #[must_use]
    pub fn assemble(
        identity: &Identity,
        merkle_proof: &MerkleProof,
        external_nullifier_hash: Field,
        signal_hash: Field,
    ) -> Self {
        Self {
            identity_trapdoor: identity.trapdoor,
            identity_nullifier: identity.nullifier,
            tree_path_indices: merkle_proof.path_index(),
            tree_siblings: merkle_proof.siblings(),
            external_nullifier: external_nullifier_hash,
            signal_hash,
        }
    }

    /// Inputs keyed by the circuit's signal names.
    #[must_use]
    pub fn circuit_inputs(&self) -> [(&'static str, Vec<Field>); 6] {
        [
            ("identityNullifier", vec![self.identity_nullifier]),
            ("identityTrapdoor", vec![self.identity_trapdoor]),
            ("treePathIndices", self.tree_path_indices.clone()),
            ("treeSiblings", self.tree_siblings.clone()),
            ("externalNullifier", vec![self.external_nullifier]),
            ("signalHash", vec![self.signal_hash]),
        ]
    }
}

/// What a proving backend returns: the native proof plus the public outputs
/// recovered from the witness.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProverOutput {
    pub proof: Proof,
    pub merkle_root: Field,
    pub nullifier_hash: Field,
}

/// The seam to the external prover. The real implementation is
/// [`crate::circuit::Circuit`]; tests substitute their own.
pub trait ProvingBackend {
    /// Produce a proof for the given witness.
    ///
    /// This is the only slow call in the pipeline (seconds). Failures are
    /// surfaced as-is and never retried.
    ///
    /// # Errors
    ///
    /// Returns a [`ProofError`] on a malformed witness or a prover fault.
    fn prove(&self, witness: &Witness) -> Result<ProverOutput, ProofError>;
}

/// The unit exchanged with every verifier: the public inputs plus the proof
/// in flat form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullProofRecord {
    pub merkle_root: Field,
    pub nullifier_hash: Field,
    pub signal_hash: Field,
    pub external_nullifier_hash: Field,
    pub proof: [U256; 8],
}

#[derive(Error, Debug)]
pub enum ProofError {
    #[error("Error reading circuit key: {0}")]
    CircuitKeyError(#[from] std::io::Error),
    #[error("Error deserializing circuit key: {0}")]
    CircuitKeyDeserializationError(#[from] ark_serialize::SerializationError),
    #[error("Error loading circuit program: {0}")]
    CircuitLoadError(color_eyre::Report),
    #[error("Error producing witness: {0}")]
    WitnessError(color_eyre::Report),
    #[error("Error producing proof: {0}")]
    SynthesisError(#[from] SynthesisError),
    #[error("Error converting public input: {0}")]
    ToFieldError(#[from] ruint::ToFieldError),
}

/// Run the full pipeline: assemble the witness, invoke the backend and shape
/// the output into a [`FullProofRecord`].
///
/// # Errors
///
/// Any backend failure aborts the attempt; no partial record is emitted.
pub fn generate_proof_record<B: ProvingBackend>(
    backend: &B,
    identity: &Identity,
    merkle_proof: &MerkleProof,
    external_nullifier_hash: Field,
    signal_hash: Field,
) -> Result<FullProofRecord, ProofError> {
    let witness = Witness::assemble(identity, merkle_proof, external_nullifier_hash, signal_hash);
    let output = backend.prove(&witness)?;
    Ok(FullProofRecord {
        merkle_root: output.merkle_root,
        nullifier_hash: output.nullifier_hash,
        signal_hash,
        external_nullifier_hash,
        proof: output.proof.pack(),
    })
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    fn arb_proof() -> impl Strategy<Value = Proof> {
        proptest::array::uniform8(proptest::array::uniform4(any::<u64>()))
            .prop_map(|limbs| Proof::unpack(limbs.map(U256)))
    }

    #[test]
    fn test_pack_order() {
        let proof = Proof(
            (U256::from(1), U256::from(2)),
            ([U256::from(3), U256::from(4)], [
                U256::from(5),
                U256::from(6),
            ]),
            (U256::from(7), U256::from(8)),
        );
        let flat = proof.pack();
        let expected = [1_u64, 2, 4, 3, 6, 5, 7, 8].map(U256::from);
        assert_eq!(flat, expected);
    }

    #[test]
    fn test_unpack_is_inverse() {
        let flat = [11_u64, 22, 33, 44, 55, 66, 77, 88].map(U256::from);
        assert_eq!(Proof::unpack(flat).pack(), flat);
    }

    proptest! {
        #[test]
        fn test_pack_roundtrip(proof in arb_proof()) {
            prop_assert_eq!(Proof::unpack(proof.pack()), proof);
        }

        #[test]
        fn test_distinct_actions_distinct_nullifiers(
            a in "[a-z0-9_-]{1,24}",
            b in "[a-z0-9_-]{1,24}",
        ) {
            prop_assume!(a != b);
            prop_assert_ne!(
                generate_external_nullifier("app_staging_x", &a),
                generate_external_nullifier("app_staging_x", &b)
            );
        }
    }

    #[test]
    fn test_external_nullifier_is_deterministic() {
        let a = generate_external_nullifier("app_staging_x", "vote");
        let b = generate_external_nullifier("app_staging_x", "vote");
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_action_hashes_packed_word_only() {
        let app_hash = hash_to_field(b"app_staging_x").hash();
        assert_eq!(
            generate_external_nullifier("app_staging_x", ""),
            hash_to_field(&app_hash.to_be_bytes::<32>())
        );
    }

    #[test]
    fn test_nullifier_hash_binds_external_nullifier() {
        let identity = Identity::from_secret(b"hello");
        let a = generate_nullifier_hash(&identity, Field::from(1));
        let b = generate_nullifier_hash(&identity, Field::from(2));
        assert_ne!(a, b);
        assert_eq!(
            a,
            poseidon::hash2(Field::from(1), identity.nullifier)
        );
    }

    #[test]
    fn test_witness_carries_record_order() {
        use crate::merkle::InclusionProofEntry;

        let entries = (0..16)
            .map(|level| InclusionProofEntry::left(Field::from(level as u64)))
            .collect::<Vec<_>>();
        let merkle_proof = MerkleProof::from_inclusion_record(&entries).unwrap();
        let identity = Identity::from_secret(b"hello");
        let witness = Witness::assemble(
            &identity,
            &merkle_proof,
            Field::from(3),
            Field::from(4),
        );
        assert_eq!(witness.tree_siblings, merkle_proof.siblings());
        assert_eq!(witness.tree_path_indices, merkle_proof.path_index());
        assert_eq!(witness.external_nullifier, Field::from(3));
        assert_eq!(witness.signal_hash, Field::from(4));
    }
}
