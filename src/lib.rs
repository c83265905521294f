#![doc = include_str!("../README.md")]
#![warn(clippy::all, clippy::pedantic, clippy::cargo, clippy::nursery)]
// TODO: ark-circom and ethers-core pull in a lot of dependencies, some duplicate.
#![allow(clippy::multiple_crate_versions)]

pub mod circuit;
pub mod client;
pub mod config;
mod field;
pub mod identity;
pub mod merkle;
pub mod packed_proof;
pub mod poseidon;
pub mod protocol;
mod util;

// Export types
pub use crate::field::{
    encode_field, field_to_hex, hash_to_field, EncodingMode, Field, FieldHash, HashingInputError,
};

pub type Groth16Proof = ark_groth16::Proof<ark_bn254::Bn254>;
pub type EthereumGroth16Proof = ark_circom::ethereum::Proof;

#[cfg(test)]
mod test {
    use ethers_core::types::U256;
    use rand::{RngCore as _, SeedableRng as _};
    use rand_chacha::ChaChaRng;

    use crate::identity::Identity;
    use crate::merkle::{InclusionProofEntry, MalformedProofRecord, MerkleProof};
    use crate::protocol::{
        generate_external_nullifier, generate_nullifier_hash, generate_proof_record, Proof,
        ProofError, ProverOutput, ProvingBackend, Witness,
    };
    use crate::util::keccak256;
    use crate::{hash_to_field, poseidon, EncodingMode, Field};

    #[test]
    fn test_field_serde() {
        let value = Field::from(0x1234_5678);
        let serialized = serde_json::to_value(value).unwrap();
        let deserialized = serde_json::from_value(serialized).unwrap();
        assert_eq!(value, deserialized);
    }

    /// A backend with the same interface contract as the real prover but no
    /// circuit artifacts: deterministic output, real Merkle root and
    /// nullifier hash recomputation.
    struct StubBackend;

    impl StubBackend {
        fn scalar(witness: &Witness, tag: u8) -> U256 {
            let mut bytes = vec![tag];
            bytes.extend_from_slice(&witness.identity_nullifier.to_be_bytes::<32>());
            bytes.extend_from_slice(&witness.external_nullifier.to_be_bytes::<32>());
            bytes.extend_from_slice(&witness.signal_hash.to_be_bytes::<32>());
            for sibling in &witness.tree_siblings {
                bytes.extend_from_slice(&sibling.to_be_bytes::<32>());
            }
            U256::from_big_endian(&keccak256(&bytes))
        }
    }

    impl ProvingBackend for StubBackend {
        fn prove(&self, witness: &Witness) -> Result<ProverOutput, ProofError> {
            let identity =
                Identity::from_parts(witness.identity_trapdoor, witness.identity_nullifier);

            // Recompute the root the way the circuit does: fold the siblings
            // over the leaf, branching on the path index.
            let mut node = identity.commitment();
            for (sibling, index) in witness.tree_siblings.iter().zip(&witness.tree_path_indices) {
                node = if *index == Field::from(0) {
                    poseidon::hash2(node, *sibling)
                } else {
                    poseidon::hash2(*sibling, node)
                };
            }

            let s = |tag| Self::scalar(witness, tag);
            Ok(ProverOutput {
                proof: Proof((s(0), s(1)), ([s(2), s(3)], [s(4), s(5)]), (s(6), s(7))),
                merkle_root: node,
                nullifier_hash: poseidon::hash2(
                    witness.external_nullifier,
                    witness.identity_nullifier,
                ),
            })
        }
    }

    fn sample_record() -> Vec<InclusionProofEntry> {
        (0..20)
            .map(|level| {
                let sibling = Field::from(1000 + level as u64);
                if level % 5 == 0 {
                    InclusionProofEntry::right(sibling)
                } else {
                    InclusionProofEntry::left(sibling)
                }
            })
            .collect()
    }

    #[test]
    fn test_pipeline_is_deterministic() {
        // Deterministic randomness for testing
        let mut rng = ChaChaRng::seed_from_u64(123);
        let mut secret = [0u8; 32];
        rng.fill_bytes(&mut secret);

        let identity = Identity::from_secret(&secret);
        let merkle_proof = MerkleProof::from_inclusion_record(&sample_record()).unwrap();
        let external = generate_external_nullifier("app_staging_x", "").hash();
        let signal = crate::encode_field(EncodingMode::HashedString, "my_signal")
            .unwrap()
            .hash();

        let run = || {
            let record = generate_proof_record(
                &StubBackend,
                &identity,
                &merkle_proof,
                external,
                signal,
            )
            .unwrap();
            serde_json::to_string(&record).unwrap()
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn test_record_carries_public_inputs() {
        let identity = Identity::from_secret(b"hello");
        let merkle_proof = MerkleProof::from_inclusion_record(&sample_record()).unwrap();
        let external = generate_external_nullifier("app_staging_x", "vote").hash();
        let signal = hash_to_field(b"xxx").hash();

        let record =
            generate_proof_record(&StubBackend, &identity, &merkle_proof, external, signal)
                .unwrap();

        assert_eq!(record.external_nullifier_hash, external);
        assert_eq!(record.signal_hash, signal);
        assert_eq!(
            record.nullifier_hash,
            generate_nullifier_hash(&identity, external)
        );
        // The flat proof survives a trip through the native shape.
        assert_eq!(Proof::unpack(record.proof).pack(), record.proof);
    }

    #[test]
    fn test_sibling_side_changes_root() {
        let identity = Identity::from_secret(b"hello");
        let external = hash_to_field(b"appId").hash();
        let signal = hash_to_field(b"xxx").hash();

        let mut flipped = sample_record();
        flipped[3] = InclusionProofEntry::right(Field::from(1003));

        let base = MerkleProof::from_inclusion_record(&sample_record()).unwrap();
        let flipped = MerkleProof::from_inclusion_record(&flipped).unwrap();

        let root = |proof| {
            generate_proof_record(&StubBackend, &identity, proof, external, signal)
                .unwrap()
                .merkle_root
        };
        assert_ne!(root(&base), root(&flipped));
    }

    #[test]
    fn test_malformed_record_never_reaches_the_backend() {
        let mut entries = sample_record();
        entries[7] = InclusionProofEntry {
            left: Some(Field::from(0xaa)),
            right: Some(Field::from(0xbb)),
        };

        let result = MerkleProof::from_inclusion_record(&entries);
        assert_eq!(result.unwrap_err(), MalformedProofRecord::AmbiguousBranch(7));
    }
}
