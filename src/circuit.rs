//! Groth16 proving backend driven by runtime circuit artifacts.
//!
//! Unlike deployments that bake the artifacts into the binary, the artifacts
//! here are plain files picked at startup so the same build can be pointed at
//! different circuit versions.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;

use ark_bn254::{Bn254, Fr};
use ark_circom::{read_zkey, CircomReduction, WitnessCalculator};
use ark_groth16::{prepare_verifying_key, Groth16, ProvingKey};
use ark_relations::r1cs::ConstraintMatrices;
use ark_std::UniformRand;
use rand::thread_rng;

use crate::protocol::{FullProofRecord, Proof, ProofError, ProverOutput, ProvingBackend, Witness};

/// Locations of the two files the prover needs.
#[derive(Clone, Debug)]
pub struct CircuitArtifacts {
    /// Witness generator (`semaphore.wasm`).
    pub wasm: PathBuf,
    /// Proving key (`semaphore.zkey`), which also embeds the verifying key
    /// and constraint matrices.
    pub zkey: PathBuf,
}

/// A loaded circuit: proving key, constraint matrices and the wasm witness
/// generator.
pub struct Circuit {
    zkey: (ProvingKey<Bn254>, ConstraintMatrices<Fr>),
    witness_calculator: Mutex<WitnessCalculator>,
}

impl Circuit {
    /// Load both artifacts from disk. Slow (hundreds of MB for deep trees),
    /// so load once and reuse.
    ///
    /// # Errors
    ///
    /// Returns a [`ProofError`] if either artifact cannot be read.
    pub fn load(artifacts: &CircuitArtifacts) -> Result<Self, ProofError> {
        let mut zkey_reader = BufReader::new(File::open(&artifacts.zkey)?);
        let zkey = read_zkey(&mut zkey_reader)?;

        let witness_calculator =
            WitnessCalculator::new(&artifacts.wasm).map_err(ProofError::CircuitLoadError)?;

        Ok(Self {
            zkey,
            witness_calculator: Mutex::new(witness_calculator),
        })
    }

    /// Verify a proof record against the verifying key embedded in the zkey.
    ///
    /// `Ok(false)` means the pairing check failed; it is not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`ProofError`] if a public input does not fit the scalar
    /// field or the pairing computation itself fails.
    pub fn verify(&self, record: &FullProofRecord) -> Result<bool, ProofError> {
        let pvk = prepare_verifying_key(&self.zkey.0.vk);

        let public_inputs = [
            record.merkle_root,
            record.nullifier_hash,
            record.signal_hash,
            record.external_nullifier_hash,
        ]
        .iter()
        .map(Fr::try_from)
        .collect::<Result<Vec<_>, _>>()?;

        let ark_proof = Proof::unpack(record.proof).into();
        let result = Groth16::<_, CircomReduction>::verify_proof(&pvk, &ark_proof, &public_inputs)?;
        Ok(result)
    }
}

impl ProvingBackend for Circuit {
    fn prove(&self, witness: &Witness) -> Result<ProverOutput, ProofError> {
        let inputs = witness.circuit_inputs().into_iter().map(|(name, values)| {
            (
                name.to_string(),
                values.iter().map(Into::into).collect::<Vec<_>>(),
            )
        });

        let now = Instant::now();

        let full_assignment = self
            .witness_calculator
            .lock()
            .expect("witness_calculator mutex should not get poisoned")
            .calculate_witness_element::<Bn254, _>(inputs, false)
            .map_err(ProofError::WitnessError)?;

        println!("witness generation took: {:.2?}", now.elapsed());

        // The public assignment starts with the constant 1, followed by the
        // circuit outputs: the merkle root and the nullifier hash.
        let merkle_root = full_assignment[1].into();
        let nullifier_hash = full_assignment[2].into();

        let mut rng = thread_rng();
        let r = Fr::rand(&mut rng);
        let s = Fr::rand(&mut rng);

        let now = Instant::now();
        let ark_proof = Groth16::<_, CircomReduction>::create_proof_with_reduction_and_matrices(
            &self.zkey.0,
            r,
            s,
            &self.zkey.1,
            self.zkey.1.num_instance_variables,
            self.zkey.1.num_constraints,
            full_assignment.as_slice(),
        )?;
        println!("proof generation took: {:.2?}", now.elapsed());

        Ok(ProverOutput {
            proof: ark_proof.into(),
            merkle_root,
            nullifier_hash,
        })
    }
}
