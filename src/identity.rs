use sha2::{Digest, Sha256};

use crate::field::MODULUS;
use crate::util::keccak256;
use crate::{poseidon, Field};

/// Secret identity material: the trapdoor and nullifier pair.
///
/// Created once per user and persisted by the caller; everything downstream
/// only reads it. The commitment is derived, never stored.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Identity {
    pub trapdoor: Field,
    pub nullifier: Field,
}

fn sha(msg: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(msg);
    hasher.finalize().into()
}

fn seed_to_field(msg: &[u8]) -> Field {
    Field::from_be_bytes(sha(msg)) % MODULUS
}

impl Identity {
    /// Derive an identity from a secret seed.
    ///
    /// Follows the zk-kit derivation so identities round-trip with the other
    /// client tooling:
    /// <https://github.com/appliedzkp/zk-kit/blob/1ea410456fc2b95877efa7c671bc390ffbfb5d36/packages/identity/src/identity.ts#L58>
    #[must_use]
    pub fn from_secret(secret: &[u8]) -> Self {
        let seed_hash = hex::encode(sha(secret));
        Self {
            trapdoor: seed_to_field(format!("{seed_hash}identity_trapdoor").as_bytes()),
            nullifier: seed_to_field(format!("{seed_hash}identity_nullifier").as_bytes()),
        }
    }

    /// Derive an identity from a user-supplied seed string.
    ///
    /// The seed is keccak-hashed into a `0x`-prefixed hex message before the
    /// derivation, matching how the companion tooling seeds identities, so
    /// the same seed yields the same commitment everywhere.
    #[must_use]
    pub fn from_seed(seed: &str) -> Self {
        let message = format!("0x{}", hex::encode(keccak256(seed.as_bytes())));
        Self::from_secret(message.as_bytes())
    }

    /// Wrap secrets that were derived elsewhere (e.g. deserialized from a
    /// previously exported identity).
    #[must_use]
    pub const fn from_parts(trapdoor: Field, nullifier: Field) -> Self {
        Self {
            trapdoor,
            nullifier,
        }
    }

    #[must_use]
    pub fn secret_hash(&self) -> Field {
        poseidon::hash2(self.nullifier, self.trapdoor)
    }

    /// The Merkle leaf the sequencer indexes this identity by.
    #[must_use]
    pub fn commitment(&self) -> Field {
        poseidon::hash1(self.secret_hash())
    }
}
