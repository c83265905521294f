use ruint::{aliases::U256, uint};
use thiserror::Error;

use crate::util::{keccak256, trim_hex_prefix};

/// An element of the BN254 scalar field Fr.
///
/// Represented as a big-endian byte vector without Montgomery reduction.
pub type Field = U256;

// See <https://docs.rs/ark-bn254/latest/ark_bn254>
pub const MODULUS: Field =
    uint!(21888242871839275222246405745257275088548364400416034343698204186575808495617_U256);

/// Canonical wire form of a field element: `0x` followed by 64 zero-padded
/// hex digits, big-endian.
#[must_use]
pub fn field_to_hex(value: Field) -> String {
    format!("0x{}", hex::encode(value.to_be_bytes::<32>()))
}

/// A value hashed into the field, together with its canonical wire digest.
///
/// `digest` is always the zero-padded hex form of `hash`; the only constructor
/// derives one from the other.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldHash {
    hash: Field,
    digest: String,
}

impl FieldHash {
    fn new(hash: Field) -> Self {
        Self {
            digest: field_to_hex(hash),
            hash,
        }
    }

    #[must_use]
    pub const fn hash(&self) -> Field {
        self.hash
    }

    #[must_use]
    pub fn digest(&self) -> &str {
        &self.digest
    }
}

/// Hash arbitrary data to a field element.
///
/// This is used to create `signal_hash` and `external_nullifier_hash`.
#[must_use]
#[allow(clippy::missing_panics_doc)]
pub fn hash_to_field(data: &[u8]) -> FieldHash {
    // Never panics because the target uint is large enough.
    let n = U256::try_from_be_slice(&keccak256(data)).unwrap();
    // Shift right one byte to make it fit in the field
    FieldHash::new(n >> 8)
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum HashingInputError {
    #[error("`{0}` is not a hex-encoded byte string")]
    NotByteLike(String),
    #[error("`{0}` is not a decimal or hex field element")]
    NotNumeric(String),
    #[error("`{0}` does not fit in the proving field")]
    FieldOverflow(String),
}

/// How a caller-provided input becomes a field element.
///
/// On-chain verifiers cannot tell which encoding a prover used, so picking the
/// wrong one yields an `InvalidProof` revert with no further hint. Callers must
/// resolve the mode once, up front, rather than probing a live verifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncodingMode {
    /// The input is already a field-sized number; pass it through unhashed.
    PlainField,
    /// The input is a hex byte string (e.g. an address); hash its raw bytes.
    HashedBytes,
    /// Hash the UTF-8 bytes of the input.
    HashedString,
}

impl EncodingMode {
    /// Best-effort guess: byte-like inputs (`0x` + even-length hex) hash as
    /// raw bytes, anything else as a UTF-8 string.
    ///
    /// This cannot detect [`Self::PlainField`] inputs; prefer an explicit
    /// mode whenever the caller knows what the verifier expects.
    #[must_use]
    pub fn detect(input: &str) -> Self {
        if is_bytes_like(input) {
            Self::HashedBytes
        } else {
            Self::HashedString
        }
    }
}

fn is_bytes_like(input: &str) -> bool {
    input.strip_prefix("0x").map_or(false, |digits| {
        digits.len() % 2 == 0 && digits.bytes().all(|b| b.is_ascii_hexdigit())
    })
}

/// Resolve `input` into a field element under an explicit encoding mode.
///
/// # Errors
///
/// Returns a [`HashingInputError`] when the input does not match the chosen
/// mode; the ambiguity is surfaced, never papered over.
pub fn encode_field(mode: EncodingMode, input: &str) -> Result<FieldHash, HashingInputError> {
    match mode {
        EncodingMode::PlainField => {
            let trimmed = trim_hex_prefix(input);
            let parsed = if trimmed.len() == input.len() {
                Field::from_str_radix(input, 10)
            } else {
                Field::from_str_radix(trimmed, 16)
            };
            let value =
                parsed.map_err(|_| HashingInputError::NotNumeric(input.to_owned()))?;
            if value >= MODULUS {
                return Err(HashingInputError::FieldOverflow(input.to_owned()));
            }
            Ok(FieldHash::new(value))
        }
        EncodingMode::HashedBytes => {
            if !is_bytes_like(input) {
                return Err(HashingInputError::NotByteLike(input.to_owned()));
            }
            let bytes = hex::decode(trim_hex_prefix(input))
                .map_err(|_| HashingInputError::NotByteLike(input.to_owned()))?;
            Ok(hash_to_field(&bytes))
        }
        EncodingMode::HashedString => Ok(hash_to_field(input.as_bytes())),
    }
}
