//! Circomlib-compatible Poseidon hashing over [`Field`] values.
//!
//! Thin wrapper around the `poseidon-rs` implementation; inputs are reduced
//! into the field before hashing so the conversions below cannot fail.

use ff::{PrimeField, PrimeFieldRepr};
use once_cell::sync::Lazy;
use poseidon_rs::{Fr, FrRepr, Poseidon};

use crate::field::{Field, MODULUS};

static POSEIDON: Lazy<Poseidon> = Lazy::new(Poseidon::new);

fn to_fr(value: Field) -> Fr {
    let reduced = value % MODULUS;
    let mut repr = FrRepr::default();
    repr.read_be(&reduced.to_be_bytes::<32>()[..])
        .expect("32 bytes always fit the representation");
    Fr::from_repr(repr).expect("value is reduced")
}

fn from_fr(fr: Fr) -> Field {
    let mut bytes = [0_u8; 32];
    fr.into_repr()
        .write_be(&mut bytes[..])
        .expect("representation is always 32 bytes");
    Field::from_be_bytes(bytes)
}

/// Compute the one-value Poseidon hash function.
#[must_use]
#[allow(clippy::missing_panics_doc)]
pub fn hash1(value: Field) -> Field {
    let hash = POSEIDON
        .hash(vec![to_fr(value)])
        .expect("poseidon accepts one input");
    from_fr(hash)
}

/// Compute the two-value Poseidon hash function.
#[must_use]
#[allow(clippy::missing_panics_doc)]
pub fn hash2(left: Field, right: Field) -> Field {
    let hash = POSEIDON
        .hash(vec![to_fr(left), to_fr(right)])
        .expect("poseidon accepts two inputs");
    from_fr(hash)
}
