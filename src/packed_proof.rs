use std::fmt::Display;
use std::str::FromStr;

use ethabi::{decode, encode, ParamType, Token};
use ethers_core::types::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::protocol::Proof;
use crate::util::trim_hex_prefix;

/// A packed proof is a representation of the ZKP in a single attribute (as
/// opposed to array of arrays) which is easier to transport
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PackedProof(pub [u8; 256]);

impl From<Proof> for PackedProof {
    fn from(proof: Proof) -> Self {
        let tokens = Token::FixedArray(proof.pack().into_iter().map(Token::Uint).collect());

        let bytes = encode(&[tokens]);
        let mut encoded = [0u8; 256];
        encoded.copy_from_slice(&bytes[..256]);
        Self(encoded)
    }
}

impl From<PackedProof> for Proof {
    fn from(proof: PackedProof) -> Self {
        let decoded = decode(&vec![ParamType::Uint(256); 8], &proof.0).unwrap();
        let mut flat = [U256::zero(); 8];
        for (slot, token) in flat.iter_mut().zip(decoded) {
            *slot = token.into_uint().unwrap();
        }
        Self::unpack(flat)
    }
}

impl Display for PackedProof {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for PackedProof {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 256];
        hex::decode_to_slice(trim_hex_prefix(s), &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl Serialize for PackedProof {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PackedProof {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}
