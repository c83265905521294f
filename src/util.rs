use tiny_keccak::{Hasher as _, Keccak};

pub(crate) fn keccak256(bytes: &[u8]) -> [u8; 32] {
    let mut output = [0; 32];
    let mut hasher = Keccak::v256();
    hasher.update(bytes);
    hasher.finalize(&mut output);
    output
}

/// Helper function to optionally remove `0x` prefix from hex strings.
pub(crate) fn trim_hex_prefix(str: &str) -> &str {
    str.strip_prefix("0x")
        .or_else(|| str.strip_prefix("0X"))
        .unwrap_or(str)
}

/// Zero-padded 32-byte hex form of an ABI word.
pub(crate) fn u256_to_hex(value: ethers_core::types::U256) -> String {
    let mut bytes = [0_u8; 32];
    value.to_big_endian(&mut bytes);
    format!("0x{}", hex::encode(bytes))
}
