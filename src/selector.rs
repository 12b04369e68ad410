/// Entry-point selectors: Keccak-256 masked to 250 bits

use sha3::{Digest, Keccak256};
use tracing::debug;

use crate::error::{Result, StarkError};
use crate::felt::{felt_to_hex, Felt};

/// Entry points the execution layer maps to selector zero.
const DEFAULT_ENTRY_POINT_NAME: &str = "__default__";
const DEFAULT_L1_ENTRY_POINT_NAME: &str = "__l1_default__";

/// Compute starknet_keccak hash
///
/// Standard Keccak-256 with the top 6 bits cleared, so the result is
/// below `2^250` and always a valid felt.
pub fn starknet_keccak(input: &[u8]) -> Felt {
    let mut hasher = Keccak256::new();
    hasher.update(input);
    let result = hasher.finalize();

    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&result);
    bytes[0] &= 0x03;
    Felt::from_bytes_be(&bytes)
}

/// Selector of an entry point, e.g. `"transfer"`.
///
/// Names are used verbatim: no trimming, no case folding.
pub fn get_selector_from_name(name: &str) -> Result<Felt> {
    if name == DEFAULT_ENTRY_POINT_NAME || name == DEFAULT_L1_ENTRY_POINT_NAME {
        return Ok(Felt::ZERO);
    }
    if !name.is_ascii() {
        return Err(StarkError::range("entry point name"));
    }
    let selector = starknet_keccak(name.as_bytes());
    debug!("Selector for '{}': {}", name, felt_to_hex(&selector));
    Ok(selector)
}
