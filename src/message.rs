//! Transaction message hash.
//!
//! `hash_on_elements([sender, target, selector, hash_on_elements(calldata), nonce])`
//!
//! The field order is part of the wire contract with the account contract
//! and must not change.

use tracing::debug;

use crate::error::Result;
use crate::felt::{felt_to_hex, Felt};
use crate::pedersen::PedersenHasher;

/// Everything a signature commits to for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionIntent {
    pub sender: Felt,
    pub target: Felt,
    pub selector: Felt,
    pub calldata: Vec<Felt>,
    pub nonce: Felt,
}

impl TransactionIntent {
    pub fn message_hash(&self, hasher: &PedersenHasher) -> Result<Felt> {
        message_hash(
            hasher,
            &self.sender,
            &self.target,
            &self.selector,
            &self.calldata,
            &self.nonce,
        )
    }
}

/// Digest of the calldata array (an empty array still hashes its length).
pub fn hash_calldata(hasher: &PedersenHasher, calldata: &[Felt]) -> Result<Felt> {
    hasher.hash_on_elements(calldata)
}

pub fn message_hash(
    hasher: &PedersenHasher,
    sender: &Felt,
    target: &Felt,
    selector: &Felt,
    calldata: &[Felt],
    nonce: &Felt,
) -> Result<Felt> {
    let calldata_digest = hash_calldata(hasher, calldata)?;
    let hash = hasher.hash_on_elements(&[*sender, *target, *selector, calldata_digest, *nonce])?;
    debug!(
        "Message hash {} (calldata {} felts, nonce {})",
        felt_to_hex(&hash),
        calldata.len(),
        nonce
    );
    Ok(hash)
}
