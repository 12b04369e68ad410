pub mod codec;
pub mod config;
pub mod curve;
pub mod error;
pub mod felt;
pub mod message;
pub mod pedersen;
pub mod rpc;
pub mod selector;
pub mod signer;
pub mod transaction;

// Re-export commonly used types
pub use codec::{
    felt_array_to_string, felt_to_short_string, felts_to_uint256, short_string_to_felt,
    string_to_felt_array, uint256_to_felts,
};
pub use config::{account_from_env, SignerConfig};
pub use curve::{AffinePoint, EC_ORDER, GENERATOR};
pub use error::{Result, StarkError};
pub use felt::{felt_to_hex, hex_to_felt, parse_felt, Felt};
pub use message::{hash_calldata, message_hash, TransactionIntent};
pub use pedersen::{PedersenHasher, PedersenTable};
pub use rpc::RpcClient;
pub use selector::{get_selector_from_name, starknet_keccak};
pub use signer::{sign, verify, verify_stark_key, KeyPair, PublicKey, Signature};
pub use transaction::{
    fetch_nonce, flatten_calldata, Account, Calldata, NonceSource, SubmissionPayload,
    TransactionBuilder, TransactionSubmitter,
};

/// Initialize logging for the library
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();
}
