//! Runtime configuration.
//!
//! Non-secret settings come from a JSON file with per-field defaults; key
//! material and the account address come from the environment (`.env`
//! supported through `dotenv` in the binary).

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StarkError};
use crate::felt::{parse_felt, Felt};
use crate::rpc::DEFAULT_NONCE_ENTRY_POINT;
use crate::signer::KeyPair;
use crate::transaction::Account;

pub const PRIVATE_KEY_VAR: &str = "STARK_PRIVATE_KEY";
pub const ACCOUNT_ADDRESS_VAR: &str = "ACCOUNT_ADDRESS";
pub const RPC_URL_VAR: &str = "STARKNET_RPC_URL";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SignerConfig {
    /// JSON-RPC endpoint of the node
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Upper bound on a nonce read, in milliseconds
    #[serde(default = "default_nonce_timeout_ms")]
    pub nonce_timeout_ms: u64,

    /// Account view that returns the nonce
    #[serde(default = "default_nonce_entry_point")]
    pub nonce_entry_point: String,

    /// Max fee attached to submitted invokes (hex or decimal)
    #[serde(default = "default_max_fee")]
    pub max_fee: String,
}

fn default_rpc_url() -> String {
    "http://127.0.0.1:5050/rpc".to_string()
}

fn default_nonce_timeout_ms() -> u64 {
    30_000
}

fn default_nonce_entry_point() -> String {
    DEFAULT_NONCE_ENTRY_POINT.to_string()
}

fn default_max_fee() -> String {
    "0x0".to_string()
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            nonce_timeout_ms: default_nonce_timeout_ms(),
            nonce_entry_point: default_nonce_entry_point(),
            max_fee: default_max_fee(),
        }
    }
}

impl SignerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Apply `STARKNET_RPC_URL` if set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = env::var(RPC_URL_VAR) {
            self.rpc_url = url;
        }
        self
    }

    pub fn nonce_timeout(&self) -> Duration {
        Duration::from_millis(self.nonce_timeout_ms)
    }

    pub fn max_fee(&self) -> Result<Felt> {
        parse_felt(&self.max_fee, "max_fee")
    }
}

/// Build the signing account from `STARK_PRIVATE_KEY` and `ACCOUNT_ADDRESS`.
pub fn account_from_env() -> Result<Account> {
    let private_key = env::var(PRIVATE_KEY_VAR)
        .map_err(|_| StarkError::Config(format!("{PRIVATE_KEY_VAR} must be set")))?;
    let address = env::var(ACCOUNT_ADDRESS_VAR)
        .map_err(|_| StarkError::Config(format!("{ACCOUNT_ADDRESS_VAR} must be set")))?;

    let key = KeyPair::from_str_key(&private_key)?;
    let address = parse_felt(&address, "account address")?;
    Ok(Account::new(address, key))
}
