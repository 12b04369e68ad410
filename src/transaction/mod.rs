//! Transaction building: nonce resolution, calldata flattening, hashing and signing.
//!
//! The only I/O is the nonce read, which goes through `NonceSource` and is
//! bounded by a caller-supplied timeout. Everything else is pure.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, StarkError};
use crate::felt::{felt_to_hex, Felt};
use crate::message::message_hash;
use crate::pedersen::PedersenHasher;
use crate::selector::get_selector_from_name;
use crate::signer::{KeyPair, Signature};


/// Default bound on the nonce read.
pub const DEFAULT_NONCE_TIMEOUT: Duration = Duration::from_secs(30);

/// One calldata argument: a felt, or an array written as `[len, items...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Calldata {
    Felt(Felt),
    Array(Vec<Felt>),
}

impl From<Felt> for Calldata {
    fn from(value: Felt) -> Self {
        Calldata::Felt(value)
    }
}

impl From<u64> for Calldata {
    fn from(value: u64) -> Self {
        Calldata::Felt(Felt::from(value))
    }
}

impl From<Vec<Felt>> for Calldata {
    fn from(values: Vec<Felt>) -> Self {
        Calldata::Array(values)
    }
}

/// Flatten calldata, replacing each array by its length followed by its items.
pub fn flatten_calldata(calldata: &[Calldata]) -> Vec<Felt> {
    let mut flat = Vec::with_capacity(calldata.len());
    for item in calldata {
        match item {
            Calldata::Felt(value) => flat.push(*value),
            Calldata::Array(values) => {
                flat.push(Felt::from(values.len() as u64));
                flat.extend_from_slice(values);
            }
        }
    }
    flat
}

/// Signed call ready for the account's `execute` entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    #[serde(with = "crate::felt::serde_hex")]
    pub selector: Felt,
    #[serde(with = "crate::felt::serde_hex")]
    pub r: Felt,
    #[serde(with = "crate::felt::serde_hex")]
    pub s: Felt,
    #[serde(with = "crate::felt::serde_hex")]
    pub nonce: Felt,
    #[serde(with = "crate::felt::serde_hex_vec")]
    pub calldata: Vec<Felt>,
}

impl SubmissionPayload {
    pub fn signature(&self) -> Signature {
        Signature { r: self.r, s: self.s }
    }

    /// Arguments of `execute(to, selector, calldata_len, calldata, nonce)`.
    pub fn execute_calldata(&self, target: &Felt) -> Vec<Felt> {
        let mut out = Vec::with_capacity(self.calldata.len() + 4);
        out.push(*target);
        out.push(self.selector);
        out.push(Felt::from(self.calldata.len() as u64));
        out.extend_from_slice(&self.calldata);
        out.push(self.nonce);
        out
    }
}

/// Source of an account's current nonce (the external chain).
pub trait NonceSource {
    fn get_nonce(&self, account: &Felt) -> impl Future<Output = Result<Felt>> + Send;
}

/// Hands a signed payload to the execution layer.
///
/// Returns the transaction hash. Rejections surface as `SignatureRejected`.
pub trait TransactionSubmitter {
    fn submit(
        &self,
        sender: &Felt,
        target: &Felt,
        payload: &SubmissionPayload,
    ) -> impl Future<Output = Result<Felt>> + Send;
}

/// Signing key bound to the account contract address it controls.
#[derive(Debug, Clone)]
pub struct Account {
    address: Felt,
    key: KeyPair,
}

impl Account {
    pub fn new(address: Felt, key: KeyPair) -> Self {
        Self { address, key }
    }

    pub fn address(&self) -> Felt {
        self.address
    }

    pub fn key(&self) -> &KeyPair {
        &self.key
    }

    pub fn stark_key(&self) -> Felt {
        self.key.stark_key()
    }
}

/// Read the current nonce, mapping failures and timeouts to `NonceFetchFailed`.
pub async fn fetch_nonce<N: NonceSource>(source: &N, account: &Felt, timeout: Duration) -> Result<Felt> {
    match tokio::time::timeout(timeout, source.get_nonce(account)).await {
        Ok(Ok(nonce)) => Ok(nonce),
        Ok(Err(e)) => {
            warn!("Nonce read for {} failed: {}", felt_to_hex(account), e);
            Err(StarkError::NonceFetchFailed(e.to_string()))
        }
        Err(_) => {
            warn!("Nonce read for {} timed out after {:?}", felt_to_hex(account), timeout);
            Err(StarkError::NonceFetchFailed(format!("timed out after {timeout:?}")))
        }
    }
}

/// Builds signed payloads for an account.
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    hasher: PedersenHasher,
    nonce_timeout: Duration,
}

impl TransactionBuilder {
    pub fn new(hasher: PedersenHasher) -> Self {
        Self {
            hasher,
            nonce_timeout: DEFAULT_NONCE_TIMEOUT,
        }
    }

    pub fn with_nonce_timeout(mut self, timeout: Duration) -> Self {
        self.nonce_timeout = timeout;
        self
    }

    pub fn hasher(&self) -> &PedersenHasher {
        &self.hasher
    }

    /// Build with a known nonce. Pure: no I/O.
    pub fn build_with_nonce(
        &self,
        account: &Account,
        target: &Felt,
        entry_point: &str,
        calldata: &[Calldata],
        nonce: Felt,
    ) -> Result<SubmissionPayload> {
        let flat = flatten_calldata(calldata);
        let selector = get_selector_from_name(entry_point)?;
        let msg_hash = message_hash(&self.hasher, &account.address, target, &selector, &flat, &nonce)?;
        let signature = account.key.sign(&msg_hash)?;

        debug!(
            "Built {} -> {}::{} nonce {} hash {}",
            felt_to_hex(&account.address),
            felt_to_hex(target),
            entry_point,
            nonce,
            felt_to_hex(&msg_hash)
        );

        Ok(SubmissionPayload {
            selector,
            r: signature.r,
            s: signature.s,
            nonce,
            calldata: flat,
        })
    }

    /// Build, reading the nonce from `source` when none is given.
    pub async fn build<N: NonceSource>(
        &self,
        source: &N,
        account: &Account,
        target: &Felt,
        entry_point: &str,
        calldata: &[Calldata],
        nonce: Option<Felt>,
    ) -> Result<SubmissionPayload> {
        let nonce = match nonce {
            Some(nonce) => nonce,
            None => fetch_nonce(source, &account.address, self.nonce_timeout).await?,
        };
        self.build_with_nonce(account, target, entry_point, calldata, nonce)
    }

    /// Build and submit in one step. Returns the transaction hash.
    pub async fn send<C: NonceSource + TransactionSubmitter>(
        &self,
        chain: &C,
        account: &Account,
        target: &Felt,
        entry_point: &str,
        calldata: &[Calldata],
        nonce: Option<Felt>,
    ) -> Result<Felt> {
        let payload = self.build(chain, account, target, entry_point, calldata, nonce).await?;
        let tx_hash = chain.submit(&account.address, target, &payload).await?;
        info!(
            "Submitted {} to {} with nonce {}: {}",
            entry_point,
            felt_to_hex(target),
            payload.nonce,
            felt_to_hex(&tx_hash)
        );
        Ok(tx_hash)
    }

    /// Current nonce of `account`.
    pub async fn nonce<N: NonceSource>(&self, source: &N, account: &Account) -> Result<Felt> {
        fetch_nonce(source, &account.address, self.nonce_timeout).await
    }
}
