use crate::error::{Result, StarkError};
use crate::felt::{felt_to_hex, parse_felt, Felt};
use crate::selector::get_selector_from_name;
use crate::transaction::{NonceSource, SubmissionPayload, TransactionSubmitter};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info};

/// Account view returning the current nonce.
pub const DEFAULT_NONCE_ENTRY_POINT: &str = "getNonce";

/// Account entry point receiving signed calls.
pub const EXECUTE_ENTRY_POINT: &str = "execute";

/// JSON-RPC client for a Starknet node
pub struct RpcClient {
    client: Client,
    rpc_url: String,
    nonce_entry_point: String,
    max_fee: Felt,
}

impl RpcClient {
    /// Create a new RPC client for the given node URL
    pub fn new(rpc_url: &str) -> Result<Self> {
        url::Url::parse(rpc_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("stark-tx-signer/0.1.0")
            .build()?;

        Ok(Self {
            client,
            rpc_url: rpc_url.to_string(),
            nonce_entry_point: DEFAULT_NONCE_ENTRY_POINT.to_string(),
            max_fee: Felt::ZERO,
        })
    }

    /// Use a different view for nonce reads (e.g. `get_nonce`)
    pub fn with_nonce_entry_point(mut self, entry_point: &str) -> Self {
        self.nonce_entry_point = entry_point.to_string();
        self
    }

    pub fn with_max_fee(mut self, max_fee: Felt) -> Self {
        self.max_fee = max_fee;
        self
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Call a view function and return its result felts
    pub async fn call(&self, contract: &Felt, entry_point: &str, calldata: &[Felt]) -> Result<Vec<Felt>> {
        let selector = get_selector_from_name(entry_point)?;
        let params = serde_json::json!({
            "request": {
                "contract_address": felt_to_hex(contract),
                "entry_point_selector": felt_to_hex(&selector),
                "calldata": hex_list(calldata),
            },
            "block_id": "latest"
        });
        debug!("Calling {}::{}", felt_to_hex(contract), entry_point);

        let result = self.rpc_call("starknet_call", params).await?;
        parse_felt_list(&result)
    }

    /// Send a JSON-RPC request and return its `result`
    async fn rpc_call(&self, method: &str, params: Value) -> Result<Value> {
        let request = json_rpc_request(method, params);
        let response = self.client.post(&self.rpc_url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("RPC error: {} - {}", status, error_text);
            return Err(StarkError::HttpStatus {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let body: Value = response.json().await?;
        extract_result(body)
    }
}

impl NonceSource for RpcClient {
    async fn get_nonce(&self, account: &Felt) -> Result<Felt> {
        let values = self.call(account, &self.nonce_entry_point, &[]).await?;
        values
            .first()
            .copied()
            .ok_or_else(|| StarkError::InvalidResponse("empty nonce result".to_string()))
    }
}

impl TransactionSubmitter for RpcClient {
    async fn submit(&self, sender: &Felt, target: &Felt, payload: &SubmissionPayload) -> Result<Felt> {
        let params = invoke_params(sender, target, payload, &self.max_fee)?;
        let result = match self.rpc_call("starknet_addInvokeTransaction", params).await {
            Ok(result) => result,
            Err(StarkError::Rpc(message)) => {
                error!("Transaction rejected: {}", message);
                return Err(StarkError::SignatureRejected(message));
            }
            Err(e) => return Err(e),
        };

        let tx_hash = result
            .get("transaction_hash")
            .and_then(|v| v.as_str())
            .ok_or_else(|| StarkError::InvalidResponse("missing transaction_hash".to_string()))?;
        info!("Transaction accepted: {}", tx_hash);
        parse_felt(tx_hash, "transaction_hash")
    }
}

/// Parameters of a version 0 invoke of the account's `execute`
pub fn invoke_params(sender: &Felt, target: &Felt, payload: &SubmissionPayload, max_fee: &Felt) -> Result<Value> {
    let selector = get_selector_from_name(EXECUTE_ENTRY_POINT)?;
    Ok(serde_json::json!({
        "invoke_transaction": {
            "type": "INVOKE",
            "version": "0x0",
            "max_fee": felt_to_hex(max_fee),
            "contract_address": felt_to_hex(sender),
            "entry_point_selector": felt_to_hex(&selector),
            "calldata": hex_list(&payload.execute_calldata(target)),
            "signature": [felt_to_hex(&payload.r), felt_to_hex(&payload.s)],
        }
    }))
}

fn json_rpc_request(method: &str, params: Value) -> Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": method,
        "params": params
    })
}

fn hex_list(felts: &[Felt]) -> Vec<String> {
    felts.iter().map(felt_to_hex).collect()
}

/// Pull `result` out of a JSON-RPC response, turning `error` into `StarkError::Rpc`
fn extract_result(body: Value) -> Result<Value> {
    if let Some(error) = body.get("error") {
        let message = error
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown error");
        let data = error.get("data").map(|d| format!(" ({d})")).unwrap_or_default();
        return Err(StarkError::Rpc(format!("{message}{data}")));
    }
    body.get("result")
        .cloned()
        .ok_or_else(|| StarkError::InvalidResponse("missing result".to_string()))
}

fn parse_felt_list(value: &Value) -> Result<Vec<Felt>> {
    let items = value
        .as_array()
        .ok_or_else(|| StarkError::InvalidResponse("expected array result".to_string()))?;
    items
        .iter()
        .map(|v| {
            let s = v
                .as_str()
                .ok_or_else(|| StarkError::InvalidResponse("expected felt string".to_string()))?;
            parse_felt(s, "rpc result")
        })
        .collect()
}
