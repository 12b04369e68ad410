use thiserror::Error;

#[derive(Error, Debug)]
pub enum StarkError {
    /// A felt, signature component or derived value is outside its domain.
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Short string too long: {len} bytes (max 31)")]
    TooLong { len: usize },

    /// Pedersen accumulator hit the x-coordinate of a basis point.
    #[error("Pedersen hash degeneracy: accumulator x equals basis point x")]
    HashCollisionGuard,

    #[error("Degenerate curve operation (point at infinity)")]
    DegenerateOperation,

    #[error("Nonce fetch failed: {0}")]
    NonceFetchFailed(String),

    #[error("Transaction rejected: {0}")]
    SignatureRejected(String),

    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// JSON-RPC `error` object returned by the node.
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Invalid RPC response: {0}")]
    InvalidResponse(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StarkError {
    pub(crate) fn range(field: impl Into<String>) -> Self {
        StarkError::InvalidRange(field.into())
    }

    /// True for failures the caller can fix by changing its input.
    /// External failures (nonce reads, chain rejection, transport) return false.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            StarkError::InvalidRange(_)
                | StarkError::TooLong { .. }
                | StarkError::HashCollisionGuard
                | StarkError::DegenerateOperation
                | StarkError::InvalidHex(_)
                | StarkError::Config(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, StarkError>;
