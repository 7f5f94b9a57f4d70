/// Errors from key decoding and signing.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("Invalid base58check encoding: {0}")]
    Base58(#[from] bs58::decode::Error),

    #[error("Unknown key prefix, expected an Ed25519 edsk key")]
    UnknownPrefix,

    #[error("Invalid key length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Embedded public key does not match the secret seed")]
    PublicKeyMismatch,

    #[error("Key rejected: {0}")]
    Rejected(String),

    #[error("Invalid hex payload: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// Errors that occur when talking to a Tezos node.
///
/// Returned by every [`TezosNode`](crate::TezosNode) operation.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// Returned when the provider URI cannot be used as a node endpoint.
    #[error("Invalid node URI '{uri}': {reason}")]
    InvalidNodeUri { uri: String, reason: String },

    /// Returned when minreq encounters an error, including socket timeouts.
    #[error("HTTP error: {0}")]
    Minreq(#[from] minreq::Error),

    /// Returned when a blocking request task fails to join.
    #[error("Task join error: {0}")]
    TaskJoin(String),

    /// Returned when the node answers with a non-success status.
    #[error("Node rejected request with HTTP {status} for {url}: {message}")]
    Rejected {
        status: u16,
        url: String,
        message: String,
    },

    /// Returned when the node response is not the expected JSON.
    #[error("Failed to decode node response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Returned when the node answers with a well-formed but unusable value.
    #[error("Unexpected node response: {0}")]
    UnexpectedResponse(String),

    /// Returned when pre-application reports a failed operation result.
    #[error("Operation failed during pre-application: {0}")]
    Preapply(String),

    /// Returned when forging or signing needs key material that fails to decode.
    #[error(transparent)]
    Key(#[from] KeyError),
}
