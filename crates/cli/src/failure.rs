//! Command errors, the failure taxonomy and the timeout race.

use std::fmt;
use std::future::Future;
use std::io::ErrorKind;
use std::time::Duration;

use tezos_rpc::units::ParseMutezError;
use tezos_rpc::{KeyError, RpcError};
use tracing::debug;

/// Message reported when the race timer fires first.
pub const TIMEOUT_MESSAGE: &str = "Timeout";

/// Message reported when the failure carries nothing but a probable connectivity problem.
pub const CONNECTION_MESSAGE: &str = "Unknown error (check the URI and connection).";

pub const BAD_SECRET_KEY_MESSAGE: &str = "Bad secret key provided.";

/// Classification of an execution failure, printed as the last line of error output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Fatal,
    Timeout,
    Connection,
}

impl FailureKind {
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Fatal => "fatal",
            Self::Timeout => "timeout",
            Self::Connection => "connection",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A required option that was absent or empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MissingOption {
    #[error("No Tezos node provided.")]
    Node,

    #[error("No sender SK provided.")]
    SenderSecretKey,

    #[error("No receiver PKH provided.")]
    ReceiverPkh,

    #[error("No amount provided.")]
    Amount,

    #[error("No fee provided.")]
    Fee,

    #[error("No timeout provided.")]
    Timeout,

    #[error("No recipients provided.")]
    Recipients,

    #[error("No secret key provided.")]
    Secret,

    #[error("No signed operation bytes provided.")]
    SignedBytes,

    #[error("No operation object provided.")]
    OperationObject,
}

/// Input problems detected before any network call.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error(transparent)]
    Missing(#[from] MissingOption),

    #[error("Invalid {field}: {source}")]
    InvalidAmount {
        field: &'static str,
        source: ParseMutezError,
    },

    #[error("Malformed recipient provided: '{0}' (expected <hash>@<mutez>).")]
    MalformedRecipient(String),

    #[error("Invalid operation object: {0}")]
    InvalidOperationObject(#[source] serde_json::Error),
}

/// Outcome of a failed command, caught once at the dispatch boundary.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{message}")]
    Failed { kind: FailureKind, message: String },
}

impl CommandError {
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Failed {
            kind: FailureKind::Fatal,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn timed_out() -> Self {
        Self::Failed {
            kind: FailureKind::Timeout,
            message: TIMEOUT_MESSAGE.to_string(),
        }
    }

    #[must_use]
    pub fn bad_secret_key() -> Self {
        Self::fatal(BAD_SECRET_KEY_MESSAGE)
    }

    /// `None` for validation errors, which never reach the network.
    #[must_use]
    pub const fn kind(&self) -> Option<FailureKind> {
        match self {
            Self::Validation(_) => None,
            Self::Failed { kind, .. } => Some(*kind),
        }
    }
}

impl From<MissingOption> for CommandError {
    fn from(missing: MissingOption) -> Self {
        Self::Validation(missing.into())
    }
}

impl From<RpcError> for CommandError {
    fn from(error: RpcError) -> Self {
        let kind = classify(&error);
        debug!(%kind, %error, "node call failed");

        let message = match kind {
            FailureKind::Fatal => error.to_string(),
            FailureKind::Timeout => TIMEOUT_MESSAGE.to_string(),
            FailureKind::Connection => CONNECTION_MESSAGE.to_string(),
        };

        Self::Failed { kind, message }
    }
}

impl From<KeyError> for CommandError {
    fn from(error: KeyError) -> Self {
        Self::fatal(error.to_string())
    }
}

/// Maps whatever the node layer failed with onto the failure taxonomy.
///
/// A rejection without any body carries no information beyond "the node did
/// not answer properly" and is treated like a transport failure.
#[must_use]
pub fn classify(error: &RpcError) -> FailureKind {
    match error {
        RpcError::Minreq(minreq::Error::IoError(io))
            if matches!(io.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) =>
        {
            FailureKind::Timeout
        }
        RpcError::Minreq(minreq::Error::IoError(_) | minreq::Error::AddressNotFound) => {
            FailureKind::Connection
        }
        RpcError::Rejected { message, .. } if message.trim().is_empty() => {
            FailureKind::Connection
        }
        _ => FailureKind::Fatal,
    }
}

/// Races a node call against a timer of `seconds`.
///
/// Losing the race drops the call's future: the caller stops waiting, but a
/// request already handed to the transport keeps running in the background.
///
/// # Errors
/// Returns the classified node error, or a timeout failure when the timer wins.
pub async fn with_timeout<T, F>(seconds: u64, call: F) -> Result<T, CommandError>
where
    F: Future<Output = Result<T, RpcError>>,
{
    match tokio::time::timeout(Duration::from_secs(seconds), call).await {
        Ok(result) => result.map_err(CommandError::from),
        Err(_) => {
            debug!(seconds, "node call abandoned after timeout");
            Err(CommandError::timed_out())
        }
    }
}
