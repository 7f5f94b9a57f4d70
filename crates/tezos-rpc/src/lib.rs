#![warn(clippy::all, clippy::pedantic)]

//! Tezos key handling, operation model and node RPC client.

pub mod client;
pub mod crypto;
pub mod error;
pub mod node;
pub mod operation;
pub mod units;

pub use client::{DEFAULT_REQUEST_TIMEOUT_SECS, RpcProvider, TezosRpcClient};
pub use crypto::{Ed25519Keys, KeyService, Keys, Signed, Watermark};
pub use error::{KeyError, RpcError};
pub use node::{NodeProvider, TezosNode};
pub use operation::{ForgedOperation, OperationContent, OperationObject, TransactionDescriptor};
pub use units::Mutez;
