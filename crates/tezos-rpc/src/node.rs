use crate::crypto::Keys;
use crate::error::RpcError;
use crate::operation::{ForgedOperation, OperationObject, TransactionDescriptor};
use crate::units::Mutez;

/// Operations served by a Tezos node.
///
/// Futures returned here may be dropped before they settle. Implementations
/// must not rely on being polled to completion, and dropping them does not
/// have to stop a request that is already on the wire.
#[allow(async_fn_in_trait)]
pub trait TezosNode {
    /// Forges, signs and injects a single transaction. Returns the operation hash.
    async fn transfer(
        &self,
        from: &str,
        keys: &Keys,
        to: &str,
        amount: Mutez,
        fee: Mutez,
    ) -> Result<String, RpcError>;

    /// Forges a batch of transactions without injecting it.
    async fn send_operation(
        &self,
        from: &str,
        operations: &[TransactionDescriptor],
        keys: &Keys,
    ) -> Result<ForgedOperation, RpcError>;

    /// Pre-applies and injects a signed operation. Returns the operation hash.
    async fn inject(
        &self,
        operation: &OperationObject,
        signed_bytes: &str,
    ) -> Result<String, RpcError>;
}

/// Resolves a node URI into a [`TezosNode`].
pub trait NodeProvider {
    type Node: TezosNode;

    /// # Errors
    /// Returns error if `uri` cannot address a node.
    fn provide(&self, uri: &str) -> Result<Self::Node, RpcError>;
}
