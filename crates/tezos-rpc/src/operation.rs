//! Operation descriptors and the JSON objects exchanged with the node.

use serde::{Deserialize, Serialize};

use crate::units::Mutez;

pub const DEFAULT_GAS_LIMIT: &str = "200";
pub const DEFAULT_STORAGE_LIMIT: &str = "0";

pub const REVEAL_FEE: &str = "1269";
pub const REVEAL_GAS_LIMIT: &str = "10000";
pub const REVEAL_STORAGE_LIMIT: &str = "0";

/// A transaction requested by the caller, before source and counter are known.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionDescriptor {
    pub kind: String,
    pub fee: String,
    pub gas_limit: String,
    pub storage_limit: String,
    pub amount: String,
    pub destination: String,
}

impl TransactionDescriptor {
    #[must_use]
    pub fn new(destination: &str, amount: Mutez, fee: Mutez) -> Self {
        Self {
            kind: "transaction".to_string(),
            fee: fee.to_string(),
            gas_limit: DEFAULT_GAS_LIMIT.to_string(),
            storage_limit: DEFAULT_STORAGE_LIMIT.to_string(),
            amount: amount.to_string(),
            destination: destination.to_owned(),
        }
    }
}

/// Manager operation contents as the forge and preapply RPCs expect them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationContent {
    Reveal {
        source: String,
        fee: String,
        counter: String,
        gas_limit: String,
        storage_limit: String,
        public_key: String,
    },
    Transaction {
        source: String,
        fee: String,
        counter: String,
        gas_limit: String,
        storage_limit: String,
        amount: String,
        destination: String,
    },
}

impl OperationContent {
    #[must_use]
    pub fn reveal(source: &str, public_key: &str, counter: u64) -> Self {
        Self::Reveal {
            source: source.to_owned(),
            fee: REVEAL_FEE.to_string(),
            counter: counter.to_string(),
            gas_limit: REVEAL_GAS_LIMIT.to_string(),
            storage_limit: REVEAL_STORAGE_LIMIT.to_string(),
            public_key: public_key.to_owned(),
        }
    }

    #[must_use]
    pub fn transaction(source: &str, descriptor: &TransactionDescriptor, counter: u64) -> Self {
        Self::Transaction {
            source: source.to_owned(),
            fee: descriptor.fee.clone(),
            counter: counter.to_string(),
            gas_limit: descriptor.gas_limit.clone(),
            storage_limit: descriptor.storage_limit.clone(),
            amount: descriptor.amount.clone(),
            destination: descriptor.destination.clone(),
        }
    }
}

/// An operation group: what gets forged, signed, pre-applied and injected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OperationObject {
    pub branch: String,
    pub contents: Vec<OperationContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// Forged but not yet signed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForgedOperation {
    pub opbytes: String,
    pub op_ob: OperationObject,
}
