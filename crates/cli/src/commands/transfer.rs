use std::io::Write;

use tezos_rpc::{KeyService, Mutez, NodeProvider, TezosNode};
use tracing::info;

use crate::cli::TransferArgs;
use crate::console::Console;
use crate::failure::{CommandError, MissingOption, ValidationError, with_timeout};

use super::{Services, provided_timeout, required, required_mutez, timeout_or_default};

/// A transfer whose options passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub node: String,
    pub from_sk: String,
    pub to_pkh: String,
    pub amount: Mutez,
    pub fee: Mutez,
    pub timeout: Option<u64>,
}

/// Checks node, sender key, receiver, amount and fee, in that order.
///
/// # Errors
/// Returns the first missing option, or an amount that is not whole mutez.
pub fn validate(args: &TransferArgs) -> Result<Transfer, ValidationError> {
    let node = required(args.node.as_deref(), MissingOption::Node)?;
    let from_sk = required(args.from_sk.as_deref(), MissingOption::SenderSecretKey)?;
    let to_pkh = required(args.to_pkh.as_deref(), MissingOption::ReceiverPkh)?;
    let amount = required_mutez(args.amount.as_deref(), MissingOption::Amount, "amount")?;
    let fee = required_mutez(args.fee.as_deref(), MissingOption::Fee, "fee")?;

    Ok(Transfer {
        node,
        from_sk,
        to_pkh,
        amount,
        fee,
        timeout: provided_timeout(args.timeout),
    })
}

/// Injects the transfer and prints its operation hash.
///
/// # Errors
/// Returns the classified failure of key extraction or the node call.
pub async fn execute<P, K, O, E>(
    transfer: Transfer,
    services: &Services<P, K>,
    console: &mut Console<O, E>,
) -> Result<(), CommandError>
where
    P: NodeProvider,
    K: KeyService,
    O: Write,
    E: Write,
{
    let timeout = timeout_or_default(transfer.timeout, &services.settings, console);

    let node = services.provider.provide(&transfer.node)?;
    let keys = services.keys.extract_keys(&transfer.from_sk)?;

    info!(
        from = %keys.pkh,
        to = %transfer.to_pkh,
        amount_tez = %transfer.amount.totez(),
        fee_tez = %transfer.fee.totez(),
        timeout,
        "submitting transfer"
    );

    // Single attempt; the timer also bounds retries inside the node call.
    let hash = with_timeout(
        timeout,
        node.transfer(
            &keys.pkh,
            &keys,
            &transfer.to_pkh,
            transfer.amount,
            transfer.fee,
        ),
    )
    .await?;

    console.success(&format!("Transfer successfully injected: {hash}"));

    Ok(())
}
