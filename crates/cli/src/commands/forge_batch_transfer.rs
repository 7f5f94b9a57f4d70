use std::io::Write;

use tezos_rpc::{KeyService, Mutez, NodeProvider, TezosNode, TransactionDescriptor, Watermark};
use tracing::{debug, info};

use crate::cli::ForgeBatchTransferArgs;
use crate::console::Console;
use crate::failure::{CommandError, MissingOption, ValidationError, with_timeout};
use crate::recipient::Recipient;

use super::{Services, provided_timeout, required, required_mutez};

/// A batch transfer whose options passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchTransfer {
    pub node: String,
    pub from_sk: String,
    pub recipients: Vec<(String, Mutez)>,
    pub fee: Mutez,
    pub timeout: u64,
}

/// Checks node, sender key, fee and timeout, then the recipient list.
///
/// The list has already been fully parsed; any malformed token rejects the batch.
///
/// # Errors
/// Returns the first missing option, an empty list, or the first malformed recipient.
pub fn validate(args: &ForgeBatchTransferArgs) -> Result<BatchTransfer, ValidationError> {
    let node = required(args.node.as_deref(), MissingOption::Node)?;
    let from_sk = required(args.from_sk.as_deref(), MissingOption::SenderSecretKey)?;
    let fee = required_mutez(args.fee.as_deref(), MissingOption::Fee, "fee")?;
    let timeout = provided_timeout(args.timeout).ok_or(MissingOption::Timeout)?;

    if args.recipients.is_empty() {
        return Err(MissingOption::Recipients.into());
    }

    let recipients = args
        .recipients
        .iter()
        .map(|recipient| match recipient {
            Recipient::Valid { pkh, amount } => Ok((pkh.clone(), *amount)),
            Recipient::Malformed(token) => Err(ValidationError::MalformedRecipient(token.clone())),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(BatchTransfer {
        node,
        from_sk,
        recipients,
        fee,
        timeout,
    })
}

/// One transaction per recipient, all sharing `fee` and the fixed limits.
#[must_use]
pub fn build_operations(recipients: &[(String, Mutez)], fee: Mutez) -> Vec<TransactionDescriptor> {
    recipients
        .iter()
        .map(|(pkh, amount)| TransactionDescriptor::new(pkh, *amount, fee))
        .collect()
}

/// Forges the batch on the node and signs it locally. Nothing is injected.
///
/// # Errors
/// Returns the classified failure of key extraction, forging or signing.
pub async fn execute<P, K, O, E>(
    batch: BatchTransfer,
    services: &Services<P, K>,
    console: &mut Console<O, E>,
) -> Result<(), CommandError>
where
    P: NodeProvider,
    K: KeyService,
    O: Write,
    E: Write,
{
    let node = services.provider.provide(&batch.node)?;
    let keys = services.keys.extract_keys(&batch.from_sk)?;
    let operations = build_operations(&batch.recipients, batch.fee);

    info!(
        from = %keys.pkh,
        recipients = operations.len(),
        fee_tez = %batch.fee.totez(),
        timeout = batch.timeout,
        "forging batch transfer"
    );

    let forged = with_timeout(
        batch.timeout,
        node.send_operation(&keys.pkh, &operations, &keys),
    )
    .await?;

    let signed = services
        .keys
        .sign(&forged.opbytes, &keys.sk, Watermark::Generic)?;
    debug!(bytes = %signed.bytes, sig = %signed.sig, "signed forged operation group");

    let mut op_ob = forged.op_ob;
    op_ob.signature = Some(signed.edsig);
    let object = serde_json::to_string(&op_ob)
        .map_err(|e| CommandError::fatal(format!("Failed to encode operation object: {e}")))?;

    console.success("Batch transfer forged and signed (not injected).");
    console.line(&format!("Signed bytes: {}", signed.sbytes));
    console.line(&format!("Operation object: {object}"));

    Ok(())
}
