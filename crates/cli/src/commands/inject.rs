use std::io::Write;

use tezos_rpc::{NodeProvider, OperationObject, TezosNode};
use tracing::info;

use crate::cli::InjectArgs;
use crate::console::Console;
use crate::failure::{CommandError, MissingOption, ValidationError, with_timeout};

use super::{Services, provided_timeout, required, timeout_or_default};

/// An injection whose options passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Injection {
    pub node: String,
    pub signed: String,
    pub object: OperationObject,
    pub timeout: Option<u64>,
}

/// Checks node, signed bytes and the operation object, in that order.
///
/// # Errors
/// Returns the first missing option, or an object that is not an operation JSON.
pub fn validate(args: &InjectArgs) -> Result<Injection, ValidationError> {
    let node = required(args.node.as_deref(), MissingOption::Node)?;
    let signed = required(args.signed.as_deref(), MissingOption::SignedBytes)?;
    let raw_object = required(args.object.as_deref(), MissingOption::OperationObject)?;

    let object = serde_json::from_str::<OperationObject>(&raw_object)
        .map_err(ValidationError::InvalidOperationObject)?;

    Ok(Injection {
        node,
        signed,
        object,
        timeout: provided_timeout(args.timeout),
    })
}

/// Pre-validates and injects the operation, then prints its hash.
///
/// # Errors
/// Returns the classified failure of the node call.
pub async fn execute<P, K, O, E>(
    injection: Injection,
    services: &Services<P, K>,
    console: &mut Console<O, E>,
) -> Result<(), CommandError>
where
    P: NodeProvider,
    O: Write,
    E: Write,
{
    let timeout = timeout_or_default(injection.timeout, &services.settings, console);
    let node = services.provider.provide(&injection.node)?;

    info!(
        branch = %injection.object.branch,
        operations = injection.object.contents.len(),
        timeout,
        "injecting operation"
    );

    let hash = with_timeout(timeout, node.inject(&injection.object, &injection.signed)).await?;

    console.success(&format!("Operation successfully injected: {hash}"));

    Ok(())
}
