//! Command dispatch: validate, execute once under a timeout, report.

use std::io::Write;

use tezos_rpc::{KeyService, Mutez, NodeProvider};
use tracing::{debug, info};

use crate::cli::Command;
use crate::console::Console;
use crate::failure::{CommandError, MissingOption, ValidationError};
use crate::modules::settings::Settings;

pub mod extract;
pub mod forge_batch_transfer;
pub mod inject;
pub mod transfer;

/// Collaborators a command runs against, built once per process.
#[derive(Debug, Clone)]
pub struct Services<P, K> {
    pub settings: Settings,
    pub provider: P,
    pub keys: K,
}

/// Runs a single command to completion.
///
/// Validation happens before any node is contacted; the first missing option
/// stops the command. There is exactly one execution attempt.
///
/// # Errors
/// Returns the validation or execution failure of the command.
pub async fn dispatch<P, K, O, E>(
    command: Command,
    services: &Services<P, K>,
    console: &mut Console<O, E>,
) -> Result<(), CommandError>
where
    P: NodeProvider,
    K: KeyService,
    O: Write,
    E: Write,
{
    let name = command.name();
    debug!(command = name, "validating");

    let result = match command {
        Command::Transfer(args) => {
            let transfer = transfer::validate(&args)?;
            debug!(command = name, "executing");
            transfer::execute(transfer, services, console).await
        }
        Command::ForgeBatchTransfer(args) => {
            let batch = forge_batch_transfer::validate(&args)?;
            debug!(command = name, "executing");
            forge_batch_transfer::execute(batch, services, console).await
        }
        Command::Extract(args) => {
            let extract = extract::validate(&args)?;
            debug!(command = name, "executing");
            extract::execute(&extract, services, console)
        }
        Command::Inject(args) => {
            let inject = inject::validate(&args)?;
            debug!(command = name, "executing");
            inject::execute(inject, services, console).await
        }
    };

    match &result {
        Ok(()) => info!(command = name, "command succeeded"),
        Err(error) => info!(command = name, kind = ?error.kind(), "command failed"),
    }

    result
}

/// Returns the value of a required option, treating blank values as absent.
pub(crate) fn required(value: Option<&str>, missing: MissingOption) -> Result<String, MissingOption> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .ok_or(missing)
}

pub(crate) fn required_mutez(
    value: Option<&str>,
    missing: MissingOption,
    field: &'static str,
) -> Result<Mutez, ValidationError> {
    let raw = required(value, missing)?;

    raw.parse::<Mutez>()
        .map_err(|source| ValidationError::InvalidAmount { field, source })
}

/// A timeout of zero counts as not provided.
pub(crate) fn provided_timeout(timeout: Option<u64>) -> Option<u64> {
    timeout.filter(|&seconds| seconds > 0)
}

/// Falls back to the configured default and tells the user about it.
pub(crate) fn timeout_or_default<O: Write, E: Write>(
    timeout: Option<u64>,
    settings: &Settings,
    console: &mut Console<O, E>,
) -> u64 {
    provided_timeout(timeout).unwrap_or_else(|| {
        let seconds = settings.default_timeout_secs;
        console.line(&format!("Using default timeout ({seconds} seconds)."));
        seconds
    })
}
