use std::io::Write;

use tezos_rpc::KeyService;
use tracing::{debug, warn};

use crate::cli::ExtractArgs;
use crate::console::Console;
use crate::failure::{CommandError, MissingOption, ValidationError};

use super::{Services, required};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extract {
    pub secret: String,
}

/// # Errors
/// Returns an error when no secret key is given.
pub fn validate(args: &ExtractArgs) -> Result<Extract, ValidationError> {
    let secret = required(args.secret.as_deref(), MissingOption::Secret)?;

    if args.node.is_some() {
        warn!("--node is ignored by extract, no node is contacted");
    }

    Ok(Extract { secret })
}

/// Prints the public key hash derived from the secret key.
///
/// # Errors
/// Returns a bad secret key failure when no public key hash can be derived.
pub fn execute<P, K, O, E>(
    extract: &Extract,
    services: &Services<P, K>,
    console: &mut Console<O, E>,
) -> Result<(), CommandError>
where
    K: KeyService,
    O: Write,
    E: Write,
{
    let pkh = match services.keys.extract_keys(&extract.secret) {
        Ok(keys) if !keys.pkh.is_empty() => keys.pkh,
        Ok(_) => return Err(CommandError::bad_secret_key()),
        Err(error) => {
            debug!(%error, "key extraction failed");
            return Err(CommandError::bad_secret_key());
        }
    };

    console.line(&pkh);

    Ok(())
}
