#![warn(clippy::all, clippy::pedantic)]

pub mod cli;
pub mod commands;
pub mod console;
pub mod exit_codes;
pub mod failure;
pub mod modules;
pub mod recipient;

use std::ffi::OsString;
use std::io::Write;

use clap::Parser;
use clap::error::{ContextKind, ErrorKind};
use tezos_rpc::{KeyService, NodeProvider};

use crate::cli::Cli;
use crate::commands::dispatch;
use crate::console::{Console, SEE_HELP};
use crate::exit_codes::{EXIT_FAILURE, EXIT_SUCCESS};
use crate::failure::CommandError;

pub use crate::commands::Services;

/// Parses `args`, runs the selected command and returns the process exit code.
///
/// Every failure is reported on `console` here; nothing propagates further.
pub async fn run<I, T, P, K, O, E>(
    args: I,
    services: &Services<P, K>,
    console: &mut Console<O, E>,
) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    P: NodeProvider,
    K: KeyService,
    O: Write,
    E: Write,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => return report_usage_error(&error, console),
    };

    let Some(command) = cli.command else {
        console.die("No action provided.");
        console.hint(SEE_HELP);
        return EXIT_FAILURE;
    };

    match dispatch(command, services, console).await {
        Ok(()) => EXIT_SUCCESS,
        Err(error) => {
            report(&error, console);
            EXIT_FAILURE
        }
    }
}

fn report<O: Write, E: Write>(error: &CommandError, console: &mut Console<O, E>) {
    match error {
        CommandError::Validation(validation) => console.die(&validation.to_string()),
        CommandError::Failed { kind, message } => console.failure(*kind, message),
    }
}

fn report_usage_error<O: Write, E: Write>(
    error: &clap::Error,
    console: &mut Console<O, E>,
) -> u8 {
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = write!(console.out, "{}", error.render());
            EXIT_SUCCESS
        }
        ErrorKind::InvalidSubcommand => {
            let action = error
                .get(ContextKind::InvalidSubcommand)
                .map(ToString::to_string)
                .unwrap_or_default();
            console.die(&format!("Invalid action provided: {action}."));
            console.hint(SEE_HELP);
            EXIT_FAILURE
        }
        _ => {
            let _ = write!(console.err, "{}", error.render());
            EXIT_FAILURE
        }
    }
}
