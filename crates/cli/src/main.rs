#![warn(clippy::all, clippy::pedantic)]

use std::process::ExitCode;
use std::time::Duration;

use eztz_cli::Services;
use eztz_cli::console::Console;
use eztz_cli::exit_codes::EXIT_FAILURE;
use eztz_cli::modules::settings::Settings;

use anyhow::{Context, Result};

use tezos_rpc::{Ed25519Keys, RpcProvider};

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    logging_init();

    match try_main() {
        Ok(code) => ExitCode::from(code),
        Err(error) => {
            eprintln!("{error:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn try_main() -> Result<u8> {
    let settings = Settings::load().context("failed to load settings")?;

    let services = Services {
        provider: RpcProvider::new(Duration::from_secs(settings.request_timeout_secs)),
        keys: Ed25519Keys,
        settings,
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to initialize async runtime")?;

    let mut console = Console::stdio();
    let code = runtime.block_on(eztz_cli::run(std::env::args_os(), &services, &mut console));

    // Requests abandoned by a timeout may still hold blocking threads.
    runtime.shutdown_background();

    Ok(code)
}

fn logging_init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
