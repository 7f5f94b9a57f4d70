use clap::{ArgAction, Args, Parser, Subcommand};

use crate::recipient::Recipient;

/// Command-line entrypoint for the Tezos CLI.
///
/// Required options are declared optional here so that missing values are
/// reported by the command itself, one at a time, in a fixed order.
#[derive(Debug, Parser)]
#[command(
    name = "eztz-simple",
    version,
    about = "Tezos CLI using eztz",
    disable_version_flag = true
)]
pub struct Cli {
    #[arg(short = 'v', long = "version", action = ArgAction::Version, help = "Print version")]
    #[allow(dead_code)]
    version: Option<bool>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// The command table: one variant per subcommand.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Move funds between accounts
    #[command(name = "transfer")]
    Transfer(TransferArgs),

    /// Forge and sign a batch transfer without injecting it
    #[command(name = "forgeBatchTransfer")]
    ForgeBatchTransfer(ForgeBatchTransferArgs),

    /// Derive the public key hash of a secret key
    #[command(name = "extract")]
    Extract(ExtractArgs),

    /// Pre-validate and inject a signed operation
    #[command(name = "inject")]
    Inject(InjectArgs),
}

impl Command {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Transfer(_) => "transfer",
            Self::ForgeBatchTransfer(_) => "forgeBatchTransfer",
            Self::Extract(_) => "extract",
            Self::Inject(_) => "inject",
        }
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct TransferArgs {
    /// Tezos node URI
    #[arg(short = 'n', long = "node", value_name = "URI", env = "EZTZ_NODE")]
    pub node: Option<String>,

    /// Sender secret key
    #[arg(short = 'f', long = "fromSK", value_name = "KEY")]
    pub from_sk: Option<String>,

    /// Receiver public key hash
    #[arg(short = 't', long = "toPKH", value_name = "HASH")]
    pub to_pkh: Option<String>,

    /// Amount to transfer in mutez
    #[arg(short = 'a', long = "amount", value_name = "MUTEZ")]
    pub amount: Option<String>,

    /// Desired operation fee in mutez
    #[arg(short = 'p', long = "fee", value_name = "MUTEZ")]
    pub fee: Option<String>,

    /// Timeout in seconds for the request
    #[arg(short = 'm', long = "timeout", value_name = "SEC")]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ForgeBatchTransferArgs {
    /// Tezos node URI
    #[arg(short = 'n', long = "node", value_name = "URI", env = "EZTZ_NODE")]
    pub node: Option<String>,

    /// Sender secret key
    #[arg(short = 'f', long = "fromSK", value_name = "KEY")]
    pub from_sk: Option<String>,

    /// Recipient as <hash>@<mutez>, repeatable
    #[arg(short = 'r', long = "recipient", value_name = "HASH@MUTEZ")]
    pub recipients: Vec<Recipient>,

    /// Fee per recipient in mutez
    #[arg(short = 'p', long = "fee", value_name = "MUTEZ")]
    pub fee: Option<String>,

    /// Timeout in seconds for the request
    #[arg(short = 'm', long = "timeout", value_name = "SEC")]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ExtractArgs {
    /// Secret key to derive the public key hash from
    #[arg(short = 's', long = "secret", value_name = "KEY")]
    pub secret: Option<String>,

    /// Accepted for compatibility; extraction never contacts a node
    #[arg(short = 'n', long = "node", value_name = "URI")]
    pub node: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct InjectArgs {
    /// Tezos node URI
    #[arg(short = 'n', long = "node", value_name = "URI", env = "EZTZ_NODE")]
    pub node: Option<String>,

    /// Signed operation bytes (hex)
    #[arg(short = 's', long = "signed", value_name = "HEX")]
    pub signed: Option<String>,

    /// Operation object as a JSON string
    #[arg(short = 'o', long = "object", value_name = "JSON")]
    pub object: Option<String>,

    /// Timeout in seconds for the request
    #[arg(short = 'm', long = "timeout", value_name = "SEC")]
    pub timeout: Option<u64>,
}
