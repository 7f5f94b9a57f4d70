use anyhow::{Result, bail};
use config::{Config, Environment, Source};
use serde::Deserialize;
use tezos_rpc::DEFAULT_REQUEST_TIMEOUT_SECS;

const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Process-wide defaults, read from `EZTZ_`-prefixed environment variables.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// Applied when a command's `--timeout` is omitted.
    pub default_timeout_secs: u64,
    /// Socket-level timeout of every single node request.
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_timeout_secs: DEFAULT_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// Loads settings from the environment.
    ///
    /// # Errors
    /// Returns error if a variable is set to something other than a positive integer.
    pub fn load() -> Result<Self> {
        Self::from_source(Environment::with_prefix("EZTZ").try_parsing(true))
    }

    fn from_source<S>(source: S) -> Result<Self>
    where
        S: Source + Send + Sync + 'static,
    {
        let cfg = Config::builder()
            .set_default("default_timeout_secs", i64::try_from(DEFAULT_TIMEOUT_SECS)?)?
            .set_default(
                "request_timeout_secs",
                i64::try_from(DEFAULT_REQUEST_TIMEOUT_SECS)?,
            )?
            .add_source(source)
            .build()?;

        let settings: Self = cfg.try_deserialize()?;

        if settings.default_timeout_secs == 0 {
            bail!("EZTZ_DEFAULT_TIMEOUT_SECS must be > 0");
        }
        if settings.request_timeout_secs == 0 {
            bail!("EZTZ_REQUEST_TIMEOUT_SECS must be > 0");
        }

        Ok(settings)
    }
}
