use std::fmt;
use std::str::FromStr;

/// Number of mutez in one tez.
pub const MUTEZ_PER_TEZ: u64 = 1_000_000;

/// An amount in mutez, the smallest Tezos unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Mutez(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a whole number of mutez")]
pub struct ParseMutezError(pub String);

impl FromStr for Mutez {
    type Err = ParseMutezError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseMutezError(s.to_owned()));
        }

        trimmed
            .parse::<u64>()
            .map(Self)
            .map_err(|_| ParseMutezError(s.to_owned()))
    }
}

/// Displays the raw mutez value, which is what the node RPC expects.
impl fmt::Display for Mutez {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Mutez {
    /// Formats the amount as tez with six decimals.
    #[must_use]
    pub fn totez(self) -> String {
        format!(
            "{}.{:06}",
            self.0 / MUTEZ_PER_TEZ,
            self.0 % MUTEZ_PER_TEZ
        )
    }
}
