use std::convert::Infallible;
use std::str::FromStr;

use tezos_rpc::Mutez;

/// One `<hash>@<mutez>` token of a batch transfer.
///
/// Parsing never fails: a bad token is kept as [`Recipient::Malformed`] so the
/// whole list is parsed before the batch is judged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    Valid { pkh: String, amount: Mutez },
    Malformed(String),
}

impl FromStr for Recipient {
    type Err = Infallible;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = token.split('@').collect();

        let recipient = match parts.as_slice() {
            [pkh, amount] => match amount.parse::<Mutez>() {
                Ok(amount) => Self::Valid {
                    pkh: (*pkh).to_string(),
                    amount,
                },
                Err(_) => Self::Malformed(token.to_owned()),
            },
            _ => Self::Malformed(token.to_owned()),
        };

        Ok(recipient)
    }
}
