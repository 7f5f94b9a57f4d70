//! Ed25519 key extraction and operation signing with Tezos base58check encodings.

use blake2::Blake2b;
use blake2::Digest;
use blake2::digest::consts::{U20, U32};
use ring::signature::{Ed25519KeyPair, KeyPair};

use crate::error::KeyError;

type Blake2b160 = Blake2b<U20>;
type Blake2b256 = Blake2b<U32>;

/// `tz1` public key hash prefix.
pub const TZ1_PREFIX: [u8; 3] = [6, 161, 159];
/// `edpk` public key prefix.
pub const EDPK_PREFIX: [u8; 4] = [13, 15, 37, 217];
/// `edsk` prefix for the 64-byte secret key (seed followed by public key).
pub const EDSK_PREFIX: [u8; 4] = [43, 246, 78, 7];
/// `edsk` prefix for the 32-byte seed.
pub const EDSK_SEED_PREFIX: [u8; 4] = [13, 15, 58, 7];
/// `edsig` signature prefix.
pub const EDSIG_PREFIX: [u8; 5] = [9, 245, 205, 134, 18];

const SEED_BYTES: usize = 32;
const PUBLIC_KEY_BYTES: usize = 32;

/// Prefix byte mixed into the signed digest to separate operation families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Watermark {
    Block,
    Endorsement,
    Generic,
}

impl Watermark {
    #[must_use]
    pub const fn byte(self) -> u8 {
        match self {
            Self::Block => 0x01,
            Self::Endorsement => 0x02,
            Self::Generic => 0x03,
        }
    }
}

/// Key material derived from a secret key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keys {
    /// 64-byte `edsk` form.
    pub sk: String,
    pub pk: String,
    pub pkh: String,
}

/// Result of signing a forged operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signed {
    pub bytes: String,
    pub sig: String,
    pub edsig: String,
    pub sbytes: String,
}

/// Key and signature capability consumed by the dispatcher.
pub trait KeyService {
    /// Derives the key set for `secret`.
    ///
    /// # Errors
    /// Returns error if `secret` is not a valid Ed25519 `edsk` key.
    fn extract_keys(&self, secret: &str) -> Result<Keys, KeyError>;

    /// Signs hex-encoded `bytes` with `secret` under `watermark`.
    ///
    /// # Errors
    /// Returns error if the key or the payload cannot be decoded.
    fn sign(&self, bytes: &str, secret: &str, watermark: Watermark) -> Result<Signed, KeyError>;
}

/// Local Ed25519 implementation of [`KeyService`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Keys;

impl KeyService for Ed25519Keys {
    fn extract_keys(&self, secret: &str) -> Result<Keys, KeyError> {
        extract_keys(secret)
    }

    fn sign(&self, bytes: &str, secret: &str, watermark: Watermark) -> Result<Signed, KeyError> {
        sign(bytes, secret, watermark)
    }
}

/// Derives `edpk` and `tz1` values from an `edsk` secret key.
///
/// # Errors
/// Returns error if the key is not valid base58check, carries an unknown
/// prefix, or its embedded public key does not match the seed.
pub fn extract_keys(secret: &str) -> Result<Keys, KeyError> {
    let keypair = decode_keypair(secret)?;
    let public_key = keypair.public_key().as_ref();

    let pkh = Blake2b160::digest(public_key);

    let mut sk_bytes = Vec::with_capacity(SEED_BYTES + PUBLIC_KEY_BYTES);
    sk_bytes.extend_from_slice(&decode_seed(secret)?);
    sk_bytes.extend_from_slice(public_key);

    Ok(Keys {
        sk: b58check_encode(&EDSK_PREFIX, &sk_bytes),
        pk: b58check_encode(&EDPK_PREFIX, public_key),
        pkh: b58check_encode(&TZ1_PREFIX, &pkh),
    })
}

/// Signs a hex payload the way a node expects for injection.
///
/// # Errors
/// Returns error if `bytes` is not hex or the secret key is invalid.
pub fn sign(bytes: &str, secret: &str, watermark: Watermark) -> Result<Signed, KeyError> {
    let payload = hex::decode(bytes)?;
    let keypair = decode_keypair(secret)?;

    let mut message = Vec::with_capacity(payload.len() + 1);
    message.push(watermark.byte());
    message.extend_from_slice(&payload);

    let digest = Blake2b256::digest(&message);
    let signature = keypair.sign(&digest);
    let sig = hex::encode(signature.as_ref());

    Ok(Signed {
        bytes: bytes.to_owned(),
        edsig: b58check_encode(&EDSIG_PREFIX, signature.as_ref()),
        sbytes: format!("{bytes}{sig}"),
        sig,
    })
}

#[must_use]
pub fn b58check_encode(prefix: &[u8], payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(prefix.len() + payload.len());
    data.extend_from_slice(prefix);
    data.extend_from_slice(payload);
    bs58::encode(data).with_check().into_string()
}

/// Decodes a base58check string and strips `prefix`.
///
/// # Errors
/// Returns error on a bad checksum or a prefix mismatch.
pub fn b58check_decode(encoded: &str, prefix: &[u8]) -> Result<Vec<u8>, KeyError> {
    let data = bs58::decode(encoded).with_check(None).into_vec()?;

    data.strip_prefix(prefix)
        .map(<[u8]>::to_vec)
        .ok_or(KeyError::UnknownPrefix)
}

fn decode_seed(secret: &str) -> Result<[u8; SEED_BYTES], KeyError> {
    let secret = secret.trim();
    if !secret.starts_with("edsk") {
        return Err(KeyError::UnknownPrefix);
    }

    let data = bs58::decode(secret).with_check(None).into_vec()?;

    let seed = if let Some(full) = data.strip_prefix(&EDSK_PREFIX[..]) {
        if full.len() != SEED_BYTES + PUBLIC_KEY_BYTES {
            return Err(KeyError::InvalidLength {
                expected: SEED_BYTES + PUBLIC_KEY_BYTES,
                actual: full.len(),
            });
        }
        &full[..SEED_BYTES]
    } else if let Some(seed) = data.strip_prefix(&EDSK_SEED_PREFIX[..]) {
        if seed.len() != SEED_BYTES {
            return Err(KeyError::InvalidLength {
                expected: SEED_BYTES,
                actual: seed.len(),
            });
        }
        seed
    } else {
        return Err(KeyError::UnknownPrefix);
    };

    let mut out = [0u8; SEED_BYTES];
    out.copy_from_slice(seed);
    Ok(out)
}

fn decode_keypair(secret: &str) -> Result<Ed25519KeyPair, KeyError> {
    let seed = decode_seed(secret)?;
    let keypair = Ed25519KeyPair::from_seed_unchecked(&seed)
        .map_err(|e| KeyError::Rejected(e.to_string()))?;

    // The 64-byte form carries its own public key, which must agree with the seed.
    if let Ok(full) = b58check_decode(secret.trim(), &EDSK_PREFIX)
        && full[SEED_BYTES..] != *keypair.public_key().as_ref()
    {
        return Err(KeyError::PublicKeyMismatch);
    }

    Ok(keypair)
}
