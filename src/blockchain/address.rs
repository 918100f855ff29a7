//! Account address encoding.
//!
//! `nano_` + base32(4 zero bits ‖ public key) + base32(reversed Blake2b-40 checksum),
//! using the ledger's own 32-symbol alphabet.

use blake2::digest::consts::U5;
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::blockchain::types::{LedgerError, LedgerResult};

const ALPHABET: &[u8; 32] = b"13456789abcdefghijkmnopqrstuwxyz";

pub const ADDRESS_PREFIX: &str = "nano_";
const LEGACY_PREFIX: &str = "xrb_";

const KEY_CHARS: usize = 52;
const CHECKSUM_CHARS: usize = 8;

/// A 32-byte Ed25519 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(pub [u8; 32]);

impl PublicKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode_upper(self.0))
    }
}

/// A checksummed account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NanoAddress(PublicKey);

impl NanoAddress {
    pub fn from_public_key(key: PublicKey) -> Self {
        Self(key)
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.0
    }

    /// True when `s` is a well-formed address with a matching checksum.
    pub fn is_valid(s: &str) -> bool {
        s.parse::<NanoAddress>().is_ok()
    }
}

fn checksum(key: &PublicKey) -> [u8; 5] {
    let digest = Blake2b::<U5>::digest(key.as_bytes());
    let mut out = [0u8; 5];
    out.copy_from_slice(&digest);
    out.reverse();
    out
}

/// Encode `bytes` preceded by `pad_bits` zero bits, five bits per symbol.
fn encode_base32(bytes: &[u8], pad_bits: usize) -> String {
    let total_bits = bytes.len() * 8 + pad_bits;
    let bit = |i: usize| -> usize {
        if i < pad_bits {
            0
        } else {
            let j = i - pad_bits;
            ((bytes[j / 8] >> (7 - j % 8)) & 1) as usize
        }
    };

    (0..total_bits / 5)
        .map(|symbol| {
            let value = (0..5).fold(0usize, |acc, k| (acc << 1) | bit(symbol * 5 + k));
            ALPHABET[value] as char
        })
        .collect()
}

/// Inverse of [`encode_base32`]; the leading `pad_bits` must be zero.
fn decode_base32<const N: usize>(s: &str, pad_bits: usize) -> Option<[u8; N]> {
    let mut out = [0u8; N];
    let mut bit_index = 0usize;
    for c in s.bytes() {
        let value = ALPHABET.iter().position(|a| *a == c)?;
        for k in (0..5).rev() {
            let bit = ((value >> k) & 1) as u8;
            if bit_index < pad_bits {
                if bit != 0 {
                    return None;
                }
            } else {
                let j = bit_index - pad_bits;
                if j >= N * 8 {
                    return None;
                }
                out[j / 8] |= bit << (7 - j % 8);
            }
            bit_index += 1;
        }
    }
    if bit_index != N * 8 + pad_bits {
        return None;
    }
    Some(out)
}

impl FromStr for NanoAddress {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LedgerError::InvalidInput(format!("'{}' is not a valid Nano address", s));

        let body = s
            .strip_prefix(ADDRESS_PREFIX)
            .or_else(|| s.strip_prefix(LEGACY_PREFIX))
            .ok_or_else(invalid)?;
        if body.len() != KEY_CHARS + CHECKSUM_CHARS {
            return Err(invalid());
        }

        let (key_part, checksum_part) = body.split_at(KEY_CHARS);
        let key = decode_base32::<32>(key_part, 4).map(PublicKey).ok_or_else(invalid)?;
        let given = decode_base32::<5>(checksum_part, 0).ok_or_else(invalid)?;
        if given != checksum(&key) {
            return Err(invalid());
        }
        Ok(Self(key))
    }
}

impl fmt::Display for NanoAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            ADDRESS_PREFIX,
            encode_base32(self.0.as_bytes(), 4),
            encode_base32(&checksum(&self.0), 0)
        )
    }
}

impl fmt::Debug for NanoAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NanoAddress({})", self)
    }
}

impl Serialize for NanoAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NanoAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse an address, reporting failures with the caller-facing `message`.
pub fn parse_address(s: &str, message: &str) -> LedgerResult<NanoAddress> {
    s.parse()
        .map_err(|_| LedgerError::Validation(message.to_string()))
}
