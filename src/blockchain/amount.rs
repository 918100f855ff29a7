//! Exact conversion between raw units and Nano.
//!
//! One Nano is 10^30 raw. Raw amounts are held in a 256-bit unsigned integer
//! and the display form is produced by decimal string manipulation, so no
//! value ever passes through binary floating point.

use alloy::primitives::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::blockchain::types::{LedgerError, LedgerResult};

/// Decimal exponent between raw and Nano.
pub const NANO_DECIMALS: usize = 30;

/// An amount in raw units.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RawAmount(U256);

impl RawAmount {
    pub const ZERO: Self = Self(U256::ZERO);

    pub fn from_u128(raw: u128) -> Self {
        Self(U256::from(raw))
    }

    /// Parse a decimal raw amount such as the `balance` field of `account_info`.
    pub fn from_raw_str(raw: &str) -> LedgerResult<Self> {
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LedgerError::Conversion(format!(
                "'{}' is not a raw amount",
                raw
            )));
        }
        U256::from_str_radix(raw, 10)
            .map(Self)
            .map_err(|e| LedgerError::Conversion(format!("'{}': {}", raw, e)))
    }

    /// Convert a Nano amount (e.g. `"0.001"`) to raw.
    pub fn from_nano(display: &str) -> LedgerResult<Self> {
        let malformed = || LedgerError::Conversion(format!("'{}' is not a decimal amount", display));

        let (int_part, frac_part) = match display.split_once('.') {
            Some((i, f)) => (i, f),
            None => (display, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(malformed());
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(malformed());
        }

        let frac_trimmed = frac_part.trim_end_matches('0');
        if frac_trimmed.len() > NANO_DECIMALS {
            return Err(LedgerError::Conversion(format!(
                "'{}' has more than {} decimal places",
                display, NANO_DECIMALS
            )));
        }

        let mut digits = String::with_capacity(int_part.len() + NANO_DECIMALS);
        digits.push_str(int_part);
        digits.push_str(frac_trimmed);
        digits.extend(std::iter::repeat('0').take(NANO_DECIMALS - frac_trimmed.len()));

        let trimmed = digits.trim_start_matches('0');
        if trimmed.is_empty() {
            return Ok(Self::ZERO);
        }
        U256::from_str_radix(trimmed, 10)
            .map(Self)
            .map_err(|e| LedgerError::Conversion(format!("'{}': {}", display, e)))
    }

    /// Canonical Nano rendering: no trailing fractional zeros, `0` for zero.
    pub fn to_nano(&self) -> String {
        let digits = self.0.to_string();
        let (int_part, frac_part) = if digits.len() > NANO_DECIMALS {
            let split = digits.len() - NANO_DECIMALS;
            (digits[..split].to_string(), digits[split..].to_string())
        } else {
            ("0".to_string(), format!("{:0>width$}", digits, width = NANO_DECIMALS))
        };

        let frac = frac_part.trim_end_matches('0');
        if frac.is_empty() {
            int_part
        } else {
            format!("{}.{}", int_part, frac)
        }
    }

    /// Human rendering used in tool output.
    pub fn friendly(&self) -> String {
        format!("{} in nano units or {} in raw units", self.to_nano(), self)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Big-endian 16-byte encoding used in the state block hash.
    pub fn to_be_bytes_128(&self) -> LedgerResult<[u8; 16]> {
        let wide = self.0.to_be_bytes::<32>();
        if wide[..16].iter().any(|b| *b != 0) {
            return Err(LedgerError::InvalidInput(format!(
                "balance {} does not fit in 128 bits",
                self
            )));
        }
        let mut out = [0u8; 16];
        out.copy_from_slice(&wide[16..]);
        Ok(out)
    }
}

/// Nano → raw.
pub fn nano_to_raw(display: &str) -> LedgerResult<RawAmount> {
    RawAmount::from_nano(display)
}

/// Raw → Nano.
pub fn raw_to_nano(raw: &RawAmount) -> String {
    raw.to_nano()
}

impl FromStr for RawAmount {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_raw_str(s)
    }
}

impl fmt::Display for RawAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for RawAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawAmount({})", self.0)
    }
}

impl Serialize for RawAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RawAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_raw_str(&s).map_err(serde::de::Error::custom)
    }
}
