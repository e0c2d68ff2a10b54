//! Lossless decimal numeric type backed by bigdecimal.
//!
//! Provides canonical parsing from strings, scaling of raw on-chain integer
//! quantities, and formatting without exponent notation.

use bigdecimal::{BigDecimal, ParseBigDecimalError, Zero};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Decimals used by shares and by rates when the token does not say otherwise.
pub const DEFAULT_DECIMALS: u32 = 18;

/// Largest raw quantity a contract can emit (2^256 - 1).
const UINT256_MAX: &str =
    "115792089237316195423570985008687907853269984665640564039457584007913129639935";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitsError {
    #[error("not an unsigned integer: {0}")]
    NotAnInteger(String),
    #[error("quantity {0} exceeds uint256 (decimals {1})")]
    OutOfRange(String, u32),
}

/// Lossless decimal numeric type for share and token quantities.
///
/// Arbitrary precision, so any uint256 quantity scales without loss.
/// Serialized as its canonical string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Decimal(BigDecimal);

impl Decimal {
    /// Parse a Decimal from a string losslessly.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number.
    pub fn from_str_canonical(s: &str) -> Result<Self, ParseBigDecimalError> {
        BigDecimal::from_str(s.trim()).map(|d| Decimal(d.normalized()))
    }

    /// Scale a raw unsigned integer quantity (as emitted on chain) by `decimals`.
    ///
    /// `from_units("1500000000000000000", 18)` is `1.5`.
    pub fn from_units(raw: &str, decimals: u32) -> Result<Self, UnitsError> {
        let raw = raw.trim();
        if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
            return Err(UnitsError::NotAnInteger(raw.to_string()));
        }

        let digits = raw.trim_start_matches('0');
        // Equal-length digit strings compare like the numbers they spell.
        if digits.len() > UINT256_MAX.len()
            || (digits.len() == UINT256_MAX.len() && digits > UINT256_MAX)
        {
            return Err(UnitsError::OutOfRange(raw.to_string(), decimals));
        }
        if digits.is_empty() {
            return Ok(Decimal::zero());
        }

        BigDecimal::from_str(&format!("{}e-{}", digits, decimals))
            .map(|d| Decimal(d.normalized()))
            .map_err(|_| UnitsError::NotAnInteger(raw.to_string()))
    }

    /// Format the Decimal as a canonical string (no exponent notation).
    pub fn to_canonical_string(&self) -> String {
        if self.0.is_zero() {
            return "0".to_string();
        }
        self.0.normalized().to_plain_string()
    }

    /// The additive identity (0).
    pub fn zero() -> Self {
        Decimal(BigDecimal::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl Default for Decimal {
    fn default() -> Self {
        Decimal::zero()
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical_string())
    }
}

impl FromStr for Decimal {
    type Err = ParseBigDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}

impl From<Decimal> for String {
    fn from(value: Decimal) -> Self {
        value.to_canonical_string()
    }
}

impl TryFrom<String> for Decimal {
    type Error = ParseBigDecimalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str_canonical(&value)
    }
}

impl std::ops::Add for Decimal {
    type Output = Decimal;

    fn add(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for Decimal {
    fn add_assign(&mut self, rhs: Decimal) {
        self.0 += rhs.0;
    }
}

impl std::iter::Sum for Decimal {
    fn sum<I: Iterator<Item = Decimal>>(iter: I) -> Self {
        iter.fold(Decimal::zero(), |acc, d| acc + d)
    }
}
