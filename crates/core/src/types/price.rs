//! Prices denominated in sats.
//!
//! The storefront only ever deals in the smallest unit of the payment system,
//! so a price is a plain non-negative integer. Arithmetic saturates instead of
//! wrapping: a cart total that overflows `u64` is already nonsense, and a
//! display value pinned at the maximum is easier to spot than a wrapped one.

use core::fmt;
use core::iter::Sum;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing [`Sats`] from text.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseSatsError {
    /// The input string is empty.
    #[error("price cannot be empty")]
    Empty,
    /// The input is not a non-negative integer.
    #[error("price must be a non-negative integer, got {0:?}")]
    Invalid(String),
}

/// An amount in sats.
///
/// ## Examples
///
/// ```
/// use zapmarket_core::Sats;
///
/// let unit = Sats::new(1_000);
/// assert_eq!(unit.times(3), Sats::new(3_000));
/// assert_eq!(unit.times(3).to_string(), "3,000 sats");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Sats(u64);

impl Sats {
    /// Zero sats.
    pub const ZERO: Self = Self(0);

    /// Create a new amount.
    #[must_use]
    pub const fn new(amount: u64) -> Self {
        Self(amount)
    }

    /// Get the raw amount.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Multiply by a quantity, saturating at `u64::MAX`.
    #[must_use]
    pub const fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(quantity as u64))
    }

    /// Add another amount, saturating at `u64::MAX`.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Format the number with comma thousands separators and no unit.
    ///
    /// `1234567` becomes `"1,234,567"`.
    #[must_use]
    pub fn grouped(&self) -> String {
        let digits = self.0.to_string();
        let mut out = String::with_capacity(digits.len() + digits.len() / 3);
        let lead = digits.len() % 3;
        for (i, ch) in digits.chars().enumerate() {
            if i != 0 && (i + 3 - lead) % 3 == 0 {
                out.push(',');
            }
            out.push(ch);
        }
        out
    }
}

impl fmt::Display for Sats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} sats", self.grouped())
    }
}

impl From<u64> for Sats {
    fn from(amount: u64) -> Self {
        Self(amount)
    }
}

impl From<Sats> for u64 {
    fn from(amount: Sats) -> Self {
        amount.0
    }
}

impl FromStr for Sats {
    type Err = ParseSatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseSatsError::Empty);
        }
        trimmed
            .parse::<u64>()
            .map(Self)
            .map_err(|_| ParseSatsError::Invalid(trimmed.to_string()))
    }
}

impl Sum for Sats {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::saturating_add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouped_formatting() {
        assert_eq!(Sats::new(0).grouped(), "0");
        assert_eq!(Sats::new(999).grouped(), "999");
        assert_eq!(Sats::new(1_000).grouped(), "1,000");
        assert_eq!(Sats::new(25_000).grouped(), "25,000");
        assert_eq!(Sats::new(100_000).grouped(), "100,000");
        assert_eq!(Sats::new(1_234_567).grouped(), "1,234,567");
    }

    #[test]
    fn test_display_appends_unit() {
        assert_eq!(Sats::new(2_500).to_string(), "2,500 sats");
    }

    #[test]
    fn test_arithmetic_saturates() {
        assert_eq!(Sats::new(u64::MAX).times(2), Sats::new(u64::MAX));
        assert_eq!(
            Sats::new(u64::MAX).saturating_add(Sats::new(1)),
            Sats::new(u64::MAX)
        );
    }

    #[test]
    fn test_sum() {
        let total: Sats = [Sats::new(2_000), Sats::new(500)].into_iter().sum();
        assert_eq!(total, Sats::new(2_500));
    }

    #[test]
    fn test_parse() {
        assert_eq!(" 1500 ".parse::<Sats>(), Ok(Sats::new(1_500)));
        assert_eq!("".parse::<Sats>(), Err(ParseSatsError::Empty));
        assert!(matches!(
            "-5".parse::<Sats>(),
            Err(ParseSatsError::Invalid(_))
        ));
        assert!(matches!(
            "ten".parse::<Sats>(),
            Err(ParseSatsError::Invalid(_))
        ));
    }
}
