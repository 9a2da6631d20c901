//! Money type for representing currency amounts
//!
//! Internally stores amounts in centavos (i64) to avoid floating-point drift
//! when summing line items. Provides safe arithmetic operations and formatting.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Represents a monetary amount stored as centavos (hundredths of a real)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Create a Money amount from centavos
    ///
    /// # Examples
    /// ```
    /// use conta_certa::models::Money;
    /// let amount = Money::from_cents(1050); // R$ 10,50
    /// ```
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Create a Money amount from reais and centavos
    ///
    /// # Examples
    /// ```
    /// use conta_certa::models::Money;
    /// let amount = Money::from_reais_cents(150, 0);
    /// assert_eq!(amount.cents(), 15000);
    /// ```
    pub const fn from_reais_cents(reais: i64, cents: i64) -> Self {
        Self(reais * 100 + cents)
    }

    /// Create a zero Money amount
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Get the amount in centavos
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Get the whole reais portion (truncated toward zero)
    pub const fn reais(&self) -> i64 {
        self.0 / 100
    }

    /// Get the centavos portion (0-99)
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// `None` when the sum leaves the i64 range
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Unit price times a quantity; `None` on overflow
    pub fn checked_mul(self, quantity: u32) -> Option<Self> {
        self.0.checked_mul(i64::from(quantity)).map(Self)
    }

    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Parse a money amount from a string
    ///
    /// Accepts "150", "150.00", "150,00", "R$ 1.234,56" and "1,234.56".
    /// When both separators appear, the last one is the decimal separator.
    /// More than two decimal digits is an error, never a silent truncation.
    pub fn parse(s: &str) -> Result<Self, MoneyParseError> {
        let original = s;
        let s = s.trim();

        let (negative, s) = match s.strip_prefix('-') {
            Some(stripped) => (true, stripped),
            None => (false, s),
        };

        let s = s.strip_prefix("R$").unwrap_or(s).trim();
        if s.is_empty() {
            return Err(MoneyParseError::InvalidFormat(original.to_string()));
        }

        let decimal_sep = match (s.rfind('.'), s.rfind(',')) {
            (Some(dot), Some(comma)) => Some(if dot > comma { '.' } else { ',' }),
            (Some(_), None) => Some('.'),
            (None, Some(_)) => Some(','),
            (None, None) => None,
        };

        let (whole, fraction) = match decimal_sep {
            Some(sep) => {
                let idx = s.rfind(sep).unwrap_or(s.len());
                (&s[..idx], &s[idx + 1..])
            }
            None => (s, ""),
        };

        let whole: String = whole.chars().filter(|c| *c != '.' && *c != ',').collect();
        let whole = if whole.is_empty() { "0".to_string() } else { whole };
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
            || fraction.len() > 2
        {
            return Err(MoneyParseError::InvalidFormat(original.to_string()));
        }

        let reais: i64 = whole
            .parse()
            .map_err(|_| MoneyParseError::InvalidFormat(original.to_string()))?;

        // Pad centavos to 2 digits
        let cents: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().unwrap_or(0) * 10,
            _ => fraction.parse().unwrap_or(0),
        };

        let total = reais
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .ok_or_else(|| MoneyParseError::InvalidFormat(original.to_string()))?;

        Ok(Self(if negative { -total } else { total }))
    }

    /// Format with a currency symbol, using a comma as decimal separator
    pub fn format_with_symbol(&self, symbol: &str) -> String {
        if self.is_negative() {
            format!("-{} {},{:02}", symbol, self.reais().abs(), self.cents_part())
        } else {
            format!("{} {},{:02}", symbol, self.reais(), self.cents_part())
        }
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_with_symbol("R$"))
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self(self.0 - other.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}


/// Error type for money parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoneyParseError {
    InvalidFormat(String),
}

impl fmt::Display for MoneyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoneyParseError::InvalidFormat(s) => write!(f, "Invalid money format: {}", s),
        }
    }
}

impl std::error::Error for MoneyParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let m = Money::from_cents(1050);
        assert_eq!(m.cents(), 1050);
        assert_eq!(m.reais(), 10);
        assert_eq!(m.cents_part(), 50);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1050)), "R$ 10,50");
        assert_eq!(format!("{}", Money::from_cents(0)), "R$ 0,00");
        assert_eq!(format!("{}", Money::from_cents(-1050)), "-R$ 10,50");
        assert_eq!(format!("{}", Money::from_cents(5)), "R$ 0,05");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((-a).cents(), -1000);
        assert_eq!(b.checked_mul(3), Some(Money::from_cents(1500)));
        assert_eq!(b.checked_mul(0), Some(Money::zero()));
        assert_eq!(a.checked_add(b), Some(Money::from_cents(1500)));
    }

    #[test]
    fn test_checked_arithmetic_overflow() {
        assert_eq!(Money::from_cents(i64::MAX / 2).checked_mul(3), None);
        assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
        assert_eq!(
            Money::from_cents(i64::MAX / 2).checked_mul(2),
            Some(Money::from_cents(i64::MAX / 2 * 2))
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!(Money::parse("10.50").unwrap().cents(), 1050);
        assert_eq!(Money::parse("10,50").unwrap().cents(), 1050);
        assert_eq!(Money::parse("R$ 10,50").unwrap().cents(), 1050);
        assert_eq!(Money::parse("-10.50").unwrap().cents(), -1050);
        assert_eq!(Money::parse("10").unwrap().cents(), 1000);
        assert_eq!(Money::parse("10.5").unwrap().cents(), 1050);
        assert_eq!(Money::parse("0.05").unwrap().cents(), 5);
        assert_eq!(Money::parse("1.234,56").unwrap().cents(), 123456);
        assert_eq!(Money::parse("1,234.56").unwrap().cents(), 123456);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Money::parse("").is_err());
        assert!(Money::parse("R$").is_err());
        assert!(Money::parse("abc").is_err());
        assert!(Money::parse("12.x4").is_err());
    }

    #[test]
    fn test_parse_rejects_extra_decimals() {
        assert!(Money::parse("10.999").is_err());
        assert!(Money::parse("10,001").is_err());
        assert!(Money::parse("R$ 1.234,567").is_err());
        assert_eq!(Money::parse("10.99").unwrap().cents(), 1099);
    }

    #[test]
    fn test_sum_has_no_drift() {
        // 0.10 added ten times is exactly 1.00
        let mut total = Money::zero();
        for _ in 0..10 {
            total += Money::from_cents(10);
        }
        assert_eq!(total, Money::from_reais_cents(1, 0));
    }

    #[test]
    fn test_serialization() {
        let m = Money::from_cents(1050);
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "1050");

        let deserialized: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(m, deserialized);
    }
}
