//! Fixed-point euro amounts.

use std::{
    fmt,
    ops::{Add, AddAssign, Sub, SubAssign},
    str::FromStr,
};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

const CENTS_PER_EURO: i64 = 100;

/// An amount of money stored as whole euro cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    /// No money at all.
    pub const ZERO: Money = Money(0);

    /// Build an amount from a number of cents.
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Build an amount from a number of whole euros.
    pub const fn from_euros(euros: i64) -> Self {
        Self(euros * CENTS_PER_EURO)
    }

    /// Like [`Money::from_euros`], but `None` when the amount does not fit in cents.
    pub const fn try_from_euros(euros: i64) -> Option<Self> {
        match euros.checked_mul(CENTS_PER_EURO) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Raw value in cents.
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// True when the amount is strictly greater than zero.
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Multiply by a whole factor.
    pub const fn times(self, factor: i64) -> Self {
        Self(self.0 * factor)
    }

    /// The given percentage of this amount, rounded towards zero to the cent.
    pub const fn percent(self, percent: i64) -> Self {
        Self(self.0 * percent / 100)
    }

    /// Amount without the currency symbol, e.g. `1500` or `12.50`.
    pub fn plain(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let euros = abs / CENTS_PER_EURO as u64;
        let cents = abs % CENTS_PER_EURO as u64;
        if cents == 0 {
            format!("{sign}{euros}")
        } else {
            format!("{sign}{euros}.{cents:02}")
        }
    }

    fn from_euro_float(euros: f64) -> Option<Self> {
        if !euros.is_finite() {
            return None;
        }
        let cents = (euros * CENTS_PER_EURO as f64).round();
        if cents.abs() > i64::MAX as f64 {
            return None;
        }
        Some(Self(cents as i64))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 0 {
            write!(f, "-€{}", Money(-self.0).plain())
        } else {
            write!(f, "€{}", self.plain())
        }
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

/// Reasons a typed amount could not be understood.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseMoneyError {
    /// Nothing but whitespace was entered.
    #[error("no amount entered")]
    Empty,
    /// The input contained something other than digits and one decimal point.
    #[error("'{0}' is not a valid amount")]
    Invalid(String),
    /// More than two digits after the decimal point.
    #[error("amounts can have at most two decimals")]
    TooPrecise,
}

impl FromStr for Money {
    type Err = ParseMoneyError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let trimmed = trimmed.strip_prefix('€').unwrap_or(trimmed).trim();
        if trimmed.is_empty() {
            return Err(ParseMoneyError::Empty);
        }

        let invalid = || ParseMoneyError::Invalid(input.trim().to_string());
        let (whole, fraction) = match trimmed.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (trimmed, ""),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().all(|ch| ch.is_ascii_digit())
            || !fraction.chars().all(|ch| ch.is_ascii_digit())
        {
            return Err(invalid());
        }
        if fraction.len() > 2 {
            return Err(ParseMoneyError::TooPrecise);
        }

        let euros: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let cents: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => fraction.parse().map_err(|_| invalid())?,
        };

        euros
            .checked_mul(CENTS_PER_EURO)
            .and_then(|value| value.checked_add(cents))
            .map(Money)
            .ok_or_else(invalid)
    }
}

/// Prices travel as plain euro numbers (`200`, `1499.99`).
impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let euros = f64::deserialize(deserializer)?;
        Money::from_euro_float(euros)
            .ok_or_else(|| de::Error::custom(format!("{euros} is not a usable amount")))
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(self.0 as f64 / CENTS_PER_EURO as f64)
    }
}
