//! Money value object.
//!
//! All monetary amounts are stored as integer cents, never floats.
//! The currency is implicit (single-currency platform); currency and tax
//! logic live outside this core.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Monetary amount in integer cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates an amount from integer cents.
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// The zero amount (used for gifted purchases).
    pub fn zero() -> Self {
        Self(0)
    }

    /// Returns the amount in integer cents.
    pub fn cents(&self) -> i64 {
        self.0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Money {
    /// Formats as a decimal string, e.g. `15.50`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}
