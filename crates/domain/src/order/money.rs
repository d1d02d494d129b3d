//! Currency-tagged money values.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Number of nano units in one whole currency unit.
pub const NANOS_PER_UNIT: i64 = 1_000_000_000;

const NANOS_PER_CENT: i64 = 10_000_000;

/// Returns true if `code` looks like an ISO 4217 currency code.
pub fn is_valid_currency_code(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase())
}

/// A money amount: currency code, whole units and billionths of a unit.
///
/// `units` and `nanos` always carry the same sign and `|nanos| < 10^9`, so
/// every amount has exactly one representation. All arithmetic is done on
/// the exact nano total and refuses to mix currencies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    currency_code: String,
    units: i64,
    nanos: i32,
}

impl Money {
    /// Creates a money value, validating the currency code and nanos.
    pub fn new(
        currency_code: impl Into<String>,
        units: i64,
        nanos: i32,
    ) -> Result<Self, DomainError> {
        let currency_code = currency_code.into();
        if !is_valid_currency_code(&currency_code) {
            return Err(DomainError::InvalidCurrencyCode(currency_code));
        }

        let sign_mismatch = (units > 0 && nanos < 0) || (units < 0 && nanos > 0);
        if i64::from(nanos).abs() >= NANOS_PER_UNIT || sign_mismatch {
            return Err(DomainError::InvalidNanos { units, nanos });
        }

        Ok(Self {
            currency_code,
            units,
            nanos,
        })
    }

    /// Creates a money value from a total amount of nanos.
    pub fn from_nanos(currency_code: impl Into<String>, total: i128) -> Result<Self, DomainError> {
        let per_unit = i128::from(NANOS_PER_UNIT);
        let units = i64::try_from(total / per_unit).map_err(|_| DomainError::Overflow)?;
        // Remainder keeps the sign of the dividend and is below 10^9.
        let nanos = (total % per_unit) as i32;
        Self::new(currency_code, units, nanos)
    }

    /// Creates a money value from cents (hundredths of a unit).
    pub fn from_cents(currency_code: impl Into<String>, cents: i64) -> Result<Self, DomainError> {
        Self::from_nanos(
            currency_code,
            i128::from(cents) * i128::from(NANOS_PER_CENT),
        )
    }

    /// Creates a money value of whole units.
    pub fn from_units(currency_code: impl Into<String>, units: i64) -> Result<Self, DomainError> {
        Self::new(currency_code, units, 0)
    }

    /// Returns zero in the given currency.
    pub fn zero(currency_code: impl Into<String>) -> Result<Self, DomainError> {
        Self::new(currency_code, 0, 0)
    }

    /// Returns the currency code.
    pub fn currency_code(&self) -> &str {
        &self.currency_code
    }

    /// Returns the whole units.
    pub fn units(&self) -> i64 {
        self.units
    }

    /// Returns the fractional part in billionths of a unit.
    pub fn nanos(&self) -> i32 {
        self.nanos
    }

    /// Returns the exact amount in nanos.
    pub fn total_nanos(&self) -> i128 {
        i128::from(self.units) * i128::from(NANOS_PER_UNIT) + i128::from(self.nanos)
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.units == 0 && self.nanos == 0
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.units < 0 || self.nanos < 0
    }

    /// Adds another amount of the same currency.
    pub fn checked_add(&self, other: &Money) -> Result<Money, DomainError> {
        self.ensure_same_currency(other)?;
        Self::from_nanos(
            self.currency_code.clone(),
            self.total_nanos() + other.total_nanos(),
        )
    }

    /// Multiplies by a quantity.
    pub fn multiply(&self, quantity: u32) -> Result<Money, DomainError> {
        Self::from_nanos(
            self.currency_code.clone(),
            self.total_nanos() * i128::from(quantity),
        )
    }

    /// Sums amounts that all share `currency_code`.
    pub fn sum<'a>(
        currency_code: &str,
        amounts: impl IntoIterator<Item = &'a Money>,
    ) -> Result<Money, DomainError> {
        amounts
            .into_iter()
            .try_fold(Money::zero(currency_code)?, |acc, m| acc.checked_add(m))
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), DomainError> {
        if self.currency_code != other.currency_code {
            return Err(DomainError::CurrencyMismatch {
                expected: self.currency_code.clone(),
                actual: other.currency_code.clone(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let cents = i64::from(self.nanos).abs() / NANOS_PER_CENT;
        write!(
            f,
            "{sign}{}.{:02} {}",
            self.units.abs(),
            cents,
            self.currency_code
        )
    }
}
