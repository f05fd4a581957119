//! Invoice numbering: `F<YYYY><MM><NNNN>`.
//!
//! The printed shape is consumed by accounting exports and must never change.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Highest counter value that fits the 4-digit suffix.
pub const MAX_COUNTER: u32 = 9999;

const PREFIX: char = 'F';
const NUMBER_LEN: usize = 11;

/// A billing period (calendar year and month) scoping an invoice sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// Creates a period, validating a 4-digit year and a month in 1..=12.
    pub fn new(year: i32, month: u32) -> Result<Self, DomainError> {
        if !(1000..=9999).contains(&year) || !(1..=12).contains(&month) {
            return Err(DomainError::InvalidPeriod { year, month });
        }
        Ok(Self { year, month })
    }

    /// Returns the period containing the given instant.
    pub fn containing(at: DateTime<Utc>) -> Self {
        Self {
            year: at.year(),
            month: at.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Returns the `F<YYYY><MM>` prefix shared by every invoice of the period.
    pub fn prefix(&self) -> String {
        format!("{PREFIX}{:04}{:02}", self.year, self.month)
    }

    /// Returns the compact key used for the per-period counter row (`YYYYMM`).
    pub fn key(&self) -> String {
        format!("{:04}{:02}", self.year, self.month)
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// A formatted, store-wide unique invoice number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InvoiceNumber {
    period: Period,
    counter: u32,
}

impl InvoiceNumber {
    /// Builds the number for `counter` within `period`.
    ///
    /// Counters start at 1. Anything above [`MAX_COUNTER`] is rejected rather
    /// than wrapped into a 5-digit or duplicate number.
    pub fn new(period: Period, counter: u32) -> Result<Self, DomainError> {
        if counter > MAX_COUNTER {
            return Err(DomainError::SequenceExhausted { period });
        }
        if counter == 0 {
            return Err(DomainError::InvalidInvoiceNumber(format!(
                "{}0000",
                period.prefix()
            )));
        }
        Ok(Self { period, counter })
    }

    /// Parses a printed invoice number.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let invalid = || DomainError::InvalidInvoiceNumber(s.to_string());

        if s.len() != NUMBER_LEN || !s.starts_with(PREFIX) {
            return Err(invalid());
        }
        let digits = &s[1..];
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let year: i32 = digits[0..4].parse().map_err(|_| invalid())?;
        let month: u32 = digits[4..6].parse().map_err(|_| invalid())?;
        let counter: u32 = digits[6..10].parse().map_err(|_| invalid())?;

        let period = Period::new(year, month).map_err(|_| invalid())?;
        Self::new(period, counter).map_err(|_| invalid())
    }

    pub fn period(&self) -> Period {
        self.period
    }

    /// Returns the trailing sequence value.
    pub fn counter(&self) -> u32 {
        self.counter
    }
}

impl std::fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{:04}", self.period.prefix(), self.counter)
    }
}

impl std::str::FromStr for InvoiceNumber {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for InvoiceNumber {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<InvoiceNumber> for String {
    fn from(number: InvoiceNumber) -> Self {
        number.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn period() -> Period {
        Period::new(2026, 3).unwrap()
    }

    #[test]
    fn test_formats_with_zero_padding() {
        let number = InvoiceNumber::new(period(), 7).unwrap();
        assert_eq!(number.to_string(), "F2026030007");
        assert_eq!(period().prefix(), "F202603");
        assert_eq!(period().key(), "202603");
    }

    #[test]
    fn test_parse_roundtrips_display() {
        let number = InvoiceNumber::parse("F2025121234").unwrap();
        assert_eq!(number.period(), Period::new(2025, 12).unwrap());
        assert_eq!(number.counter(), 1234);
        assert_eq!(number.to_string(), "F2025121234");
    }

    #[test]
    fn test_parse_rejects_malformed_numbers() {
        for bad in [
            "",
            "F202603001",
            "F20260300011",
            "X2026030001",
            "F2026130001",
            "F2026000001",
            "F2026030000",
            "F2026O30001",
        ] {
            assert!(InvoiceNumber::parse(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_counter_overflow_is_rejected() {
        assert!(InvoiceNumber::new(period(), MAX_COUNTER).is_ok());
        assert_eq!(
            InvoiceNumber::new(period(), MAX_COUNTER + 1),
            Err(DomainError::SequenceExhausted { period: period() })
        );
    }

    #[test]
    fn test_period_containing_instant() {
        let at = Utc.with_ymd_and_hms(2026, 10, 31, 23, 59, 59).unwrap();
        assert_eq!(Period::containing(at), Period::new(2026, 10).unwrap());
    }

    #[test]
    fn test_invalid_period() {
        assert!(Period::new(2026, 0).is_err());
        assert!(Period::new(2026, 13).is_err());
        assert!(Period::new(99, 1).is_err());
    }

    #[test]
    fn test_numbers_order_by_counter_within_period() {
        let a = InvoiceNumber::new(period(), 9).unwrap();
        let b = InvoiceNumber::new(period(), 10).unwrap();
        assert!(a < b);
        assert!(a.to_string() < b.to_string());
    }

    #[test]
    fn test_serde_uses_printed_form() {
        let number = InvoiceNumber::new(period(), 42).unwrap();
        let json = serde_json::to_string(&number).unwrap();
        assert_eq!(json, "\"F2026030042\"");
        let back: InvoiceNumber = serde_json::from_str(&json).unwrap();
        assert_eq!(back, number);
        assert!(serde_json::from_str::<InvoiceNumber>("\"F20260342\"").is_err());
    }
}
