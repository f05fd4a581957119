//! Value objects for the checkout domain.

use common::SkuId;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Money amount represented in cents to avoid floating point issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money {
    /// Amount in cents (e.g., 1000 = $10.00)
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the dollar portion (whole number).
    pub fn dollars(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the cents portion (remainder after dollars).
    pub fn cents_part(&self) -> i64 {
        self.cents.abs() % 100
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }

    /// Multiplies by a quantity, or `None` if the product overflows.
    pub fn checked_multiply(&self, quantity: u32) -> Option<Money> {
        self.cents
            .checked_mul(i64::from(quantity))
            .map(Money::from_cents)
    }

    /// Adds two amounts, or `None` if the sum overflows.
    pub fn checked_add(&self, rhs: Money) -> Option<Money> {
        self.cents.checked_add(rhs.cents).map(Money::from_cents)
    }

    /// Sums amounts, or `None` if any partial sum overflows.
    pub fn checked_sum<I: IntoIterator<Item = Money>>(amounts: I) -> Option<Money> {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, m| acc.checked_add(m))
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-${}.{:02}", self.dollars().abs(), self.cents_part())
        } else {
            write!(f, "${}.{:02}", self.dollars(), self.cents_part())
        }
    }
}

// Operators saturate at the i64 bounds. Untrusted input goes through the
// checked_* methods instead.
impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents.saturating_add(rhs.cents),
        }
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.cents = self.cents.saturating_add(rhs.cents);
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

/// How a sale was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    DebitCard,
    CreditCard,
    BankTransfer,
    Online,
}

impl PaymentMethod {
    /// Returns the storage name of the payment method.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Online => "online",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "debit_card" => Ok(PaymentMethod::DebitCard),
            "credit_card" => Ok(PaymentMethod::CreditCard),
            "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            "online" => Ok(PaymentMethod::Online),
            other => Err(DomainError::UnknownStatus {
                entity: "payment method",
                value: other.to_string(),
            }),
        }
    }
}

/// A priced line of a committed sale or invoice.
///
/// The unit price is the price at time of sale and never changes after commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// The SKU sold.
    pub sku_id: SkuId,

    /// Units sold; always greater than zero.
    pub quantity: u32,

    /// Price per unit in cents.
    pub unit_price: Money,
}

impl LineItem {
    /// Creates a new line item.
    pub fn new(sku_id: impl Into<SkuId>, quantity: u32, unit_price: Money) -> Self {
        Self {
            sku_id: sku_id.into(),
            quantity,
            unit_price,
        }
    }

    /// Returns quantity * unit_price.
    ///
    /// Committed lines always fit; see [`LineItem::checked_subtotal`] for lines
    /// built from request input.
    pub fn subtotal(&self) -> Money {
        Money::from_cents(
            self.unit_price
                .cents()
                .saturating_mul(i64::from(self.quantity)),
        )
    }

    /// Returns quantity * unit_price, failing if it overflows.
    pub fn checked_subtotal(&self) -> Result<Money, DomainError> {
        self.unit_price.checked_multiply(self.quantity).ok_or_else(|| {
            DomainError::AmountOverflow(format!(
                "{} x {} cents for {}",
                self.quantity,
                self.unit_price.cents(),
                self.sku_id
            ))
        })
    }
}

/// Optional delivery information attached to a fulfillment order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryDetails {
    pub recipient: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
}
