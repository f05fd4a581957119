//! Status state machines for the three record families created by a checkout.
//!
//! A checkout creates all three in their initial state. Voiding moves all
//! three to `Voided` together:
//! ```text
//! Sale:    Completed ──► Voided
//! Invoice: Active ─────► Voided
//! Order:   Pending ──► Processing ──► Completed ──► Delivered
//!             │             │
//!             └─────────────┴──► Voided
//! ```

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Status of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    #[default]
    Completed,
    Voided,
}

impl SaleStatus {
    /// Returns true if the sale can be voided.
    pub fn can_void(&self) -> bool {
        matches!(self, SaleStatus::Completed)
    }

    /// Returns the storage name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Completed => "completed",
            SaleStatus::Voided => "voided",
        }
    }
}

impl std::fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SaleStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(SaleStatus::Completed),
            "voided" => Ok(SaleStatus::Voided),
            other => Err(DomainError::UnknownStatus {
                entity: "sale",
                value: other.to_string(),
            }),
        }
    }
}

/// Status of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Active,
    Voided,
}

impl InvoiceStatus {
    /// Returns true if the invoice can be voided.
    pub fn can_void(&self) -> bool {
        matches!(self, InvoiceStatus::Active)
    }

    /// Returns the storage name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Active => "active",
            InvoiceStatus::Voided => "voided",
        }
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(InvoiceStatus::Active),
            "voided" => Ok(InvoiceStatus::Voided),
            other => Err(DomainError::UnknownStatus {
                entity: "invoice",
                value: other.to_string(),
            }),
        }
    }
}

/// Status of a fulfillment order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Created by checkout, not yet picked.
    #[default]
    Pending,

    /// Being prepared.
    Processing,

    /// Ready or handed to the carrier.
    Completed,

    /// Received by the customer (terminal state).
    Delivered,

    /// Reversed by a void (terminal state).
    Voided,
}

impl OrderStatus {
    /// Returns true if the order can still be voided.
    ///
    /// Goods that already left the store cannot be put back on the shelf, so
    /// completed and delivered orders are not voidable.
    pub fn can_void(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Processing)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Voided)
    }

    /// Returns the storage name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Voided => "voided",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "completed" => Ok(OrderStatus::Completed),
            "delivered" => Ok(OrderStatus::Delivered),
            "voided" => Ok(OrderStatus::Voided),
            other => Err(DomainError::UnknownStatus {
                entity: "order",
                value: other.to_string(),
            }),
        }
    }
}
