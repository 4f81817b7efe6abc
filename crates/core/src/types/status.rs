//! Status enums for orders and payments.
//!
//! Values match the strings the backend API stores and returns. Unknown
//! values deserialize into `Other` so a new backend state never breaks the
//! confirmation page.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
    #[serde(untagged)]
    Other(String),
}

impl OrderStatus {
    /// Human-readable label shown to shoppers.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Pending => "Pending Payment",
            Self::Confirmed => "Order Confirmed",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
            Self::Refunded => "Refunded",
            Self::Other(raw) => raw,
        }
    }
}

/// Payment status of an order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
    Refunded,
    #[serde(untagged)]
    Other(String),
}

impl PaymentStatus {
    /// Human-readable label shown to shoppers.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Pending => "Payment Pending",
            Self::Processing => "Processing Payment",
            Self::Completed => "Payment Completed",
            Self::Failed => "Payment Failed",
            Self::Refunded => "Payment Refunded",
            Self::Other(raw) => raw,
        }
    }
}

/// Payment method chosen at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Card payment; requires a provider token before the order is sent.
    #[default]
    CreditCard,
    /// Manual bank transfer after the order is placed.
    BankTransfer,
    /// Pay the courier on delivery.
    CashOnDelivery,
}

impl PaymentMethod {
    /// Whether the method needs card tokenization.
    #[must_use]
    pub const fn requires_card(self) -> bool {
        matches!(self, Self::CreditCard)
    }

    /// Wire value expected by the backend.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreditCard => "credit_card",
            Self::BankTransfer => "bank_transfer",
            Self::CashOnDelivery => "cash_on_delivery",
        }
    }

    /// Parse a form value, accepting the backend wire names.
    #[must_use]
    pub fn from_form(value: &str) -> Option<Self> {
        match value.trim() {
            "credit_card" | "card" => Some(Self::CreditCard),
            "bank_transfer" => Some(Self::BankTransfer),
            "cash_on_delivery" | "cod" => Some(Self::CashOnDelivery),
            _ => None,
        }
    }
}
