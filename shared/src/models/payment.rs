//! Payment Models

use serde::{Deserialize, Serialize};

/// On-delivery payment method
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Cash on delivery, optionally with change due
    Cash,
    /// Credit card on delivery
    Credit,
    /// Debit card on delivery
    Debit,
    /// PIX transfer (key sent after order confirmation)
    Pix,
}

/// Selected payment method plus cash details
///
/// For cash, either `no_change` is set or `change_for` holds the bill
/// amount the customer will pay with. The amount must strictly exceed
/// the order total and stays within the configured ceiling; the
/// validation module enforces both.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentSelection {
    pub method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_for: Option<f64>,
    #[serde(default)]
    pub no_change: bool,
}

impl PaymentSelection {
    /// Selection without cash details (card and PIX methods)
    pub fn new(method: PaymentMethod) -> Self {
        Self { method, change_for: None, no_change: false }
    }

    /// Cash selection with change due for the given bill amount
    pub fn cash_with_change(change_for: f64) -> Self {
        Self { method: PaymentMethod::Cash, change_for: Some(change_for), no_change: false }
    }

    /// Cash selection with exact payment, no change needed
    pub fn cash_no_change() -> Self {
        Self { method: PaymentMethod::Cash, change_for: None, no_change: true }
    }
}
