//! Money calculation utilities using rust_decimal for precision
//!
//! All calculations are done using `Decimal` internally, then converted
//! to `f64` for storage/serialization. Every computed price is rounded
//! to 2 decimal places after summation, never truncated mid-calculation.

use rust_decimal::prelude::*;
use shared::cart::LineItem;

use super::error::{CartError, CartResult};

/// Rounding for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed price per item
const MAX_PRICE: f64 = 100_000.0;

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Validate a catalog price before it enters the cart
///
/// Prices must be finite, non-negative and below the sanity ceiling.
pub fn require_valid_price(value: f64, field: &'static str) -> CartResult<()> {
    if !value.is_finite() || value < 0.0 || value > MAX_PRICE {
        return Err(CartError::InvalidPrice { field, value });
    }
    Ok(())
}

/// Line subtotal: unit_price * quantity
pub fn line_subtotal(item: &LineItem) -> Decimal {
    let unit = to_decimal(item.unit_price);
    let quantity = Decimal::from(item.quantity);
    (unit * quantity).round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Cart total: sum of line subtotals
pub fn cart_total(items: &[LineItem]) -> f64 {
    let total: Decimal = items.iter().map(line_subtotal).sum();
    to_f64(total)
}
