//! Cart store errors

use thiserror::Error;

/// Cart store errors
///
/// Capacity and quantity ceilings reject the operation with no partial
/// mutation. The *NotFound and UnknownExtra variants signal a
/// data-desync between cart and catalog rather than user error.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("cart already holds the maximum of {0} items")]
    CapacityExceeded(usize),

    #[error("invalid quantity: {got} (maximum {max})")]
    InvalidQuantity { got: i32, max: i32 },

    #[error("line item not found: {0}")]
    ItemNotFound(String),

    #[error("catalog item not found: {0}")]
    CatalogItemNotFound(String),

    #[error("catalog item {item} does not offer add-on {extra}")]
    UnknownExtra { item: String, extra: String },

    #[error("item is not available: {0}")]
    ItemUnavailable(String),

    #[error("invalid price for {field}: {value}")]
    InvalidPrice { field: &'static str, value: f64 },
}

pub type CartResult<T> = Result<T, CartError>;
