//! Cart aggregate types
//!
//! `LineItem` snapshots the catalog data it was created from: price
//! changes in the catalog must not retroactively alter items already in
//! the cart. Unit prices are recomputed only by store operations,
//! against the original catalog entry's add-on price table.

use serde::{Deserialize, Serialize};

use crate::models::customer::CustomerProfile;
use crate::models::payment::PaymentSelection;

/// One customized, quantified instance of a catalog item in the cart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    /// Instance id, generated at add time (uuid v4)
    pub id: String,
    /// Source catalog item id
    pub catalog_item_id: String,
    /// Name snapshot
    pub name: String,
    /// Base price snapshot (before add-ons)
    pub base_price: f64,
    /// Quantity, always within [1, max_item_quantity]
    pub quantity: i32,
    /// Selected add-on ids (subset of the source item's add-ons)
    #[serde(default)]
    pub selected_extras: Vec<String>,
    /// Sanitized, length-bounded free-text note
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Who this item is for, in multi-person orders
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    /// base_price + sum of selected add-on prices (computed by the store)
    pub unit_price: f64,
}

/// Partial update for a line item
///
/// `None` means "leave the field untouched". Changing the extras
/// selection recomputes the unit price from the original catalog entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineItemChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_extras: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i32>,
}

/// UI theme, persisted with the cart state
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggle(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// One-time record that an order was accepted for deferred fulfillment
///
/// Written when the customer acknowledges ordering outside business
/// hours; consumed (removed) when the order message is composed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchedulingMarker {
    pub scheduled: bool,
    /// Human-readable window label, e.g. "sexta-feira às 18h"
    pub delivery_window: String,
    /// Unix millis at acknowledgment time
    pub created_at: i64,
}

/// The persisted cart aggregate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartSnapshot {
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentSelection>,
    #[serde(default)]
    pub theme: Theme,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_toggle_round_trips() {
        assert_eq!(Theme::Light.toggle(), Theme::Dark);
        assert_eq!(Theme::Dark.toggle(), Theme::Light);
    }

    #[test]
    fn line_item_changes_default_touches_nothing() {
        let changes = LineItemChanges::default();
        assert!(changes.selected_extras.is_none());
        assert!(changes.note.is_none());
        assert!(changes.recipient.is_none());
        assert!(changes.quantity.is_none());
    }

    #[test]
    fn cart_snapshot_deserializes_from_empty_object() {
        let snapshot: CartSnapshot = serde_json::from_str("{}").unwrap();
        assert!(snapshot.items.is_empty());
        assert!(snapshot.customer.is_none());
        assert!(snapshot.payment.is_none());
        assert_eq!(snapshot.theme, Theme::Light);
    }
}
