//! Catalog Models

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

/// Optional, separately priced modifier attachable to a catalog item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AddOn {
    pub id: String,
    pub name: String,
    /// Non-negative price in currency units
    pub price: f64,
}

/// Purchasable menu item
///
/// Immutable once loaded from the catalog provider. Carts snapshot the
/// name and base price at add time; later catalog changes never alter
/// items already in a cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Base price (non-negative, 2 decimal places)
    pub price: f64,
    pub category: String,
    pub available: bool,
    pub image: String,
    /// Ordered list of add-ons offered for this item
    #[serde(default)]
    pub extras: Vec<AddOn>,
}

impl CatalogItem {
    /// Look up an add-on offered by this item
    pub fn extra(&self, extra_id: &str) -> Option<&AddOn> {
        self.extras.iter().find(|e| e.id == extra_id)
    }

    /// Base price plus the sum of the selected add-on prices
    ///
    /// Unknown ids are ignored here; the store rejects them before an
    /// item ever reaches the cart. Summed in `Decimal`, rounded to 2
    /// decimal places after summation.
    pub fn price_with_extras(&self, selected: &[String]) -> f64 {
        let base = Decimal::from_f64(self.price).unwrap_or_default();
        let extras: Decimal = selected
            .iter()
            .filter_map(|id| self.extra(id))
            .filter_map(|e| Decimal::from_f64(e.price))
            .sum();
        (base + extras)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            .to_f64()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn burger() -> CatalogItem {
        CatalogItem {
            id: "item-1".to_string(),
            name: "X-Burger".to_string(),
            description: "Hambúrguer artesanal, queijo prato".to_string(),
            price: 18.00,
            category: "lanches".to_string(),
            available: true,
            image: String::new(),
            extras: vec![
                AddOn { id: "extra-1".to_string(), name: "Queijo extra".to_string(), price: 2.00 },
                AddOn { id: "extra-2".to_string(), name: "Bacon".to_string(), price: 3.00 },
            ],
        }
    }

    #[test]
    fn price_without_extras_is_base_price() {
        assert_eq!(burger().price_with_extras(&[]), 18.00);
    }

    #[test]
    fn price_sums_selected_extras() {
        let selected = vec!["extra-1".to_string(), "extra-2".to_string()];
        assert_eq!(burger().price_with_extras(&selected), 23.00);
    }

    #[test]
    fn unknown_extra_ids_are_ignored() {
        let selected = vec!["extra-99".to_string()];
        assert_eq!(burger().price_with_extras(&selected), 18.00);
    }
}
