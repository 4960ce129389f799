//! Store configuration
//!
//! # Environment variables
//!
//! All values can be overridden through the environment:
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | BUSINESS_NAME | Kadu Lanches | Name shown in the order header |
//! | WHATSAPP_NUMBER | (empty) | Handoff recipient, digits with country code |
//! | TIMEZONE | America/Sao_Paulo | IANA zone for business-hours checks |
//! | MINIMUM_ORDER | 15.00 | Currency floor for checkout |
//! | DELIVERY_FEE | 5.00 | Flat delivery fee |
//! | MAX_CART_ITEMS | 20 | Distinct line-item ceiling |
//! | MAX_ITEM_QUANTITY | 10 | Per-item quantity ceiling |
//!
//! Unparseable values fall back to the default with a warning.

use std::str::FromStr;

use chrono::{NaiveTime, Weekday};
use chrono_tz::Tz;

use crate::checkout::{BusinessHours, DayWindow};
use crate::store::CartLimits;

/// Storefront configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Name shown in the order message header
    pub business_name: String,
    /// Handoff recipient, digits including country code
    pub whatsapp_number: String,
    /// Business timezone; all gate checks run in this zone
    pub timezone: Tz,
    /// Weekly opening schedule
    pub hours: BusinessHours,
    /// Minimum order total for checkout
    pub minimum_order: f64,
    /// Flat delivery fee
    pub delivery_fee: f64,
    /// Estimated delivery window, minutes
    pub delivery_time_min: u32,
    pub delivery_time_max: u32,
    /// Distinct line-item ceiling
    pub max_cart_items: usize,
    /// Per-item quantity ceiling
    pub max_item_quantity: i32,
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

impl StoreConfig {
    /// Built-in defaults, no environment reads
    ///
    /// The observed schedule: Friday from 18:00, Saturday and Sunday
    /// from 15:00, all until midnight.
    pub fn offline_defaults() -> Self {
        Self {
            business_name: "Kadu Lanches".to_string(),
            whatsapp_number: String::new(),
            timezone: chrono_tz::America::Sao_Paulo,
            hours: BusinessHours::new(vec![
                DayWindow { weekday: Weekday::Fri, open: hm(18, 0), close: None },
                DayWindow { weekday: Weekday::Sat, open: hm(15, 0), close: None },
                DayWindow { weekday: Weekday::Sun, open: hm(15, 0), close: None },
            ]),
            minimum_order: 15.00,
            delivery_fee: 5.00,
            delivery_time_min: 30,
            delivery_time_max: 50,
            max_cart_items: 20,
            max_item_quantity: 10,
        }
    }

    /// Load configuration from the environment
    pub fn from_env() -> Self {
        let defaults = Self::offline_defaults();

        let timezone = match std::env::var("TIMEZONE") {
            Ok(name) => Tz::from_str(&name).unwrap_or_else(|_| {
                tracing::warn!(zone = %name, "unknown TIMEZONE, falling back to America/Sao_Paulo");
                defaults.timezone
            }),
            Err(_) => defaults.timezone,
        };

        let whatsapp_number = std::env::var("WHATSAPP_NUMBER").unwrap_or_default();
        if whatsapp_number.is_empty() {
            tracing::warn!("WHATSAPP_NUMBER is not set; handoff URLs will have no recipient");
        }

        Self {
            business_name: std::env::var("BUSINESS_NAME")
                .unwrap_or_else(|_| defaults.business_name.clone()),
            whatsapp_number,
            timezone,
            minimum_order: env_parse("MINIMUM_ORDER", defaults.minimum_order),
            delivery_fee: env_parse("DELIVERY_FEE", defaults.delivery_fee),
            max_cart_items: env_parse("MAX_CART_ITEMS", defaults.max_cart_items),
            max_item_quantity: env_parse("MAX_ITEM_QUANTITY", defaults.max_item_quantity),
            ..defaults
        }
    }

    /// Cart ceilings for the store
    pub fn limits(&self) -> CartLimits {
        CartLimits {
            max_cart_items: self.max_cart_items,
            max_item_quantity: self.max_item_quantity,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Parse an env var, warning and falling back on bad values
fn env_parse<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(var = name, value = %raw, "unparseable value, using default {default}");
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_defaults_match_the_observed_configuration() {
        let config = StoreConfig::offline_defaults();
        assert_eq!(config.minimum_order, 15.00);
        assert_eq!(config.max_cart_items, 20);
        assert_eq!(config.max_item_quantity, 10);
        assert_eq!(config.timezone, chrono_tz::America::Sao_Paulo);

        let friday = config.hours.window_for(Weekday::Fri).unwrap();
        assert_eq!(friday.open, hm(18, 0));
        assert!(friday.close.is_none());
        assert!(config.hours.window_for(Weekday::Mon).is_none());
    }

    #[test]
    fn limits_mirror_the_config_ceilings() {
        let config = StoreConfig::offline_defaults();
        let limits = config.limits();
        assert_eq!(limits.max_cart_items, 20);
        assert_eq!(limits.max_item_quantity, 10);
    }

    #[test]
    fn weekday_windows_cover_three_days() {
        use Weekday::*;
        let config = StoreConfig::offline_defaults();
        let open_days = [Mon, Tue, Wed, Thu, Fri, Sat, Sun]
            .into_iter()
            .filter(|w| config.hours.window_for(*w).is_some())
            .count();
        assert_eq!(open_days, 3);
    }
}
