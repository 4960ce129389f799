//! Shared types for the storefront ordering core
//!
//! Plain data models (catalog, cart, customer, payment) used by the
//! storefront engine. Models carry no formatting or rendering
//! behavior; display concerns live in the engine crate.

pub mod cart;
pub mod models;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use cart::{CartSnapshot, LineItem, LineItemChanges, SchedulingMarker, Theme};
pub use models::catalog::{AddOn, CatalogItem};
pub use models::customer::{CustomerProfile, DeliveryAddress};
pub use models::payment::{PaymentMethod, PaymentSelection};
