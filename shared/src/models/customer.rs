//! Customer Models

use serde::{Deserialize, Serialize};

/// Delivery address collected at checkout
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeliveryAddress {
    pub street: String,
    /// House/building number; accepts "S/N" for unnumbered addresses
    pub number: String,
    pub neighborhood: String,
    pub city: String,
    /// 8-digit CEP, optional
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    /// Free-text landmark note appended to the address line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// Customer profile captured at delivery-form submission
///
/// Name and address are durable across sessions; phone numbers are
/// session-scoped only (the storage layer enforces the split).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CustomerProfile {
    pub name: String,
    /// Primary phone, digits only (10-11 digits, Brazilian mobile rule)
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_phone: Option<String>,
    pub address: DeliveryAddress,
}
