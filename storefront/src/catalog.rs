//! Catalog access
//!
//! The catalog is an external collaborator: providers fetch the item
//! list, the [`Catalog`] read-model serves lookups to the cart and the
//! composer. Fetch failures surface as a [`CatalogError`] for the
//! caller to report; there is no retry loop here.

use async_trait::async_trait;
use thiserror::Error;

use shared::models::catalog::CatalogItem;

/// Catalog fetch errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog fetch failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("catalog decode failed: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Supplies the immutable list of purchasable items
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn get_all_items(&self) -> Result<Vec<CatalogItem>, CatalogError>;
}

/// Fixed item list; offline operation and tests
pub struct StaticCatalog {
    items: Vec<CatalogItem>,
}

impl StaticCatalog {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self { items }
    }
}

#[async_trait]
impl CatalogProvider for StaticCatalog {
    async fn get_all_items(&self) -> Result<Vec<CatalogItem>, CatalogError> {
        Ok(self.items.clone())
    }
}

/// Menu endpoint client
pub struct HttpCatalog {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalog {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into() }
    }
}

#[async_trait]
impl CatalogProvider for HttpCatalog {
    async fn get_all_items(&self) -> Result<Vec<CatalogItem>, CatalogError> {
        let url = format!("{}/menu-items", self.base_url.trim_end_matches('/'));
        let body = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Loaded catalog, consumed read-only by the cart store and composer
pub struct Catalog {
    items: Vec<CatalogItem>,
}

impl Catalog {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self { items }
    }

    /// Fetch the item list from a provider
    pub async fn load(provider: &dyn CatalogProvider) -> Result<Self, CatalogError> {
        Ok(Self::new(provider.get_all_items().await?))
    }

    pub fn item(&self, id: &str) -> Option<&CatalogItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn items_in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a CatalogItem> {
        self.items.iter().filter(move |item| item.category == category)
    }

    /// Distinct categories in catalog order
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for item in &self.items {
            if !seen.contains(&item.category.as_str()) {
                seen.push(item.category.as_str());
            }
        }
        seen
    }
}
