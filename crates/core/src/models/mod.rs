//! Shared domain models.

use serde::{Deserialize, Serialize};

use crate::money::Money;

/// Identifier assigned to a laptop by the store API.
pub type ItemId = u32;

/// A laptop as listed by the store API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Unique identifier within the catalog.
    pub id: ItemId,
    /// Marketing name.
    pub title: String,
    /// Free-form description text.
    #[serde(default)]
    pub description: String,
    /// Selling price.
    pub price: Money,
    /// Image path relative to the API host, e.g. `assets/images/1.png`.
    #[serde(default)]
    pub image: String,
    /// Feature bullet points, in display order.
    #[serde(default)]
    pub specs: Vec<String>,
    /// Units the API reports in stock.
    #[serde(default)]
    pub stock: Option<u32>,
    /// Whether the API lists the item as active.
    #[serde(default)]
    pub active: Option<bool>,
}

impl CatalogItem {
    /// Price as shown beneath the title, e.g. `200 EURO`.
    pub fn price_label(&self) -> String {
        format!("{} EURO", self.price.plain())
    }

    /// Specs joined one per line.
    pub fn features_text(&self) -> String {
        self.specs.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_api_record() -> anyhow::Result<()> {
        let raw = r#"{
            "id": 1,
            "title": "Classic Notebook",
            "description": "A little old, but turns on.",
            "specs": ["Has a screen", "Keyboard works, mostly"],
            "price": 200,
            "stock": 1,
            "active": true,
            "image": "assets/images/1.png"
        }"#;

        let item: CatalogItem = serde_json::from_str(raw)?;
        assert_eq!(item.id, 1);
        assert_eq!(item.price, Money::from_euros(200));
        assert_eq!(item.price_label(), "200 EURO");
        assert_eq!(item.features_text(), "Has a screen\nKeyboard works, mostly");
        assert_eq!(item.stock, Some(1));
        Ok(())
    }

    #[test]
    fn optional_fields_default() -> anyhow::Result<()> {
        let item: CatalogItem =
            serde_json::from_str(r#"{"id": 9, "title": "Bare", "price": 12.5}"#)?;
        assert!(item.specs.is_empty());
        assert!(item.image.is_empty());
        assert_eq!(item.price_label(), "12.50 EURO");
        Ok(())
    }
}
