//! The laptop catalog and the client that fetches it.

/// HTTP client for the store API.
pub mod client;
/// Image URL resolution with extension fallbacks.
pub mod image;

pub use client::{CatalogClient, CatalogEvent};
pub use image::{resolve_image, ImageProbe, ProbeStatus};

use std::collections::HashSet;

use tracing::warn;

use crate::models::{CatalogItem, ItemId};

/// Items for sale, in the order the API listed them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    items: Vec<CatalogItem>,
}

impl Catalog {
    /// Build a catalog, dropping any item whose id was already seen.
    pub fn from_items(items: impl IntoIterator<Item = CatalogItem>) -> Self {
        let mut seen = HashSet::new();
        let mut kept = Vec::new();
        for item in items {
            if seen.insert(item.id) {
                kept.push(item);
            } else {
                warn!(id = item.id, title = %item.title, "Skipping duplicate catalog item");
            }
        }
        Self { items: kept }
    }

    /// All items in display order.
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    /// Item at a display position.
    pub fn get(&self, index: usize) -> Option<&CatalogItem> {
        self.items.get(index)
    }

    /// Display position of the item with the given id.
    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    /// Number of items still for sale.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True once everything has been sold.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Take the item at `index` out of the catalog.
    pub fn remove(&mut self, index: usize) -> Option<CatalogItem> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }
}
