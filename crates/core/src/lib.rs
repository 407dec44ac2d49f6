#![warn(clippy::all, missing_docs)]

//! Core logic for the Komputer Store.
//!
//! This crate hosts the money model, the pay/bank/loan rules, the
//! catalog client and the view model used by the terminal UI and any
//! future frontends.

pub mod catalog;
pub mod config;
pub mod economy;
pub mod models;
pub mod money;
pub mod store;
pub mod view;

pub use catalog::{Catalog, CatalogClient, CatalogEvent};
pub use config::AppConfig;
pub use economy::{EconomyError, EconomyState};
pub use models::CatalogItem;
pub use money::Money;
pub use store::{Action, ImageState, Outcome, Store, StoreError};
pub use view::{Listing, OwnerMood, StoreView};
