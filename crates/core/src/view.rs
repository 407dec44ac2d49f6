//! Display model derived from a [`Store`].
//!
//! Frontends draw a [`StoreView`] and nothing else, so every visibility rule
//! lives here and can be tested without a terminal.

use crate::store::{CatalogStatus, ImageState, Store};

/// How the shop owner in the header feels about the player's purchases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerMood {
    /// Fewer than two laptops bought.
    Content,
    /// Two or three.
    Approving,
    /// Four or five.
    Excited,
    /// Six or more.
    Ecstatic,
}

impl OwnerMood {
    /// Mood for a number of laptops owned.
    pub fn from_items_owned(items_owned: u32) -> Self {
        match items_owned {
            6.. => OwnerMood::Ecstatic,
            4..=5 => OwnerMood::Excited,
            2..=3 => OwnerMood::Approving,
            _ => OwnerMood::Content,
        }
    }

    /// Caption shown next to the owner.
    pub fn caption(self) -> &'static str {
        match self {
            OwnerMood::Content => "Harold hides the pain behind his trusty laptop.",
            OwnerMood::Approving => "Harold approves of your laptop purchases so far.",
            OwnerMood::Excited => "Harold is excited that you're buying so many laptops!",
            OwnerMood::Ecstatic => {
                "Harold loves you for buying more laptops than anyone would ever need!"
            }
        }
    }
}

/// Everything a frontend needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreView {
    /// Owner and purchase tally.
    pub header: HeaderView,
    /// Balance and loan.
    pub bank: BankView,
    /// Pay and repay control.
    pub work: WorkView,
    /// Laptop list and details.
    pub listing: Listing,
}

/// Header contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderView {
    /// Owner's reaction.
    pub mood: OwnerMood,
    /// Laptops bought so far.
    pub items_owned: u32,
}

/// Bank panel contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankView {
    /// Formatted balance.
    pub balance: String,
    /// Outstanding loan; `None` hides the loan line.
    pub loan: Option<String>,
}

/// Work panel contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkView {
    /// Formatted pay.
    pub pay: String,
    /// Whether the repay control is shown.
    pub show_repay: bool,
}

/// Laptop section state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    /// Catalog still being fetched.
    Loading,
    /// Catalog could not be fetched.
    Unavailable(String),
    /// Laptops for sale with one selected.
    Available(LaptopView),
    /// Nothing left; menu and buy control are hidden.
    SoldOut(SoldOutView),
}

/// Laptop menu plus the selected laptop's details.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaptopView {
    pub titles: Vec<String>,
    pub selected: usize,
    pub title: String,
    pub description: String,
    pub features: String,
    pub price: String,
    pub image: ImageState,
}

/// Replacement for the laptop details once the store is empty.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoldOutView {
    pub title: String,
    pub description: String,
    pub features: String,
}

impl SoldOutView {
    fn new(items_owned: u32) -> Self {
        let description = if items_owned == 0 {
            "There are no laptops for sale right now.".to_string()
        } else {
            let noun = if items_owned == 1 { "laptop" } else { "laptops" };
            format!(
                "You bought every laptop!\nWe're very thankful, but what are you going to do with {items_owned} {noun}?!"
            )
        };
        Self {
            title: "SOLD OUT".to_string(),
            description,
            features: "None".to_string(),
        }
    }
}

impl StoreView {
    /// Build the view for the store's current state.
    pub fn from_store(store: &Store) -> Self {
        let economy = store.economy();
        let has_loan = economy.has_loan();

        Self {
            header: HeaderView {
                mood: OwnerMood::from_items_owned(economy.items_owned()),
                items_owned: economy.items_owned(),
            },
            bank: BankView {
                balance: economy.balance().to_string(),
                loan: has_loan.then(|| economy.loan().to_string()),
            },
            work: WorkView {
                pay: economy.pay().to_string(),
                show_repay: has_loan,
            },
            listing: listing(store),
        }
    }
}

fn listing(store: &Store) -> Listing {
    match store.catalog_status() {
        CatalogStatus::Loading => return Listing::Loading,
        CatalogStatus::Unavailable(reason) => return Listing::Unavailable(reason.clone()),
        CatalogStatus::Ready => {}
    }

    let (Some(selected), Some(item)) = (store.selected_index(), store.selected_item()) else {
        return Listing::SoldOut(SoldOutView::new(store.economy().items_owned()));
    };

    Listing::Available(LaptopView {
        titles: store
            .catalog()
            .items()
            .iter()
            .map(|item| item.title.clone())
            .collect(),
        selected,
        title: item.title.clone(),
        description: item.description.clone(),
        features: item.features_text(),
        price: item.price_label(),
        image: store.image_state(item.id),
    })
}
