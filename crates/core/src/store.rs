//! The store session: economy, catalog and selection driven by player actions.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::{debug, info};

use crate::{
    catalog::{Catalog, CatalogEvent},
    economy::{EconomyError, EconomyState},
    models::{CatalogItem, ItemId},
    money::Money,
};

/// Something the player asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Borrow the given amount.
    RequestLoan(Money),
    /// Work one shift.
    Work,
    /// Move pay into the bank.
    Bank,
    /// Pay the loan off from pay.
    RepayLoan,
    /// Select the next laptop in the list.
    SelectNext,
    /// Select the previous laptop in the list.
    SelectPrevious,
    /// Select the laptop at a list position.
    Select(usize),
    /// Buy the selected laptop.
    Buy,
}

/// Feedback from a successful action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Worth a line in the status bar.
    Status(String),
    /// Must be acknowledged by the player.
    Notice(String),
}

/// Rejected actions. The messages are shown to the player as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The economy refused the action.
    #[error(transparent)]
    Economy(#[from] EconomyError),
    /// Buy pressed with no laptop available.
    #[error("There is no laptop selected.")]
    NothingSelected,
}

/// Where the catalog fetch stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogStatus {
    /// Fetch still in flight.
    Loading,
    /// Catalog received.
    Ready,
    /// Fetch failed with the given reason.
    Unavailable(String),
}

/// Image lookup state for one laptop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageState {
    /// Not resolved yet.
    Resolving,
    /// A working URL.
    Found(String),
    /// Nothing could be found; show a placeholder.
    Missing,
}

/// A player's session at the store.
#[derive(Debug, Clone)]
pub struct Store {
    economy: EconomyState,
    catalog: Catalog,
    status: CatalogStatus,
    selected: usize,
    images: HashMap<ItemId, Option<String>>,
    image_requests: HashSet<ItemId>,
}

impl Store {
    /// Empty session waiting for its catalog.
    pub fn new(salary: Money) -> Self {
        Self {
            economy: EconomyState::new(salary),
            catalog: Catalog::default(),
            status: CatalogStatus::Loading,
            selected: 0,
            images: HashMap::new(),
            image_requests: HashSet::new(),
        }
    }

    /// Current money state.
    pub fn economy(&self) -> &EconomyState {
        &self.economy
    }

    /// Laptops still for sale.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Progress of the catalog fetch.
    pub fn catalog_status(&self) -> &CatalogStatus {
        &self.status
    }

    /// Position of the selected laptop, if any is for sale.
    pub fn selected_index(&self) -> Option<usize> {
        (!self.catalog.is_empty()).then_some(self.selected)
    }

    /// The laptop currently on display.
    pub fn selected_item(&self) -> Option<&CatalogItem> {
        self.catalog.get(self.selected)
    }

    /// Install a freshly fetched catalog and select its first item.
    pub fn load_catalog(&mut self, catalog: Catalog) {
        info!(total = catalog.len(), "Catalog loaded");
        self.catalog = catalog;
        self.status = CatalogStatus::Ready;
        self.selected = 0;
        self.images.clear();
        self.image_requests.clear();
    }

    /// Apply the result of the background fetch.
    pub fn apply_catalog_event(&mut self, event: CatalogEvent) {
        match event {
            CatalogEvent::Loaded(catalog) => self.load_catalog(catalog),
            CatalogEvent::Error(err) => {
                debug!(?err, "Catalog marked unavailable");
                self.status = CatalogStatus::Unavailable(format!("{err:#}"));
            }
        }
    }

    /// Image state for a laptop.
    pub fn image_state(&self, id: ItemId) -> ImageState {
        match self.images.get(&id) {
            Some(Some(url)) => ImageState::Found(url.clone()),
            Some(None) => ImageState::Missing,
            None => ImageState::Resolving,
        }
    }

    /// Claim the selected laptop for image resolution.
    ///
    /// Returns a copy of the item when its image is neither known nor already
    /// being looked up; the caller must report back with [`Store::record_image`].
    pub fn begin_image_request(&mut self) -> Option<CatalogItem> {
        let item = self.selected_item()?;
        if self.images.contains_key(&item.id) || self.image_requests.contains(&item.id) {
            return None;
        }
        let item = item.clone();
        self.image_requests.insert(item.id);
        Some(item)
    }

    /// Store the resolved image for a laptop.
    pub fn record_image(&mut self, id: ItemId, url: Option<String>) {
        self.image_requests.remove(&id);
        self.images.insert(id, url);
    }

    /// Carry out a player action.
    pub fn dispatch(&mut self, action: Action) -> Result<Outcome, StoreError> {
        match action {
            Action::RequestLoan(amount) => {
                self.economy.request_loan(amount)?;
                Ok(Outcome::Status(format!(
                    "Borrowed {amount}. Balance is now {}",
                    self.economy.balance()
                )))
            }
            Action::Work => {
                let pay = self.economy.work();
                Ok(Outcome::Status(format!("Worked a shift. Pay is now {pay}")))
            }
            Action::Bank => {
                let deposit = self.economy.bank();
                let mut message = format!("Banked {}", deposit.deposited);
                if deposit.loan_payment.is_positive() {
                    message.push_str(&format!(" ({} went to the loan)", deposit.loan_payment));
                }
                Ok(Outcome::Status(message))
            }
            Action::RepayLoan => {
                let repayment = self.economy.repay_loan()?;
                Ok(Outcome::Status(if repayment.cleared {
                    format!("Paid {} and cleared the loan", repayment.paid)
                } else {
                    format!(
                        "Paid {}. {} left on the loan",
                        repayment.paid,
                        self.economy.loan()
                    )
                }))
            }
            Action::SelectNext => Ok(self.select(self.selected.saturating_add(1))),
            Action::SelectPrevious => Ok(self.select(self.selected.saturating_sub(1))),
            Action::Select(index) => Ok(self.select(index)),
            Action::Buy => self.buy(),
        }
    }

    fn select(&mut self, index: usize) -> Outcome {
        if self.catalog.is_empty() {
            return Outcome::Status("Nothing for sale".to_string());
        }
        self.selected = index.min(self.catalog.len() - 1);
        match self.selected_item() {
            Some(item) => Outcome::Status(format!("Viewing {}", item.title)),
            None => Outcome::Status(String::new()),
        }
    }

    fn buy(&mut self) -> Result<Outcome, StoreError> {
        let price = self
            .selected_item()
            .map(|item| item.price)
            .ok_or(StoreError::NothingSelected)?;
        self.economy.purchase(price)?;

        let item = self
            .catalog
            .remove(self.selected)
            .ok_or(StoreError::NothingSelected)?;
        self.images.remove(&item.id);
        self.image_requests.remove(&item.id);
        if self.selected >= self.catalog.len() {
            self.selected = self.catalog.len().saturating_sub(1);
        }

        info!(
            id = item.id,
            title = %item.title,
            price = %item.price,
            owned = self.economy.items_owned(),
            "Laptop purchased"
        );
        Ok(Outcome::Notice(format!(
            "You are now the proud owner of a {}!",
            item.title
        )))
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(EconomyState::default().salary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::laptop;

    fn stocked_store() -> Store {
        let mut store = Store::default();
        store.load_catalog(Catalog::from_items([
            laptop(1, "Alpha", 100),
            laptop(2, "Beta", 200),
            laptop(3, "Gamma", 300),
        ]));
        store
    }

    fn earn(store: &mut Store, shifts: usize) {
        for _ in 0..shifts {
            store.dispatch(Action::Work).unwrap();
        }
        store.dispatch(Action::Bank).unwrap();
    }

    #[test]
    fn starts_loading_with_nothing_selected() {
        let store = Store::default();
        assert_eq!(store.catalog_status(), &CatalogStatus::Loading);
        assert_eq!(store.selected_index(), None);
        assert_eq!(store.economy().balance(), Money::ZERO);
    }

    #[test]
    fn loading_selects_first_item() {
        let store = stocked_store();
        assert_eq!(store.catalog_status(), &CatalogStatus::Ready);
        assert_eq!(store.selected_item().map(|item| item.id), Some(1));
    }

    #[test]
    fn selection_is_clamped() {
        let mut store = stocked_store();
        store.dispatch(Action::SelectPrevious).unwrap();
        assert_eq!(store.selected_index(), Some(0));
        store.dispatch(Action::Select(10)).unwrap();
        assert_eq!(store.selected_index(), Some(2));
        store.dispatch(Action::SelectNext).unwrap();
        assert_eq!(store.selected_index(), Some(2));
    }

    #[test]
    fn purchase_without_funds_changes_nothing() {
        let mut store = stocked_store();
        let err = store.dispatch(Action::Buy).unwrap_err();
        assert_eq!(err.to_string(), "Your balance is too low to buy this laptop!");
        assert_eq!(store.catalog().len(), 3);
        assert_eq!(store.economy().items_owned(), 0);
    }

    #[test]
    fn purchase_removes_item_and_keeps_position() {
        let mut store = stocked_store();
        earn(&mut store, 3);
        store.dispatch(Action::Select(1)).unwrap();

        let outcome = store.dispatch(Action::Buy).unwrap();
        assert_eq!(
            outcome,
            Outcome::Notice("You are now the proud owner of a Beta!".to_string())
        );
        assert_eq!(store.economy().balance(), Money::from_euros(100));
        assert_eq!(store.economy().items_owned(), 1);
        assert_eq!(store.catalog().position(2), None);
        assert_eq!(store.selected_item().map(|item| item.id), Some(3));
    }

    #[test]
    fn buying_the_last_item_moves_selection_back() {
        let mut store = stocked_store();
        earn(&mut store, 6);
        store.dispatch(Action::Select(2)).unwrap();
        store.dispatch(Action::Buy).unwrap();
        assert_eq!(store.selected_item().map(|item| item.id), Some(2));
    }

    #[test]
    fn selling_out_leaves_nothing_selected() {
        let mut store = stocked_store();
        earn(&mut store, 6);
        for _ in 0..3 {
            store.dispatch(Action::Buy).unwrap();
        }
        assert!(store.catalog().is_empty());
        assert_eq!(store.selected_index(), None);
        assert_eq!(store.dispatch(Action::Buy), Err(StoreError::NothingSelected));
    }

    #[test]
    fn loan_rules_surface_as_errors() {
        let mut store = stocked_store();
        let err = store
            .dispatch(Action::RequestLoan(Money::from_euros(50)))
            .unwrap_err();
        assert_eq!(err.to_string(), "Your balance is too low to borrow this amount!");

        earn(&mut store, 1);
        store
            .dispatch(Action::RequestLoan(Money::from_euros(150)))
            .unwrap();
        assert_eq!(store.economy().balance(), Money::from_euros(250));

        let err = store
            .dispatch(Action::RequestLoan(Money::from_euros(10)))
            .unwrap_err();
        assert_eq!(err.to_string(), "You haven't paid off your previous loan yet!");
    }

    #[test]
    fn image_requests_are_claimed_once() {
        let mut store = stocked_store();
        let item = store.begin_image_request().map(|item| item.id);
        assert_eq!(item, Some(1));
        assert!(store.begin_image_request().is_none());
        assert_eq!(store.image_state(1), ImageState::Resolving);

        store.record_image(1, Some("http://img/1.png".to_string()));
        assert_eq!(
            store.image_state(1),
            ImageState::Found("http://img/1.png".to_string())
        );
        assert!(store.begin_image_request().is_none());

        store.record_image(2, None);
        assert_eq!(store.image_state(2), ImageState::Missing);
    }

    #[test]
    fn failed_fetch_marks_catalog_unavailable() {
        let mut store = Store::default();
        store.apply_catalog_event(CatalogEvent::Error(anyhow::anyhow!("offline")));
        assert_eq!(
            store.catalog_status(),
            &CatalogStatus::Unavailable("offline".to_string())
        );
    }
}
