use serde::{Deserialize, Serialize};

use super::card::Card;
use super::document::{Collection, Document};
use super::misc_supply::MiscSupply;
use super::supply::Supply;

/// The in-memory view of the three collections.
///
/// Each collection is a read-mostly cache of the store: it is replaced
/// wholesale every time a snapshot arrives and never patched in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub cards: Vec<Card>,
    pub supplies: Vec<Supply>,
    pub misc_supplies: Vec<MiscSupply>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace one collection with a freshly delivered snapshot.
    pub fn replace(&mut self, collection: Collection, documents: &[Document]) {
        match collection {
            Collection::Cards => {
                self.cards = documents.iter().map(Card::from_document).collect();
            }
            Collection::Supplies => {
                self.supplies = documents.iter().map(Supply::from_document).collect();
            }
            Collection::MiscSupplies => {
                self.misc_supplies = documents.iter().map(MiscSupply::from_document).collect();
            }
        }
        tracing::debug!(
            "{collection} snapshot applied ({} records)",
            documents.len()
        );
    }

    pub fn card(&self, id: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }

    pub fn supply(&self, id: &str) -> Option<&Supply> {
        self.supplies.iter().find(|s| s.id == id)
    }

    pub fn misc_supply(&self, id: &str) -> Option<&MiscSupply> {
        self.misc_supplies.iter().find(|m| m.id == id)
    }

    #[must_use]
    pub fn len(&self, collection: Collection) -> usize {
        match collection {
            Collection::Cards => self.cards.len(),
            Collection::Supplies => self.supplies.len(),
            Collection::MiscSupplies => self.misc_supplies.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty() && self.supplies.is_empty() && self.misc_supplies.is_empty()
    }
}
