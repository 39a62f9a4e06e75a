use crate::errors::CoreError;
use crate::models::document::{Collection, Document};
use super::traits::{StorageGateway, Subscription};

/// A new snapshot of one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerUpdate {
    pub collection: Collection,
    pub documents: Vec<Document>,
}

/// The three collection subscriptions merged into one stream of updates.
///
/// Each collection is independent: an update replaces that collection only,
/// and updates of different collections may arrive in any order.
#[derive(Debug)]
pub struct LedgerFeed {
    cards: Subscription,
    supplies: Subscription,
    misc_supplies: Subscription,
}

impl LedgerFeed {
    /// Subscribe to all three collections. Fails if any subscription fails;
    /// the ones already opened are dropped.
    pub async fn open(gateway: &dyn StorageGateway) -> Result<Self, CoreError> {
        let cards = gateway.subscribe(Collection::Cards).await?;
        let supplies = gateway.subscribe(Collection::Supplies).await?;
        let misc_supplies = gateway.subscribe(Collection::MiscSupplies).await?;
        tracing::info!("ledger feed open on {}", gateway.name());
        Ok(Self {
            cards,
            supplies,
            misc_supplies,
        })
    }

    /// Wait for the next snapshot of any collection. The first three calls
    /// yield the initial contents of cards, supplies and misc supplies.
    /// Returns `None` once any subscription has ended.
    ///
    /// Cancel safe.
    pub async fn next(&mut self) -> Option<LedgerUpdate> {
        let (collection, documents) = tokio::select! {
            biased;
            docs = self.cards.next() => (Collection::Cards, docs?),
            docs = self.supplies.next() => (Collection::Supplies, docs?),
            docs = self.misc_supplies.next() => (Collection::MiscSupplies, docs?),
        };
        Some(LedgerUpdate {
            collection,
            documents,
        })
    }

    /// Latest snapshot of every collection, without waiting.
    pub fn current(&self) -> Vec<LedgerUpdate> {
        [&self.cards, &self.supplies, &self.misc_supplies]
            .into_iter()
            .map(|s| LedgerUpdate {
                collection: s.collection(),
                documents: s.current(),
            })
            .collect()
    }

    /// End all three subscriptions.
    pub fn close(self) {
        self.cards.unsubscribe();
        self.supplies.unsubscribe();
        self.misc_supplies.unsubscribe();
    }
}

