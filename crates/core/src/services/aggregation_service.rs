use crate::models::card::CardStatus;
use crate::models::ledger::Ledger;
use crate::models::totals::LedgerTotals;

/// Computes the profit/loss summary from the current ledger snapshot.
///
/// Nothing is cached: every call walks the full snapshot, so the result
/// always matches the latest delivered collections.
pub struct AggregationService;

impl AggregationService {
    pub fn new() -> Self {
        Self
    }

    pub fn totals(&self, ledger: &Ledger) -> LedgerTotals {
        let mut totals = LedgerTotals {
            card_count: ledger.cards.len(),
            ..LedgerTotals::default()
        };

        for card in &ledger.cards {
            totals.total_bought += card.bought_for;
            match card.status {
                // a stale sold_for on an unsold card never counts
                CardStatus::Sold => {
                    totals.total_sold += card.sold_for;
                    totals.sold_count += 1;
                }
                CardStatus::ForSale => totals.for_sale_count += 1,
                CardStatus::Keeping => totals.keeping_count += 1,
            }
        }

        totals.total_supplies_cost = ledger.supplies.iter().map(|s| s.total).sum();
        totals.total_misc_cost = ledger.misc_supplies.iter().map(|m| m.price).sum();
        totals.total_profit = totals.total_sold
            - totals.total_bought
            - totals.total_supplies_cost
            - totals.total_misc_cost;

        totals
    }
}

impl Default for AggregationService {
    fn default() -> Self {
        Self::new()
    }
}
