use serde::{Deserialize, Serialize};

/// Profit/loss summary of the whole ledger.
///
/// Every cost contributor is a lifetime aggregate: supplies count in full
/// even if they were never used, and no cost is allocated to single cards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerTotals {
    /// Sum of purchase prices of all cards, whatever their status
    pub total_bought: f64,

    /// Sum of sale prices of sold cards only
    pub total_sold: f64,

    /// Sum of supply line totals
    pub total_supplies_cost: f64,

    /// Sum of misc supply prices
    pub total_misc_cost: f64,

    /// total_sold - total_bought - total_supplies_cost - total_misc_cost
    pub total_profit: f64,

    pub card_count: usize,
    pub for_sale_count: usize,
    pub sold_count: usize,
    pub keeping_count: usize,
}
